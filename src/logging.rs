//! Inicialización del subscriber de `tracing`.
//!
//! El filtro se toma de `RUST_LOG` (por defecto `info`). Los registros
//! emitidos con `log` por `cmb-core` y `cmb-handlers` se reenvían al mismo
//! subscriber.

use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

pub fn init() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_target(true)
                             .try_init()
                             .map_err(|e| AppError::Config(format!("cannot install logger: {e}")))
}
