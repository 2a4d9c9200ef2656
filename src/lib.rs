//! cmbml: binario de pipeline sobre `cmb-core` y `cmb-handlers`.
//!
//! - `config`: configuración de proceso (variables de entorno / `.env`).
//! - `errors`: `AppError`, que envuelve los errores del core.
//! - `logging`: subscriber de `tracing` (también recoge los `log::` del core).
//! - `stages`: trait `Stage`, etapas concretas y `PipelineRunner`.

pub mod config;
pub mod errors;
pub mod logging;
pub mod stages;

pub use errors::AppError;
