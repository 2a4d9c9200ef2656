//! Constantes del core.
//!
//! Valores por defecto del esquema de configuración. Un cambio aquí altera los
//! nombres de carpeta producidos por el `Namer`, por lo que deben mantenerse
//! estables entre versiones de datasets.

/// Prefijo por defecto de las carpetas por simulación (`sim0007`).
pub const DEFAULT_SIM_FOLDER_PREFIX: &str = "sim";

/// Ancho por defecto (en dígitos) del índice de simulación.
pub const DEFAULT_SIM_DIGITS: usize = 4;

/// Plantilla por defecto para el directorio de logs de etapa.
pub const DEFAULT_LOG_TEMPLATE: &str = "{root}/{dataset_name}/Logs/{stage}";

/// Tag de handler usado para los snapshots de configuración.
pub const STAGE_LOG_HANDLER: &str = "yaml";

/// Nombre lógico con el que se reporta el log de etapa en los errores.
pub const STAGE_LOG_ASSET: &str = "stage_log";

/// Versión lógica del esquema de configuración; entra en el fingerprint de
/// los logs de etapa.
pub const SCHEMA_VERSION: &str = "C1.0";
