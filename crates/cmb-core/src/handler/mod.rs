//! Handlers de formato y su registro.
//!
//! Un `Handler` sabe leer y (opcionalmente) escribir un formato de archivo.
//! El core sólo conoce la representación neutral `AssetData`; las librerías
//! concretas (serde_yaml, bincode, ndarray, ...) viven en `cmb-handlers`.

pub mod data;
pub mod registry;

use std::fmt::Debug;
use std::path::Path;

use thiserror::Error;

pub use data::{ArrayData, AssetData, AssetPayload, Table};
pub use registry::HandlerRegistry;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("expected {expected} data, found {found}")]
    WrongData { expected: &'static str, found: &'static str },
    #[error("shape {shape:?} does not match {len} values")]
    Shape { shape: Vec<usize>, len: usize },
    #[error("{0}")]
    Invalid(String),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

/// Contrato de un handler de formato.
///
/// Implementaciones de sólo lectura (tablas de referencia) dejan `write` por
/// defecto y devuelven `false` en `supports_write`, lo que permite a `Asset`
/// rechazar la escritura antes de tocar el filesystem.
pub trait Handler: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError>;

    fn write(&self, _path: &Path, _data: &AssetData) -> Result<(), HandlerError> {
        Err(HandlerError::Unsupported("write"))
    }

    fn supports_write(&self) -> bool {
        true
    }
}
