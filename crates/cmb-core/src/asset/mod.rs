//! Assets: ruta resuelta + handler, con `read`/`write` para la etapa.
//!
//! - `Asset`: una sola ruta.
//! - `AssetWithPathAlts`: varias rutas candidatas; lee la primera existente
//!   y escribe siempre en la primaria.
//!
//! Los assets no cachean nada; recrear uno equivalente es gratis.

mod alts;
mod single;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::debug;

pub use alts::{AssetWithPathAlts, PathCandidate};
pub use single::Asset;

use crate::errors::{CoreError, Operation};
use crate::handler::{AssetData, Handler};

/// Papel del asset para la etapa que lo pidió.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetRole {
    In,
    Out,
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRole::In => f.write_str("in"),
            AssetRole::Out => f.write_str("out"),
        }
    }
}

/// Identidad de un asset usada en los mensajes de error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssetId {
    pub name: String,
    pub stage: String,
    pub role: AssetRole,
    pub tag: String,
}

/// Escritura común a ambos tipos de asset.
///
/// Orden de chequeos: soporte de escritura del handler (sin tocar el
/// filesystem), luego directorio padre (crear o fallar según `create_dirs`),
/// y por último el handler.
pub(crate) fn write_through(id: &AssetId,
                            handler: &Arc<dyn Handler>,
                            path: &Path,
                            data: &AssetData,
                            create_dirs: bool)
                            -> Result<(), CoreError> {
    if !handler.supports_write() {
        return Err(CoreError::UnsupportedOperation { asset: id.name.clone(),
                                                     stage: id.stage.clone(),
                                                     tag: id.tag.clone(),
                                                     op: Operation::Write,
                                                     path: path.to_path_buf() });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            if !create_dirs {
                return Err(CoreError::PathNotFound { asset: id.name.clone(),
                                                     stage: id.stage.clone(),
                                                     path: path.to_path_buf() });
            }
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
            debug!("created directory {}", parent.display());
        }
    }
    handler.write(path, data).map_err(|source| CoreError::Handler { asset: id.name.clone(),
                                                                    stage: id.stage.clone(),
                                                                    op: Operation::Write,
                                                                    path: path.to_path_buf(),
                                                                    source })
}

pub(crate) fn read_through(id: &AssetId, handler: &Arc<dyn Handler>, path: &Path) -> Result<AssetData, CoreError> {
    debug!("reading '{}' ({}) from {}", id.name, id.tag, path.display());
    handler.read(path).map_err(|source| CoreError::Handler { asset: id.name.clone(),
                                                             stage: id.stage.clone(),
                                                             op: Operation::Read,
                                                             path: path.to_path_buf(),
                                                             source })
}
