use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{read_through, write_through, AssetId, AssetRole};
use crate::errors::{CoreError, Operation};
use crate::handler::{AssetData, AssetPayload, Handler, HandlerError};

/// Asset con una única ruta resuelta.
#[derive(Clone)]
pub struct Asset {
    id: AssetId,
    path: PathBuf,
    handler: Arc<dyn Handler>,
    create_dirs: bool,
}

impl Asset {
    pub fn new(name: impl Into<String>,
               stage: impl Into<String>,
               role: AssetRole,
               path: impl Into<PathBuf>,
               tag: impl Into<String>,
               handler: Arc<dyn Handler>)
               -> Self {
        Self { id: AssetId { name: name.into(), stage: stage.into(), role, tag: tag.into() },
               path: path.into(),
               handler,
               create_dirs: false }
    }

    /// Habilita la creación de directorios padre en `write`.
    pub fn with_create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn stage(&self) -> &str {
        &self.id.stage
    }

    pub fn role(&self) -> AssetRole {
        self.id.role
    }

    pub fn tag(&self) -> &str {
        &self.id.tag
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn read(&self) -> Result<AssetData, CoreError> {
        read_through(&self.id, &self.handler, &self.path)
    }

    /// Lee y convierte al tipo fuerte `T`.
    pub fn read_as<T: AssetPayload>(&self) -> Result<T, CoreError> {
        let data = self.read()?;
        T::from_data(data).map_err(|source| self.payload_error(Operation::Read, source))
    }

    pub fn write(&self, data: &AssetData) -> Result<(), CoreError> {
        write_through(&self.id, &self.handler, &self.path, data, self.create_dirs)
    }

    pub fn write_payload<T: AssetPayload>(&self, payload: T) -> Result<(), CoreError> {
        let data = payload.into_data().map_err(|source| self.payload_error(Operation::Write, source))?;
        self.write(&data)
    }

    fn payload_error(&self, op: Operation, source: HandlerError) -> CoreError {
        CoreError::Handler { asset: self.id.name.clone(), stage: self.id.stage.clone(), op, path: self.path.clone(), source }
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
         .field("name", &self.id.name)
         .field("stage", &self.id.stage)
         .field("role", &self.id.role)
         .field("tag", &self.id.tag)
         .field("path", &self.path)
         .field("create_dirs", &self.create_dirs)
         .finish()
    }
}
