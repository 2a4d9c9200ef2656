use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::{read_through, write_through, AssetId, AssetRole};
use crate::errors::{CoreError, Operation};
use crate::handler::{AssetData, AssetPayload, Handler, HandlerError};

/// Ruta candidata de un `AssetWithPathAlts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCandidate {
    pub path: PathBuf,
    pub is_primary: bool,
}

impl PathCandidate {
    pub fn primary(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), is_primary: true }
    }

    pub fn alternate(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), is_primary: false }
    }
}

/// Asset con rutas alternativas.
///
/// `read` recorre las candidatas en orden y usa la primera que existe (p. ej.
/// "ya preprocesado" antes que "crudo"). `write` ignora las alternativas y
/// escribe siempre en la candidata primaria.
#[derive(Clone)]
pub struct AssetWithPathAlts {
    id: AssetId,
    candidates: Vec<PathCandidate>,
    primary: usize,
    handler: Arc<dyn Handler>,
    create_dirs: bool,
}

impl AssetWithPathAlts {
    /// Requiere exactamente una candidata primaria.
    pub fn new(name: impl Into<String>,
               stage: impl Into<String>,
               role: AssetRole,
               candidates: Vec<PathCandidate>,
               tag: impl Into<String>,
               handler: Arc<dyn Handler>)
               -> Result<Self, CoreError> {
        let id = AssetId { name: name.into(), stage: stage.into(), role, tag: tag.into() };
        let primaries: Vec<usize> = candidates.iter()
                                              .enumerate()
                                              .filter(|(_, c)| c.is_primary)
                                              .map(|(i, _)| i)
                                              .collect();
        let primary = match primaries.as_slice() {
            [only] => *only,
            _ => {
                return Err(CoreError::Config(format!("asset '{}' of stage '{}' needs exactly one primary path, found {} among {} candidates",
                                                     id.name,
                                                     id.stage,
                                                     primaries.len(),
                                                     candidates.len())))
            }
        };
        Ok(Self { id, candidates, primary, handler, create_dirs: false })
    }

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

    pub fn candidates(&self) -> &[PathCandidate] {
        &self.candidates
    }

    pub fn primary_path(&self) -> &Path {
        &self.candidates[self.primary].path
    }

    /// Primera candidata existente, si hay alguna.
    pub fn resolved_read_path(&self) -> Option<&Path> {
        self.candidates.iter().map(|c| c.path.as_path()).find(|p| p.exists())
    }

    pub fn read(&self) -> Result<AssetData, CoreError> {
        let path = self.resolved_read_path().ok_or_else(|| CoreError::NoCandidateFound {
                                                asset: self.id.name.clone(),
                                                stage: self.id.stage.clone(),
                                                attempted: self.candidates.iter().map(|c| c.path.clone()).collect(),
                                            })?;
        if path != self.primary_path() {
            debug!("asset '{}' falling back to {}", self.id.name, path.display());
        }
        read_through(&self.id, &self.handler, path)
    }

    pub fn read_as<T: AssetPayload>(&self) -> Result<T, CoreError> {
        let data = self.read()?;
        T::from_data(data).map_err(|source| self.payload_error(Operation::Read, source))
    }

    pub fn write(&self, data: &AssetData) -> Result<(), CoreError> {
        write_through(&self.id, &self.handler, self.primary_path(), data, self.create_dirs)
    }

    pub fn write_payload<T: AssetPayload>(&self, payload: T) -> Result<(), CoreError> {
        let data = payload.into_data().map_err(|source| self.payload_error(Operation::Write, source))?;
        self.write(&data)
    }

    fn payload_error(&self, op: Operation, source: HandlerError) -> CoreError {
        CoreError::Handler { asset: self.id.name.clone(),
                             stage: self.id.stage.clone(),
                             op,
                             path: self.primary_path().to_path_buf(),
                             source }
    }
}

impl fmt::Debug for AssetWithPathAlts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetWithPathAlts")
         .field("name", &self.id.name)
         .field("stage", &self.id.stage)
         .field("tag", &self.id.tag)
         .field("candidates", &self.candidates)
         .finish()
    }
}
