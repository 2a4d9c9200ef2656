//! Configuración del pipeline: esquema serde, carga desde YAML/JSON y
//! validaciones estructurales (independientes del registro de handlers).

mod schema;

use std::path::Path;

use log::debug;

pub use schema::{AssetInDecl, AssetOutDecl, FileSystemConfig, PipelineConfig, SourceDecl, SplitConfig, StageConfig};

use crate::constants::SCHEMA_VERSION;
use crate::errors::CoreError;
use crate::hashing::hash_value;

impl PipelineConfig {
    /// Carga según extensión: `.yaml`/`.yml` o `.json`.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        let parsed = match ext.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str::<Self>(&text).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str::<Self>(&text).map_err(|e| e.to_string()),
            _ => Err("unsupported extension (expected .yaml, .yml or .json)".to_string()),
        };
        let config = parsed.map_err(|reason| CoreError::ConfigParse { path: path.to_path_buf(), reason })?;
        config.validate()?;
        debug!("loaded pipeline config '{}' from {}", config.dataset_name, path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CoreError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| CoreError::ConfigParse { path: "<yaml>".into(),
                                                                                          reason: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(text).map_err(|e| CoreError::ConfigParse { path: "<json>".into(),
                                                                                          reason: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Validaciones que no dependen del registro de handlers: nombres no
    /// vacíos, splits de etapa que existen en el dataset, referencias entre
    /// etapas.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.dataset_name.trim().is_empty() {
            return Err(CoreError::Config("dataset_name must not be empty".into()));
        }
        if self.file_system.sim_str_num_digits == 0 {
            return Err(CoreError::Config("file_system.sim_str_num_digits must be at least 1".into()));
        }
        for (stage_name, stage) in &self.pipeline {
            for prefix in &stage.splits {
                if self.matching_splits(prefix).next().is_none() {
                    return Err(CoreError::Config(format!("stage '{stage_name}' lists split '{prefix}' but no dataset split matches it")));
                }
            }
            for (asset, decl) in &stage.assets_in {
                for source in decl.sources() {
                    source.check(stage_name, asset)?;
                    if let Some(src_stage) = &source.stage {
                        let upstream = self.stage(src_stage)?;
                        let orig = source.orig_name.as_deref().unwrap_or(asset);
                        if !upstream.assets_out.contains_key(orig) {
                            return Err(CoreError::UnknownAsset { stage: src_stage.clone(),
                                                                 asset: orig.to_string(),
                                                                 direction: "output",
                                                                 known: upstream.assets_out.keys().cloned().collect() });
                        }
                    }
                }
                if decl.sources().filter(|s| s.primary).count() > 1 {
                    return Err(CoreError::Config(format!("asset '{asset}' of stage '{stage_name}' marks more than one source as primary")));
                }
            }
        }
        Ok(())
    }

    pub fn stage(&self, stage_name: &str) -> Result<&StageConfig, CoreError> {
        self.pipeline.get(stage_name).ok_or_else(|| CoreError::UnknownStage { stage: stage_name.to_string(),
                                                                              known: self.pipeline.keys().cloned().collect() })
    }

    /// Splits del dataset cuyo nombre empieza (sin distinguir mayúsculas) con
    /// `prefix`: `test` encuentra `Test` y `Test2`.
    pub fn matching_splits<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a SplitConfig)> + 'a {
        let prefix = prefix.to_ascii_lowercase();
        self.splits
            .iter()
            .filter(move |(name, _)| name.to_ascii_lowercase().starts_with(&prefix))
            .map(|(name, cfg)| (name.as_str(), cfg))
    }

    /// Fingerprint estable (blake3 del JSON canónico + versión de esquema).
    pub fn fingerprint(&self) -> Result<String, CoreError> {
        let value = serde_json::to_value(self).map_err(|e| CoreError::Config(format!("cannot serialize config: {e}")))?;
        Ok(hash_value(&serde_json::json!({ "schema_version": SCHEMA_VERSION, "config": value })))
    }
}

impl SourceDecl {
    /// Una fuente es de etapa (`stage`) o directa (`handler` +
    /// `path_template`), nunca ambas.
    fn check(&self, stage_name: &str, asset: &str) -> Result<(), CoreError> {
        let direct = self.handler.is_some() || self.path_template.is_some();
        match (&self.stage, direct) {
            (Some(_), false) => Ok(()),
            (None, true) if self.handler.is_some() && self.path_template.is_some() => Ok(()),
            (Some(_), true) => Err(CoreError::Config(format!("asset '{asset}' of stage '{stage_name}' mixes 'stage' with 'handler'/'path_template'"))),
            _ => Err(CoreError::Config(format!("asset '{asset}' of stage '{stage_name}' needs either 'stage' or both 'handler' and 'path_template'"))),
        }
    }
}
