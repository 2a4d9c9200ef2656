//! Configuración de proceso.
//!
//! Carga variables de entorno (y `.env` si existe) una sola vez y expone una
//! estructura inmutable. La configuración del pipeline en sí vive en un
//! archivo YAML/JSON apuntado por `CMBML_CONFIG`.
use std::env;
use std::path::{Path, PathBuf};

use cmb_core::PipelineConfig;
use once_cell::sync::OnceCell;

use crate::errors::AppError;

pub const ENV_CONFIG: &str = "CMBML_CONFIG";
pub const ENV_ROOT: &str = "CMBML_ROOT";
pub const ENV_STAGES: &str = "CMBML_STAGES";

/// Configuración de la ejecución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Archivo de configuración del pipeline.
    pub config_path: PathBuf,
    /// Reemplaza `file_system.root_dir` del archivo.
    pub root_override: Option<String>,
    /// Subconjunto de etapas a ejecutar (`None`: todas, en orden).
    pub stages: Option<Vec<String>>,
}

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

impl AppConfig {
    /// Construye la configuración desde un lookup de variables arbitrario.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let config_path = lookup(ENV_CONFIG).filter(|v| !v.trim().is_empty())
                                            .map(PathBuf::from)
                                            .ok_or_else(|| AppError::Config(format!("{ENV_CONFIG} not set")))?;
        let root_override = lookup(ENV_ROOT).filter(|v| !v.trim().is_empty());
        let stages = lookup(ENV_STAGES).map(|v| {
                                           v.split(',')
                                            .map(str::trim)
                                            .filter(|s| !s.is_empty())
                                            .map(str::to_string)
                                            .collect::<Vec<_>>()
                                       })
                                       .filter(|v| !v.is_empty());
        Ok(Self { config_path, root_override, stages })
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Instancia global, evaluada la primera vez que se pide.
    pub fn global() -> Result<&'static AppConfig, AppError> {
        CONFIG.get_or_try_init(Self::from_env)
    }

    /// Carga y valida el pipeline aplicando los overrides de proceso.
    pub fn load_pipeline(&self) -> Result<PipelineConfig, AppError> {
        load_pipeline(&self.config_path, self.root_override.as_deref())
    }
}

pub fn load_pipeline(path: &Path, root_override: Option<&str>) -> Result<PipelineConfig, AppError> {
    let mut config = PipelineConfig::from_path(path)?;
    if let Some(root) = root_override {
        config.file_system.root_dir = Some(root.to_string());
        config.validate()?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_stage_list() {
        let cfg = AppConfig::from_lookup(lookup(&[(ENV_CONFIG, "configs/dummy.yaml"),
                                                  (ENV_STAGES, " make_sims, ,preprocess ")])).unwrap();
        assert_eq!(cfg.config_path, PathBuf::from("configs/dummy.yaml"));
        assert_eq!(cfg.root_override, None);
        assert_eq!(cfg.stages, Some(vec!["make_sims".to_string(), "preprocess".to_string()]));
    }

    #[test]
    fn missing_config_path_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_ROOT, "/data")])).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains(ENV_CONFIG)));
    }
}
