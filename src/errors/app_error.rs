use cmb_core::CoreError;
use thiserror::Error;

/// Errores del binario.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Etapa '{stage}' fallida: {reason}")]
    Stage { stage: String, reason: String },
}

impl AppError {
    pub fn stage(stage: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::Stage { stage: stage.into(), reason: reason.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("CMBML_CONFIG not set".into());
        assert_eq!(err.to_string(), "Error de configuración: CMBML_CONFIG not set");
    }

    #[test]
    fn test_core_variant_is_transparent() {
        let core = CoreError::Config("bad".into());
        let expected = core.to_string();
        let err: AppError = core.into();
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_stage_variant_format() {
        let err = AppError::stage("preprocess", "empty split");
        assert_eq!(err.to_string(), "Etapa 'preprocess' fallida: empty split");
    }
}
