//! Errores del core.
//!
//! Todas las variantes que involucran un asset llevan el nombre lógico, la
//! etapa y las rutas concretas: los pipelines corren desatendidos y el
//! diagnóstico se hace después, leyendo logs.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::handler::HandlerError;
use crate::naming::TemplateError;

/// Operación de I/O solicitada sobre un handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => f.write_str("read"),
            Operation::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown handler tag '{tag}' (known: {})", .known.join(", "))]
    UnknownHandler { tag: String, known: Vec<String> },

    #[error("asset '{asset}' of stage '{stage}': unknown handler tag '{tag}' (known: {})", .known.join(", "))]
    UnknownAssetHandler { stage: String, asset: String, tag: String, known: Vec<String> },

    #[error("unknown stage '{stage}' (known: {})", .known.join(", "))]
    UnknownStage { stage: String, known: Vec<String> },

    #[error("stage '{stage}' declares no {direction} asset '{asset}' (declared: {})", .known.join(", "))]
    UnknownAsset { stage: String, asset: String, direction: &'static str, known: Vec<String> },

    #[error("unknown {kind} '{name}' (known: {})", .known.join(", "))]
    UnknownFunction { kind: &'static str, name: String, known: Vec<String> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot parse configuration {}: {reason}", .path.display())]
    ConfigParse { path: PathBuf, reason: String },

    #[error("asset '{asset}' of stage '{stage}': {source}")]
    Template { stage: String, asset: String, #[source] source: TemplateError },

    #[error(transparent)]
    InvalidTemplate(#[from] TemplateError),

    #[error("asset '{asset}' of stage '{stage}': no candidate path exists (attempted: {})", display_paths(.attempted))]
    NoCandidateFound { asset: String, stage: String, attempted: Vec<PathBuf> },

    #[error("asset '{asset}' of stage '{stage}': parent directory of {} does not exist and create_dirs is disabled", .path.display())]
    PathNotFound { asset: String, stage: String, path: PathBuf },

    #[error("asset '{asset}' of stage '{stage}': handler '{tag}' does not support {op} ({})", .path.display())]
    UnsupportedOperation { asset: String, stage: String, tag: String, op: Operation, path: PathBuf },

    #[error("asset '{asset}' of stage '{stage}': {op} of {} failed: {source}", .path.display())]
    Handler { asset: String, stage: String, op: Operation, path: PathBuf, #[source] source: HandlerError },

    #[error("io error on {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

impl CoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CoreError::Io { path: path.to_path_buf(), source }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handler_lists_known_tags() {
        let err = CoreError::UnknownHandler { tag: "fitz".into(), known: vec!["json".into(), "sky_map".into()] };
        assert_eq!(err.to_string(), "unknown handler tag 'fitz' (known: json, sky_map)");
    }

    #[test]
    fn unknown_asset_handler_names_asset_and_stage() {
        let err = CoreError::UnknownAssetHandler { stage: "make_sims".into(),
                                                   asset: "cmb_map".into(),
                                                   tag: "fitz".into(),
                                                   known: vec!["json".into()] };
        assert_eq!(err.to_string(), "asset 'cmb_map' of stage 'make_sims': unknown handler tag 'fitz' (known: json)");
    }

    #[test]
    fn no_candidate_names_every_path() {
        let err = CoreError::NoCandidateFound { asset: "cmb_map".into(),
                                                stage: "preprocess".into(),
                                                attempted: vec![PathBuf::from("a/map.bin"), PathBuf::from("b/map.bin")] };
        let msg = err.to_string();
        assert!(msg.contains("cmb_map"));
        assert!(msg.contains("preprocess"));
        assert!(msg.contains("a/map.bin, b/map.bin"));
    }
}
