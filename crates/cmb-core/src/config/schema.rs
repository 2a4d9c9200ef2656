//! Esquema declarativo del pipeline.
//!
//! ```yaml
//! dataset_name: Dummy
//! create_dirs: true
//! file_system:
//!   root_dir: /data/cmb
//!   sim_folder_prefix: sim
//!   sim_str_num_digits: 4
//!   structure: "{root}/{dataset_name}/{stage}/{split_name}/{sim_folder}"
//! splits:
//!   Train: { n_sims: 10 }
//!   Test: { n_sims: 5 }
//! pipeline:
//!   make_sims:
//!     dir_name: Raw
//!     splits: [train, test]
//!     assets_out:
//!       cmb_map: { handler: sky_map, path_template: "{structure}/cmb_map.bin" }
//!   preprocess:
//!     dir_name: Preprocessed
//!     splits: [train]
//!     assets_in:
//!       cmb_map: { stage: make_sims }
//!     assets_out:
//!       norm_file: { handler: json, path_template: "{root}/{dataset_name}/{stage}/norm.json" }
//! ```
//!
//! Los mapas usan `IndexMap` para conservar el orden de declaración (orden de
//! ejecución de etapas y de iteración de splits).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_SIM_DIGITS, DEFAULT_SIM_FOLDER_PREFIX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dataset_name: String,
    #[serde(default)]
    pub create_dirs: bool,
    #[serde(default)]
    pub file_system: FileSystemConfig,
    #[serde(default)]
    pub splits: IndexMap<String, SplitConfig>,
    #[serde(default)]
    pub pipeline: IndexMap<String, StageConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSystemConfig {
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default = "default_sim_prefix")]
    pub sim_folder_prefix: String,
    #[serde(default = "default_sim_digits")]
    pub sim_str_num_digits: usize,
    /// Plantilla del directorio de trabajo de una etapa; se referencia como
    /// `{structure}` desde las plantillas de assets.
    #[serde(default)]
    pub structure: Option<String>,
    #[serde(default)]
    pub log_template: Option<String>,
    /// Variables estáticas adicionales para las plantillas.
    #[serde(default)]
    pub vars: IndexMap<String, String>,
}

fn default_sim_prefix() -> String {
    DEFAULT_SIM_FOLDER_PREFIX.to_string()
}

fn default_sim_digits() -> usize {
    DEFAULT_SIM_DIGITS
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self { root_dir: None,
               sim_folder_prefix: default_sim_prefix(),
               sim_str_num_digits: default_sim_digits(),
               structure: None,
               log_template: None,
               vars: IndexMap::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    pub n_sims: u32,
    /// Flags libres por split (p. ej. `ps_fidu_fixed: true`).
    #[serde(flatten)]
    pub flags: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub dir_name: Option<String>,
    /// Prefijos (case-insensitive) de los splits que procesa la etapa.
    #[serde(default)]
    pub splits: Vec<String>,
    #[serde(default)]
    pub assets_out: IndexMap<String, AssetOutDecl>,
    #[serde(default)]
    pub assets_in: IndexMap<String, AssetInDecl>,
    #[serde(default)]
    pub make_stage_log: bool,
    /// Parámetros propios de la etapa, opacos para el core.
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetOutDecl {
    pub handler: String,
    pub path_template: String,
}

/// Fuente de un asset de entrada: la salida de otra etapa
/// (`stage` + `orig_name` opcional) o una declaración directa
/// (`handler` + `path_template`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_template: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInDecl {
    #[serde(flatten)]
    pub source: SourceDecl,
    /// Fuentes alternativas, consultadas en orden después de `source`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<SourceDecl>,
}

impl AssetInDecl {
    /// Todas las fuentes en orden de consulta.
    pub fn sources(&self) -> impl Iterator<Item = &SourceDecl> {
        std::iter::once(&self.source).chain(self.alternates.iter())
    }
}
