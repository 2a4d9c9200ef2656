//! `Namer`: contexto + plantilla → ruta concreta.
//!
//! El `Namer` es una función pura sobre la configuración estática con la que
//! se construyó: misma plantilla y mismo contexto producen la misma ruta. No
//! toca el filesystem (no comprueba existencia ni crea directorios).
//!
//! Placeholders reconocidos:
//! - `root`: `file_system.root_dir`.
//! - `dataset_name`, `stage_name`, `split_name`: campos del contexto.
//! - `stage`: nombre de directorio de la etapa (`dir_name` en el pipeline,
//!   por defecto el nombre de la etapa).
//! - `sim_folder` (`sim0007`), `sim_num` (`0007`), `sim_index` (`7`).
//! - `det`, `field`, `epoch`: tokens opcionales del contexto.
//! - `structure`: expande `file_system.structure` (un solo nivel).
//! - cualquier clave de `file_system.vars`.

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::config::{FileSystemConfig, PipelineConfig};
use crate::context::Context;
use crate::errors::CoreError;

use super::template::{PathTemplate, TemplateError};

const BUILTIN_PLACEHOLDERS: &[&str] = &["root",
                                        "dataset_name",
                                        "stage",
                                        "stage_name",
                                        "split_name",
                                        "sim_folder",
                                        "sim_num",
                                        "sim_index",
                                        "det",
                                        "field",
                                        "epoch",
                                        "structure"];

#[derive(Debug, Clone)]
pub struct Namer {
    root_dir: Option<String>,
    sim_folder_prefix: String,
    sim_digits: usize,
    structure: Option<PathTemplate>,
    stage_dirs: IndexMap<String, String>,
    vars: IndexMap<String, String>,
}

impl Namer {
    pub fn new(fs: &FileSystemConfig) -> Result<Self, CoreError> {
        if fs.sim_str_num_digits == 0 {
            return Err(CoreError::Config("file_system.sim_str_num_digits must be at least 1".into()));
        }
        let structure = fs.structure.as_deref().map(PathTemplate::parse).transpose()?;
        if let Some(s) = &structure {
            if s.has_placeholder("structure") {
                return Err(TemplateError::Malformed { template: s.to_string(),
                                                      reason: "file_system.structure cannot reference {structure}".into() }.into());
            }
        }
        if let Some(name) = fs.vars.keys().find(|k| BUILTIN_PLACEHOLDERS.contains(&k.as_str())) {
            return Err(CoreError::Config(format!("file_system.vars.{name} shadows a built-in placeholder")));
        }
        Ok(Self { root_dir: fs.root_dir.clone(),
                  sim_folder_prefix: fs.sim_folder_prefix.clone(),
                  sim_digits: fs.sim_str_num_digits,
                  structure,
                  stage_dirs: IndexMap::new(),
                  vars: fs.vars.clone() })
    }

    /// Construye el `Namer` con los `dir_name` declarados en el pipeline.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, CoreError> {
        let mut namer = Self::new(&config.file_system)?;
        for (stage, stage_cfg) in &config.pipeline {
            if let Some(dir) = &stage_cfg.dir_name {
                namer.stage_dirs.insert(stage.clone(), dir.clone());
            }
        }
        Ok(namer)
    }

    pub fn with_stage_dir(mut self, stage: impl Into<String>, dir_name: impl Into<String>) -> Self {
        self.stage_dirs.insert(stage.into(), dir_name.into());
        self
    }

    pub fn sim_digits(&self) -> usize {
        self.sim_digits
    }

    pub fn stage_dir_name<'a>(&'a self, stage: &'a str) -> &'a str {
        self.stage_dirs.get(stage).map(String::as_str).unwrap_or(stage)
    }

    /// Índice con ancho fijo. Un índice con más dígitos que el ancho
    /// configurado es un error: los nombres de carpeta nunca se ensanchan.
    pub fn sim_num(&self, index: u32) -> Result<String, TemplateError> {
        let s = format!("{index:0width$}", width = self.sim_digits);
        if s.len() > self.sim_digits {
            return Err(TemplateError::SimIndexOverflow { index, digits: self.sim_digits });
        }
        Ok(s)
    }

    pub fn sim_folder(&self, index: u32) -> Result<String, TemplateError> {
        Ok(format!("{}{}", self.sim_folder_prefix, self.sim_num(index)?))
    }

    /// Chequeo estático: todos los placeholders de `template` tienen nombre
    /// conocido, y `root` y `structure` están configurados si se usan (el
    /// contenido de `structure` se chequea también). No garantiza que el
    /// contexto aporte los valores opcionales.
    pub fn check(&self, template: &PathTemplate) -> Result<(), TemplateError> {
        for field in template.placeholders() {
            let resolvable = match field {
                "root" => self.root_dir.is_some(),
                "structure" => match &self.structure {
                    Some(structure) => {
                        self.check(structure)?;
                        true
                    }
                    None => false,
                },
                _ => BUILTIN_PLACEHOLDERS.contains(&field) || self.vars.contains_key(field),
            };
            if !resolvable {
                return Err(TemplateError::Unresolved { field: field.to_string(), template: template.to_string() });
            }
        }
        Ok(())
    }

    pub fn resolve(&self, template: &PathTemplate, ctx: &Context) -> Result<PathBuf, TemplateError> {
        self.render(template, ctx, true).map(PathBuf::from)
    }

    pub fn resolve_str(&self, template: &str, ctx: &Context) -> Result<PathBuf, TemplateError> {
        self.resolve(&PathTemplate::parse(template)?, ctx)
    }

    fn render(&self, template: &PathTemplate, ctx: &Context, allow_structure: bool) -> Result<String, TemplateError> {
        template.render(|name| self.lookup(name, ctx, allow_structure))
    }

    fn lookup(&self, name: &str, ctx: &Context, allow_structure: bool) -> Result<Option<String>, TemplateError> {
        let value = match name {
            "root" => self.root_dir.clone(),
            "dataset_name" => Some(ctx.dataset_name().to_string()),
            "stage" => Some(self.stage_dir_name(ctx.stage_name()).to_string()),
            "stage_name" => Some(ctx.stage_name().to_string()),
            "split_name" => ctx.split_name().map(str::to_string),
            "sim_folder" => ctx.sim_index().map(|i| self.sim_folder(i)).transpose()?,
            "sim_num" => ctx.sim_index().map(|i| self.sim_num(i)).transpose()?,
            "sim_index" => ctx.sim_index().map(|i| i.to_string()),
            "det" => ctx.detector().map(str::to_string),
            "field" => ctx.field().map(str::to_string),
            "epoch" => ctx.epoch().map(|e| e.to_string()),
            "structure" if allow_structure => match &self.structure {
                Some(s) => Some(self.render(s, ctx, false)?),
                None => None,
            },
            other => self.vars.get(other).cloned(),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs(structure: Option<&str>) -> FileSystemConfig {
        FileSystemConfig { root_dir: Some("/data".into()),
                           structure: structure.map(str::to_string),
                           ..FileSystemConfig::default() }
    }

    #[test]
    fn sim_folder_is_zero_padded_to_width() {
        let namer = Namer::new(&fs(None)).unwrap();
        assert_eq!(namer.sim_folder(7).unwrap(), "sim0007");
        assert_eq!(namer.sim_folder(0).unwrap(), "sim0000");
        assert_eq!(namer.sim_folder(9999).unwrap(), "sim9999");
        for i in [0u32, 5, 42, 613, 9999] {
            assert_eq!(namer.sim_num(i).unwrap().len(), 4);
        }
    }

    #[test]
    fn sim_index_wider_than_width_fails() {
        let namer = Namer::new(&fs(None)).unwrap();
        assert_eq!(namer.sim_folder(10_000).unwrap_err(), TemplateError::SimIndexOverflow { index: 10_000, digits: 4 });
    }

    #[test]
    fn zero_width_is_a_config_error() {
        let cfg = FileSystemConfig { sim_str_num_digits: 0, ..FileSystemConfig::default() };
        assert!(matches!(Namer::new(&cfg), Err(CoreError::Config(_))));
    }

    #[test]
    fn structure_expands_one_level() {
        let namer = Namer::new(&fs(Some("{root}/{dataset_name}/{stage}/{split_name}/{sim_folder}"))).unwrap()
                                                                                                    .with_stage_dir("make_sims", "Raw");
        let ctx = Context::new("Dummy", "make_sims").with_split("Test").with_sim(12);
        let path = namer.resolve_str("{structure}/cmb_map.bin", &ctx).unwrap();
        assert_eq!(path, PathBuf::from("/data/Dummy/Raw/Test/sim0012/cmb_map.bin"));
    }

    #[test]
    fn recursive_structure_is_rejected() {
        let err = Namer::new(&fs(Some("{structure}/x"))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTemplate(TemplateError::Malformed { .. })));
    }

    #[test]
    fn missing_context_field_is_unresolved() {
        let namer = Namer::new(&fs(None)).unwrap();
        let ctx = Context::new("Dummy", "make_sims").with_split("Train");
        let err = namer.resolve_str("{root}/{split_name}/{sim_folder}", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::Unresolved { ref field, .. } if field == "sim_folder"));
    }

    #[test]
    fn vars_resolve_and_unknown_names_fail_check() {
        let mut cfg = fs(None);
        cfg.vars.insert("preset".into(), "low_res".into());
        let namer = Namer::new(&cfg).unwrap();
        let ctx = Context::new("Dummy", "make_sims").with_detector("100");
        assert_eq!(namer.resolve_str("{root}/{preset}/{det}GHz", &ctx).unwrap(), PathBuf::from("/data/low_res/100GHz"));
        assert!(namer.check(&PathTemplate::parse("{root}/{presett}").unwrap()).is_err());
        assert!(namer.check(&PathTemplate::parse("{root}/{preset}/{sim_folder}").unwrap()).is_ok());
    }

    #[test]
    fn check_requires_configured_root_and_structure() {
        let mut cfg = fs(None);
        cfg.root_dir = None;
        let namer = Namer::new(&cfg).unwrap();
        let err = namer.check(&PathTemplate::parse("{root}/{stage}/map.bin").unwrap()).unwrap_err();
        assert!(matches!(err, TemplateError::Unresolved { ref field, .. } if field == "root"));
        let err = namer.check(&PathTemplate::parse("{structure}/map.bin").unwrap()).unwrap_err();
        assert!(matches!(err, TemplateError::Unresolved { ref field, .. } if field == "structure"));
        assert!(namer.check(&PathTemplate::parse("/abs/{stage}/{sim_folder}/map.bin").unwrap()).is_ok());
    }

    #[test]
    fn check_looks_inside_structure() {
        let mut cfg = fs(Some("{root}/{dataset_name}/{stage}"));
        cfg.root_dir = None;
        let namer = Namer::new(&cfg).unwrap();
        let err = namer.check(&PathTemplate::parse("{structure}/map.bin").unwrap()).unwrap_err();
        assert!(matches!(err, TemplateError::Unresolved { ref field, ref template } if field == "root" && template == "{root}/{dataset_name}/{stage}"));

        let namer = Namer::new(&fs(Some("{root}/{dataset_name}/{bogus}"))).unwrap();
        let err = namer.check(&PathTemplate::parse("{structure}/map.bin").unwrap()).unwrap_err();
        assert!(matches!(err, TemplateError::Unresolved { ref field, .. } if field == "bogus"));
    }

    #[test]
    fn vars_cannot_shadow_builtins() {
        let mut cfg = fs(None);
        cfg.vars.insert("root".into(), "/elsewhere".into());
        assert!(matches!(Namer::new(&cfg), Err(CoreError::Config(_))));
    }
}
