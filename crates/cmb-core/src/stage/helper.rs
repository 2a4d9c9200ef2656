//! `StageHelper`: punto único por el que una etapa obtiene sus assets.
//!
//! Se construye con `(config, stage_name, registry)` y valida de entrada
//! (fail-fast) todas las declaraciones de la etapa: plantillas parseables con
//! placeholders conocidos, handlers registrados y referencias a salidas de
//! otras etapas existentes. Después sólo resuelve; no guarda estado mutable.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;
use serde_json::Value;

use super::splits::{plan_splits, SplitPlan};
use crate::asset::{Asset, AssetRole, AssetWithPathAlts, PathCandidate};
use crate::config::{PipelineConfig, SourceDecl, StageConfig};
use crate::constants::{DEFAULT_LOG_TEMPLATE, STAGE_LOG_ASSET, STAGE_LOG_HANDLER};
use crate::context::Context;
use crate::errors::CoreError;
use crate::handler::{Handler, HandlerRegistry};
use crate::naming::{Namer, PathTemplate, TemplateError};

/// Plantilla + handler efectivos de una fuente, y la etapa cuyo directorio
/// usa (`{stage}`).
#[derive(Debug, Clone)]
struct Binding {
    stage: String,
    handler: String,
    template: PathTemplate,
}

#[derive(Debug)]
pub struct StageHelper<'a> {
    config: &'a PipelineConfig,
    registry: &'a HandlerRegistry,
    stage_name: String,
    stage: &'a StageConfig,
    namer: Namer,
}

impl<'a> StageHelper<'a> {
    pub fn new(config: &'a PipelineConfig, stage_name: &str, registry: &'a HandlerRegistry) -> Result<Self, CoreError> {
        let stage = config.stage(stage_name)?;
        let namer = Namer::from_config(config)?;
        let helper = Self { config, registry, stage_name: stage_name.to_string(), stage, namer };
        helper.preflight()?;
        debug!("stage '{}' ready: {} inputs, {} outputs",
               helper.stage_name,
               stage.assets_in.len(),
               stage.assets_out.len());
        Ok(helper)
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn stage_config(&self) -> &'a StageConfig {
        self.stage
    }

    pub fn namer(&self) -> &Namer {
        &self.namer
    }

    pub fn registry(&self) -> &'a HandlerRegistry {
        self.registry
    }

    /// Parámetros opacos de la etapa (`pipeline.<stage>.params`).
    pub fn params(&self) -> &'a IndexMap<String, Value> {
        &self.stage.params
    }

    /// Contexto base (dataset + etapa) para esta etapa.
    pub fn context(&self) -> Context {
        Context::new(&self.config.dataset_name, &self.stage_name)
    }

    /// Declara por adelantado los nombres lógicos que usa el código de la
    /// etapa; un nombre no declarado en la configuración falla aquí y no a
    /// mitad de la corrida.
    pub fn require_assets(&self, inputs: &[&str], outputs: &[&str]) -> Result<(), CoreError> {
        for name in inputs {
            if !self.stage.assets_in.contains_key(*name) {
                return Err(self.unknown(&self.stage_name, self.stage, name, "input"));
            }
        }
        for name in outputs {
            if !self.stage.assets_out.contains_key(*name) {
                return Err(self.unknown(&self.stage_name, self.stage, name, "output"));
            }
        }
        Ok(())
    }

    /// Asset de salida `logical_name` declarado por `stage_name` (por
    /// defecto, esta etapa).
    pub fn get_asset_out(&self, ctx: &Context, logical_name: &str, stage_name: Option<&str>) -> Result<Asset, CoreError> {
        let (owner, stage) = self.owner(stage_name)?;
        let decl = stage.assets_out
                        .get(logical_name)
                        .ok_or_else(|| self.unknown(owner, stage, logical_name, "output"))?;
        let template = PathTemplate::parse(&decl.path_template).map_err(|e| wrap(owner, logical_name, e))?;
        let path = self.resolve(&template, &ctx.with_stage(owner), owner, logical_name)?;
        let handler = self.handler(owner, logical_name, &decl.handler)?;
        Ok(Asset::new(logical_name, owner, AssetRole::Out, path, &decl.handler, handler).with_create_dirs(self.config.create_dirs))
    }

    /// Asset de entrada `logical_name` declarado por `stage_name` (por
    /// defecto, esta etapa), resuelto a su fuente primaria.
    pub fn get_asset_in(&self, ctx: &Context, logical_name: &str, stage_name: Option<&str>) -> Result<Asset, CoreError> {
        let (owner, stage) = self.owner(stage_name)?;
        let decl = stage.assets_in
                        .get(logical_name)
                        .ok_or_else(|| self.unknown(owner, stage, logical_name, "input"))?;
        let sources: Vec<&SourceDecl> = decl.sources().collect();
        let primary = sources.iter().position(|s| s.primary).unwrap_or(0);
        let binding = self.bind(owner, logical_name, sources[primary])?;
        let path = self.resolve(&binding.template, &ctx.with_stage(&binding.stage), owner, logical_name)?;
        let handler = self.handler(owner, logical_name, &binding.handler)?;
        Ok(Asset::new(logical_name, owner, AssetRole::In, path, &binding.handler, handler).with_create_dirs(self.config.create_dirs))
    }

    /// Asset de entrada con todas sus fuentes como rutas candidatas.
    pub fn get_asset_in_alts(&self, ctx: &Context, logical_name: &str) -> Result<AssetWithPathAlts, CoreError> {
        let owner = self.stage_name.as_str();
        let decl = self.stage
                       .assets_in
                       .get(logical_name)
                       .ok_or_else(|| self.unknown(owner, self.stage, logical_name, "input"))?;
        let sources: Vec<&SourceDecl> = decl.sources().collect();
        let primary = sources.iter().position(|s| s.primary).unwrap_or(0);
        let mut candidates = Vec::with_capacity(sources.len());
        let mut tag = String::new();
        for (i, source) in sources.iter().enumerate() {
            let binding = self.bind(owner, logical_name, source)?;
            let path = self.resolve(&binding.template, &ctx.with_stage(&binding.stage), owner, logical_name)?;
            if i == primary {
                tag = binding.handler;
            }
            candidates.push(PathCandidate { path, is_primary: i == primary });
        }
        let handler = self.handler(owner, logical_name, &tag)?;
        Ok(AssetWithPathAlts::new(logical_name, owner, AssetRole::In, candidates, tag, handler)?.with_create_dirs(self.config.create_dirs))
    }

    /// Directorio de trabajo de la etapa para `ctx` (`file_system.structure`).
    pub fn stage_dir(&self, ctx: &Context) -> Result<PathBuf, CoreError> {
        if self.config.file_system.structure.is_none() {
            return Err(CoreError::Config("file_system.structure is not configured".into()));
        }
        Ok(self.namer.resolve_str("{structure}", &ctx.with_stage(&self.stage_name))?)
    }

    /// Splits que procesa esta etapa.
    pub fn splits(&self) -> Vec<SplitPlan> {
        plan_splits(self.config, self.stage)
    }

    /// Un contexto por (split, simulación), en orden.
    pub fn sim_contexts(&self) -> Vec<Context> {
        let base = self.context();
        self.splits().iter().flat_map(|plan| plan.sim_contexts(&base)).collect()
    }

    /// Ejecuta `f` secuencialmente para cada simulación; el primer error
    /// corta la iteración.
    pub fn for_each_sim<F, E>(&self, mut f: F) -> Result<(), E>
        where F: FnMut(&Context) -> Result<(), E>
    {
        self.sim_contexts().iter().try_for_each(|ctx| f(ctx))
    }

    /// Igual que `for_each_sim` pero repartido en el pool de rayon. `f`
    /// recibe su propio `Context` y debe crear sus propios assets.
    pub fn par_for_each_sim<F, E>(&self, f: F) -> Result<(), E>
        where F: Fn(&Context) -> Result<(), E> + Sync + Send,
              E: Send
    {
        self.sim_contexts().par_iter().try_for_each(|ctx| f(ctx))
    }

    fn owner<'s>(&'s self, stage_name: Option<&'s str>) -> Result<(&'s str, &'a StageConfig), CoreError> {
        match stage_name {
            None => Ok((self.stage_name.as_str(), self.stage)),
            Some(name) if name == self.stage_name => Ok((self.stage_name.as_str(), self.stage)),
            Some(name) => Ok((name, self.config.stage(name)?)),
        }
    }

    fn bind(&self, owner: &str, asset: &str, source: &SourceDecl) -> Result<Binding, CoreError> {
        let (stage, handler, raw) = match (&source.stage, &source.handler, &source.path_template) {
            (Some(src_stage), _, _) => {
                let upstream = self.config.stage(src_stage)?;
                let orig = source.orig_name.as_deref().unwrap_or(asset);
                let out = upstream.assets_out
                                  .get(orig)
                                  .ok_or_else(|| self.unknown(src_stage, upstream, orig, "output"))?;
                (src_stage.clone(), out.handler.clone(), out.path_template.as_str())
            }
            (None, Some(handler), Some(template)) => (owner.to_string(), handler.clone(), template.as_str()),
            _ => {
                return Err(CoreError::Config(format!("asset '{asset}' of stage '{owner}' needs either 'stage' or both 'handler' and 'path_template'")))
            }
        };
        let template = PathTemplate::parse(raw).map_err(|e| wrap(owner, asset, e))?;
        Ok(Binding { stage, handler, template })
    }

    /// Handler registrado bajo `tag`; el error nombra el asset y la etapa
    /// que lo declaran.
    pub(crate) fn handler(&self, owner: &str, asset: &str, tag: &str) -> Result<Arc<dyn Handler>, CoreError> {
        self.registry.get(tag).map_err(|e| match e {
                                  CoreError::UnknownHandler { tag, known } => {
                                      CoreError::UnknownAssetHandler { stage: owner.to_string(), asset: asset.to_string(), tag, known }
                                  }
                                  other => other,
                              })
    }

    fn resolve(&self, template: &PathTemplate, ctx: &Context, owner: &str, asset: &str) -> Result<PathBuf, CoreError> {
        self.namer.resolve(template, ctx).map_err(|e| wrap(owner, asset, e))
    }

    fn unknown(&self, stage_name: &str, stage: &StageConfig, asset: &str, direction: &'static str) -> CoreError {
        let known = match direction {
            "input" => stage.assets_in.keys().cloned().collect(),
            _ => stage.assets_out.keys().cloned().collect(),
        };
        CoreError::UnknownAsset { stage: stage_name.to_string(), asset: asset.to_string(), direction, known }
    }

    /// Validación previa a cualquier trabajo de simulación.
    fn preflight(&self) -> Result<(), CoreError> {
        let owner = self.stage_name.as_str();
        for (name, decl) in &self.stage.assets_out {
            let template = PathTemplate::parse(&decl.path_template).map_err(|e| wrap(owner, name, e))?;
            self.namer.check(&template).map_err(|e| wrap(owner, name, e))?;
            self.handler(owner, name, &decl.handler)?;
        }
        for (name, decl) in &self.stage.assets_in {
            let mut tags = BTreeSet::new();
            for source in decl.sources() {
                let binding = self.bind(owner, name, source)?;
                self.namer.check(&binding.template).map_err(|e| wrap(owner, name, e))?;
                self.handler(owner, name, &binding.handler)?;
                tags.insert(binding.handler);
            }
            if tags.len() > 1 {
                return Err(CoreError::Config(format!("asset '{name}' of stage '{owner}' mixes handlers across alternates: {}",
                                                     tags.into_iter().collect::<Vec<_>>().join(", "))));
            }
        }
        if self.stage.make_stage_log {
            let raw = self.config.file_system.log_template.as_deref().unwrap_or(DEFAULT_LOG_TEMPLATE);
            let template = PathTemplate::parse(raw).map_err(|e| wrap(owner, STAGE_LOG_ASSET, e))?;
            self.namer.check(&template).map_err(|e| wrap(owner, STAGE_LOG_ASSET, e))?;
            self.handler(owner, STAGE_LOG_ASSET, STAGE_LOG_HANDLER)?;
        }
        Ok(())
    }
}

fn wrap(stage: &str, asset: &str, source: TemplateError) -> CoreError {
    CoreError::Template { stage: stage.to_string(), asset: asset.to_string(), source }
}
