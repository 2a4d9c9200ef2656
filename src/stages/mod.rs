//! Etapas del pipeline y su ejecución.
//!
//! Cada etapa concreta implementa `Stage` y se registra por nombre en un
//! `FunctionRegistry` de fábricas. `PipelineRunner` valida todo (nombres de
//! etapa, assets declarados, handlers) antes de ejecutar la primera.

pub mod make_sims;
pub mod preprocess;

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use cmb_core::{write_stage_log, FunctionRegistry, HandlerRegistry, PipelineConfig, StageHelper};
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::errors::AppError;

/// Una etapa del pipeline.
pub trait Stage: Send + Sync {
    /// Nombres lógicos de entrada que usa `execute`.
    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }

    /// Nombres lógicos de salida que usa `execute`.
    fn outputs(&self) -> &'static [&'static str];

    /// Chequeos propios de la etapa (p. ej. parámetros) previos a cualquier
    /// escritura.
    fn validate(&self, _helper: &StageHelper<'_>) -> Result<(), AppError> {
        Ok(())
    }

    fn execute(&self, helper: &StageHelper<'_>) -> Result<(), AppError>;
}

pub type StageFactory = fn() -> Box<dyn Stage>;

/// Etapas disponibles en este binario.
pub fn stage_registry() -> FunctionRegistry<StageFactory> {
    FunctionRegistry::<StageFactory>::new("stage").with("make_sims", make_sims::factory)
                                  .with("preprocess", preprocess::factory)
}

/// Resumen de una etapa ejecutada.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub n_sims: usize,
    pub log_path: Option<PathBuf>,
    pub elapsed_ms: u128,
}

pub struct PipelineRunner<'a> {
    config: &'a PipelineConfig,
    handlers: &'a HandlerRegistry,
    stages: FunctionRegistry<StageFactory>,
    run_id: Uuid,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(config: &'a PipelineConfig, handlers: &'a HandlerRegistry) -> Self {
        Self { config, handlers, stages: stage_registry(), run_id: Uuid::new_v4() }
    }

    pub fn with_stages(mut self, stages: FunctionRegistry<StageFactory>) -> Self {
        self.stages = stages;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Ejecuta las etapas en el orden del archivo de configuración, o sólo
    /// las de `only` si se indica.
    pub fn run(&self, only: Option<&[String]>) -> Result<Vec<StageReport>, AppError> {
        let selected = self.select(only)?;
        self.stages.validate(selected.iter().copied())?;

        let mut planned = Vec::with_capacity(selected.len());
        for name in &selected {
            let helper = StageHelper::new(self.config, name, self.handlers)?;
            let stage = (self.stages.get(name)?)();
            helper.require_assets(stage.inputs(), stage.outputs())?;
            stage.validate(&helper)?;
            planned.push((helper, stage));
        }
        info!(run_id = %self.run_id, stages = ?selected, "pipeline validated");

        let mut reports = Vec::with_capacity(planned.len());
        for (helper, stage) in planned {
            let _span = info_span!("stage", run_id = %self.run_id, name = helper.stage_name()).entered();
            let started = Instant::now();
            let log_path = write_stage_log(&helper, Utc::now())?;
            stage.execute(&helper)?;
            let report = StageReport { stage: helper.stage_name().to_string(),
                                       n_sims: helper.sim_contexts().len(),
                                       log_path,
                                       elapsed_ms: started.elapsed().as_millis() };
            info!(n_sims = report.n_sims, elapsed_ms = report.elapsed_ms as u64, "stage finished");
            reports.push(report);
        }
        Ok(reports)
    }

    fn select<'s>(&'s self, only: Option<&'s [String]>) -> Result<Vec<&'s str>, AppError> {
        match only {
            None => Ok(self.config.pipeline.keys().map(String::as_str).collect()),
            Some(names) => {
                for name in names {
                    self.config.stage(name)?;
                }
                Ok(self.config
                       .pipeline
                       .keys()
                       .map(String::as_str)
                       .filter(|k| names.iter().any(|n| n == k))
                       .collect())
            }
        }
    }
}

/// Deserializa `pipeline.<stage>.params` al tipo de parámetros de la etapa.
pub(crate) fn stage_params<T>(helper: &StageHelper<'_>) -> Result<T, AppError>
    where T: serde::de::DeserializeOwned
{
    let value = serde_json::to_value(helper.params()).map_err(|e| AppError::stage(helper.stage_name(), e))?;
    serde_json::from_value(value).map_err(|e| AppError::stage(helper.stage_name(), format!("invalid params: {e}")))
}
