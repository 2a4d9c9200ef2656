//! Normalización de mapas por campo.
//!
//! Primera pasada: estadísticas por campo sobre todas las simulaciones de la
//! etapa y escritura de `norm_file`. Segunda pasada (en paralelo): cada mapa
//! se normaliza como `(x - shift) / scale` y se escribe en la salida.

use cmb_core::{AssetData, FunctionRegistry, StageHelper};
use cmb_handlers::SkyMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{stage_params, Stage};
use crate::errors::AppError;

const STAGE: &str = "preprocess";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub shift: f64,
    pub scale: f64,
}

/// Acumulador de estadísticas de un campo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    count: usize,
    min: f64,
    max: f64,
    sum: f64,
    sum_sq: f64,
}

impl Default for FieldStats {
    fn default() -> Self {
        Self { count: 0, min: f64::INFINITY, max: f64::NEG_INFINITY, sum: 0.0, sum_sq: 0.0 }
    }
}

impl FieldStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn std(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0).sqrt()
    }
}

pub type NormMethod = fn(&FieldStats) -> Scale;

fn nonzero(scale: f64) -> f64 {
    if scale.abs() <= f64::EPSILON {
        1.0
    } else {
        scale
    }
}

pub fn minmax(stats: &FieldStats) -> Scale {
    Scale { shift: stats.min, scale: nonzero(stats.max - stats.min) }
}

pub fn zscore(stats: &FieldStats) -> Scale {
    Scale { shift: stats.mean(), scale: nonzero(stats.std()) }
}

pub fn norm_methods() -> FunctionRegistry<NormMethod> {
    FunctionRegistry::<NormMethod>::new("normalization").with("minmax", minmax)
                                          .with("zscore", zscore)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    pub method: String,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self { method: "minmax".into() }
    }
}

pub struct Preprocess;

pub fn factory() -> Box<dyn Stage> {
    Box::new(Preprocess)
}

impl Preprocess {
    fn collect_stats(&self, helper: &StageHelper<'_>) -> Result<Vec<FieldStats>, AppError> {
        let mut stats: Vec<FieldStats> = Vec::new();
        helper.for_each_sim(|ctx| -> Result<(), AppError> {
                  let map: SkyMap = helper.get_asset_in_alts(ctx, "cmb_map")?.read_as()?;
                  if stats.is_empty() {
                      stats = vec![FieldStats::default(); map.n_fields()];
                  } else if stats.len() != map.n_fields() {
                      return Err(AppError::stage(STAGE,
                                                 format!("map for {:?} sim {:?} has {} fields, expected {}",
                                                         ctx.split_name(),
                                                         ctx.sim_index(),
                                                         map.n_fields(),
                                                         stats.len())));
                  }
                  for (acc, row) in stats.iter_mut().zip(map.fields().outer_iter()) {
                      row.iter().for_each(|v| acc.push(*v));
                  }
                  Ok(())
              })?;
        if stats.is_empty() {
            return Err(AppError::stage(STAGE, "no simulations to normalize"));
        }
        Ok(stats)
    }
}

impl Stage for Preprocess {
    fn inputs(&self) -> &'static [&'static str] {
        &["cmb_map"]
    }

    fn outputs(&self) -> &'static [&'static str] {
        &["norm_file", "cmb_map"]
    }

    fn validate(&self, helper: &StageHelper<'_>) -> Result<(), AppError> {
        let params: PreprocessParams = stage_params(helper)?;
        norm_methods().validate([params.method.as_str()])?;
        Ok(())
    }

    fn execute(&self, helper: &StageHelper<'_>) -> Result<(), AppError> {
        let params: PreprocessParams = stage_params(helper)?;
        let method = *norm_methods().get(&params.method)?;

        let stats = self.collect_stats(helper)?;
        let scales: Vec<Scale> = stats.iter().map(method).collect();
        let doc = json!({ "method": params.method, "fields": scales });
        helper.get_asset_out(&helper.context(), "norm_file", None)?.write(&AssetData::Json(doc))?;
        info!(method = %params.method, n_fields = scales.len(), "normalization computed");

        helper.par_for_each_sim(|ctx| -> Result<(), AppError> {
                  let map: SkyMap = helper.get_asset_in_alts(ctx, "cmb_map")?.read_as()?;
                  let normalized = map.map_fields(|i, row| {
                                          let s = scales[i];
                                          row.iter().map(|v| (v - s.shift) / s.scale).collect()
                                      })
                                      .map_err(|e| AppError::stage(STAGE, e))?;
                  helper.get_asset_out(ctx, "cmb_map", None)?.write_payload(normalized)?;
                  Ok(())
              })
    }
}
