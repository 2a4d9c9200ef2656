//! Simulaciones sintéticas: un mapa por (split, simulación) y sus parámetros.
//!
//! La semilla de cada simulación se deriva de la semilla base, el split y el
//! índice, de modo que rehacer una simulación aislada da el mismo mapa.

use cmb_core::hashing::hash_str;
use cmb_core::{AssetData, Context, StageHelper};
use cmb_handlers::sky_map::nside_to_npix;
use cmb_handlers::SkyMap;
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{stage_params, Stage};
use crate::errors::AppError;

const STAGE: &str = "make_sims";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakeSimsParams {
    pub nside: u32,
    pub n_fields: usize,
    pub seed: u64,
    pub amplitude: f64,
}

impl Default for MakeSimsParams {
    fn default() -> Self {
        Self { nside: 4, n_fields: 3, seed: 0, amplitude: 100.0 }
    }
}

pub struct MakeSims;

pub fn factory() -> Box<dyn Stage> {
    Box::new(MakeSims)
}

/// Semilla de la simulación `ctx` (split + índice) para la semilla base.
pub fn sim_seed(base: u64, ctx: &Context) -> u64 {
    let key = format!("{base}/{}/{}", ctx.split_name().unwrap_or_default(), ctx.sim_index().unwrap_or_default());
    let digest = hash_str(&key);
    u64::from_str_radix(&digest[..16], 16).unwrap_or(base)
}

/// Píxeles por campo y total de valores de un mapa con `params`.
pub fn map_size(params: &MakeSimsParams) -> Result<(usize, usize), AppError> {
    if params.nside == 0 || params.n_fields == 0 {
        return Err(AppError::stage(STAGE, "nside and n_fields must be positive"));
    }
    let npix = nside_to_npix(params.nside).ok_or_else(|| AppError::stage(STAGE, format!("nside {} is out of range", params.nside)))?;
    let total = npix.checked_mul(params.n_fields)
                    .ok_or_else(|| AppError::stage(STAGE, format!("{} fields of {npix} pixels overflow", params.n_fields)))?;
    Ok((npix, total))
}

pub fn simulate(params: &MakeSimsParams, seed: u64) -> Result<SkyMap, AppError> {
    let (npix, total) = map_size(params)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values: Vec<f64> = (0..total).map(|_| params.amplitude * rng.gen_range(-1.0..1.0)).collect();
    let fields = Array2::from_shape_vec((params.n_fields, npix), values).map_err(|e| AppError::stage(STAGE, e))?;
    SkyMap::new(fields).map_err(|e| AppError::stage(STAGE, e))
}

impl Stage for MakeSims {
    fn outputs(&self) -> &'static [&'static str] {
        &["cmb_map", "sim_params"]
    }

    fn validate(&self, helper: &StageHelper<'_>) -> Result<(), AppError> {
        let params: MakeSimsParams = stage_params(helper)?;
        map_size(&params).map(|_| ())
    }

    fn execute(&self, helper: &StageHelper<'_>) -> Result<(), AppError> {
        let params: MakeSimsParams = stage_params(helper)?;
        helper.par_for_each_sim(|ctx| -> Result<(), AppError> {
                  let seed = sim_seed(params.seed, ctx);
                  let map = simulate(&params, seed)?;
                  helper.get_asset_out(ctx, "cmb_map", None)?.write_payload(map)?;
                  let record = json!({
                      "split": ctx.split_name(),
                      "sim": ctx.sim_index(),
                      "seed": seed,
                      "nside": params.nside,
                      "n_fields": params.n_fields,
                      "amplitude": params.amplitude,
                  });
                  helper.get_asset_out(ctx, "sim_params", None)?.write(&AssetData::Json(record))?;
                  debug!(split = ?ctx.split_name(), sim = ?ctx.sim_index(), seed, "simulated");
                  Ok(())
              })
    }
}
