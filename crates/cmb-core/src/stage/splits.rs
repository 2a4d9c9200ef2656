//! Planificación de splits y simulaciones de una etapa.

use serde::Serialize;

use crate::config::{PipelineConfig, StageConfig};
use crate::context::Context;

/// Un split concreto que procesa una etapa, con su número de simulaciones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    pub name: String,
    pub n_sims: u32,
}

impl SplitPlan {
    /// Contextos por simulación (`0..n_sims`) derivados de `base`.
    pub fn sim_contexts(&self, base: &Context) -> Vec<Context> {
        let split_ctx = base.with_split(&self.name);
        (0..self.n_sims).map(|i| split_ctx.with_sim(i)).collect()
    }
}

/// Splits del dataset que cubre `stage`, en el orden de declaración del
/// dataset y sin repetidos (dos prefijos pueden solaparse).
pub(crate) fn plan_splits(config: &PipelineConfig, stage: &StageConfig) -> Vec<SplitPlan> {
    let mut plans: Vec<SplitPlan> = Vec::new();
    for (name, split) in &config.splits {
        let lower = name.to_ascii_lowercase();
        let selected = stage.splits.iter().any(|p| lower.starts_with(&p.to_ascii_lowercase()));
        if selected && !plans.iter().any(|p| &p.name == name) {
            plans.push(SplitPlan { name: name.clone(), n_sims: split.n_sims });
        }
    }
    plans
}
