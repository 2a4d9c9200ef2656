//! Contexto de una unidad de trabajo.
//!
//! Un `Context` identifica qué se está procesando: dataset, etapa, split e
//! índice de simulación (más tokens opcionales de detector, campo y época).
//! Es inmutable: las derivaciones (`with_*`) devuelven un contexto nuevo, de
//! modo que cada iteración de un loop sobre splits/simulaciones construye el
//! suyo.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    dataset_name: String,
    stage_name: String,
    split_name: Option<String>,
    sim_index: Option<u32>,
    detector: Option<String>,
    field: Option<String>,
    epoch: Option<u32>,
}

impl Context {
    /// Contexto a nivel de dataset (sin split ni simulación).
    pub fn new(dataset_name: impl Into<String>, stage_name: impl Into<String>) -> Self {
        Self { dataset_name: dataset_name.into(),
               stage_name: stage_name.into(),
               split_name: None,
               sim_index: None,
               detector: None,
               field: None,
               epoch: None }
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn split_name(&self) -> Option<&str> {
        self.split_name.as_deref()
    }

    pub fn sim_index(&self) -> Option<u32> {
        self.sim_index
    }

    pub fn detector(&self) -> Option<&str> {
        self.detector.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn epoch(&self) -> Option<u32> {
        self.epoch
    }

    pub fn with_stage(&self, stage_name: impl Into<String>) -> Self {
        Self { stage_name: stage_name.into(), ..self.clone() }
    }

    pub fn with_split(&self, split_name: impl Into<String>) -> Self {
        Self { split_name: Some(split_name.into()), ..self.clone() }
    }

    pub fn with_sim(&self, sim_index: u32) -> Self {
        Self { sim_index: Some(sim_index), ..self.clone() }
    }

    /// Quita el índice de simulación (assets a nivel de split).
    pub fn without_sim(&self) -> Self {
        Self { sim_index: None, ..self.clone() }
    }

    pub fn with_detector(&self, detector: impl Into<String>) -> Self {
        Self { detector: Some(detector.into()), ..self.clone() }
    }

    pub fn with_field(&self, field: impl Into<String>) -> Self {
        Self { field: Some(field.into()), ..self.clone() }
    }

    pub fn with_epoch(&self, epoch: u32) -> Self {
        Self { epoch: Some(epoch), ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivations_leave_the_original_untouched() {
        let base = Context::new("Dummy", "make_sims");
        let sim = base.with_split("Train").with_sim(3);
        assert_eq!(base.split_name(), None);
        assert_eq!(base.sim_index(), None);
        assert_eq!(sim.split_name(), Some("Train"));
        assert_eq!(sim.sim_index(), Some(3));
        assert_eq!(sim.without_sim().sim_index(), None);
        assert_eq!(sim.with_stage("preprocess").stage_name(), "preprocess");
        assert_eq!(sim.stage_name(), "make_sims");
    }
}
