//! Resolución por etapa: `StageHelper` y planificación de splits.

mod helper;
mod splits;

pub use helper::StageHelper;
pub use splits::SplitPlan;
