//! cmb-core: resolución de rutas y handlers para pipelines de datasets CMB.
//!
//! Capas (de hojas a raíz):
//! - `handler`: trait `Handler`, datos neutrales `AssetData` y `HandlerRegistry`.
//! - `naming`: `PathTemplate` y `Namer` (contexto + plantilla → ruta).
//! - `asset`: `Asset` / `AssetWithPathAlts` (ruta + handler → read/write).
//! - `stage`: `StageHelper`, que compone lo anterior a partir de la
//!   configuración declarativa (`config`).
//!
//! El core no conoce formatos concretos; ver `cmb-handlers`.
pub mod asset;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod functions;
pub mod handler;
pub mod hashing;
pub mod logs;
pub mod naming;
pub mod stage;

pub use asset::{Asset, AssetRole, AssetWithPathAlts, PathCandidate};
pub use config::PipelineConfig;
pub use context::Context;
pub use errors::{CoreError, Operation};
pub use functions::FunctionRegistry;
pub use handler::{ArrayData, AssetData, AssetPayload, Handler, HandlerError, HandlerRegistry, Table};
pub use logs::write_stage_log;
pub use naming::{Namer, PathTemplate, TemplateError};
pub use stage::{SplitPlan, StageHelper};
