//! Resolución de rutas: plantillas (`PathTemplate`) y `Namer`.

pub mod namer;
pub mod template;

pub use namer::Namer;
pub use template::{PathTemplate, TemplateError};
