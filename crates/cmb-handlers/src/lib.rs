//! cmb-handlers: handlers de formato concretos para `cmb-core`.
//!
//! Este crate provee:
//! - `JsonHandler` / `YamlHandler`: documentos (`AssetData::Json`).
//! - `TextHandler`: texto plano.
//! - `BandTableHandler`: tabla de referencia por banda, sólo lectura.
//! - `SkyMapHandler`: mapas del cielo como arreglos, codificados con bincode,
//!   y el tipo fuerte `SkyMap` (ndarray) para las etapas.
//!
//! `register_defaults` registra todos bajo sus tags canónicos; se llama una
//! vez al arrancar el proceso.

pub mod band_table;
pub mod json;
pub mod sky_map;
pub mod text;
pub mod yaml;

use cmb_core::HandlerRegistry;

pub use band_table::BandTableHandler;
pub use json::JsonHandler;
pub use sky_map::{SkyMap, SkyMapHandler};
pub use text::TextHandler;
pub use yaml::YamlHandler;

pub const JSON: &str = "json";
pub const YAML: &str = "yaml";
pub const TEXT: &str = "text";
pub const BAND_TABLE: &str = "band_table";
pub const SKY_MAP: &str = "sky_map";

/// Registra los handlers de este crate en `registry`.
pub fn register_defaults(registry: &mut HandlerRegistry) {
    registry.register(JSON, JsonHandler);
    registry.register(YAML, YamlHandler);
    registry.register(TEXT, TextHandler);
    registry.register(BAND_TABLE, BandTableHandler);
    registry.register(SKY_MAP, SkyMapHandler);
}

/// Registro nuevo con los handlers por defecto.
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    register_defaults(&mut registry);
    registry
}
