//! Documentos JSON (configs de normalización, parámetros de simulación).

use std::fs;
use std::path::Path;

use cmb_core::{AssetData, Handler, HandlerError};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError> {
        let text = fs::read_to_string(path)?;
        let value = serde_json::from_str(&text).map_err(|e| HandlerError::Decode(e.to_string()))?;
        Ok(AssetData::Json(value))
    }

    fn write(&self, path: &Path, data: &AssetData) -> Result<(), HandlerError> {
        let text = serde_json::to_string_pretty(data.as_json()?).map_err(|e| HandlerError::Encode(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}
