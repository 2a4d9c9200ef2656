//! YAML sobre el mismo modelo de datos que JSON; se usa para snapshots de
//! configuración en los logs de etapa.

use std::fs;
use std::path::Path;

use cmb_core::{AssetData, Handler, HandlerError};

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlHandler;

impl Handler for YamlHandler {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError> {
        let text = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_yaml::from_str(&text).map_err(|e| HandlerError::Decode(e.to_string()))?;
        Ok(AssetData::Json(value))
    }

    fn write(&self, path: &Path, data: &AssetData) -> Result<(), HandlerError> {
        let text = serde_yaml::to_string(data.as_json()?).map_err(|e| HandlerError::Encode(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}
