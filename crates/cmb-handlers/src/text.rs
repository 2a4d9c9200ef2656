use std::fs;
use std::path::Path;

use cmb_core::{AssetData, Handler, HandlerError};

/// Texto plano UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextHandler;

impl Handler for TextHandler {
    fn read(&self, path: &Path) -> Result<AssetData, HandlerError> {
        Ok(AssetData::Text(fs::read_to_string(path)?))
    }

    fn write(&self, path: &Path, data: &AssetData) -> Result<(), HandlerError> {
        fs::write(path, data.as_text()?)?;
        Ok(())
    }
}
