//! Logs de etapa: snapshot de la configuración efectiva.
//!
//! Si la etapa declara `make_stage_log: true`, antes de trabajar se escribe la
//! configuración completa en `file_system.log_template` (por defecto
//! `{root}/{dataset_name}/Logs/{stage}`), en un archivo con timestamp y
//! fingerprint corto, a través del handler `yaml` del registro. El directorio
//! sigue la misma regla que cualquier salida: sólo se crea con `create_dirs`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::info;

use crate::asset::{Asset, AssetRole};
use crate::constants::{DEFAULT_LOG_TEMPLATE, STAGE_LOG_ASSET, STAGE_LOG_HANDLER};
use crate::errors::CoreError;
use crate::handler::AssetData;
use crate::stage::StageHelper;

/// Escribe el log de la etapa si está habilitado y devuelve su ruta.
pub fn write_stage_log(helper: &StageHelper<'_>, now: DateTime<Utc>) -> Result<Option<PathBuf>, CoreError> {
    if !helper.stage_config().make_stage_log {
        return Ok(None);
    }
    let config = helper.config();
    let template = config.file_system.log_template.as_deref().unwrap_or(DEFAULT_LOG_TEMPLATE);
    let dir = helper.namer()
                    .resolve_str(template, &helper.context())
                    .map_err(|source| CoreError::Template { stage: helper.stage_name().to_string(),
                                                            asset: STAGE_LOG_ASSET.to_string(),
                                                            source })?;
    let fingerprint = config.fingerprint()?;
    let file_name = format!("{}_{}_{}.yaml", helper.stage_name(), now.format("%Y%m%d-%H%M%S"), &fingerprint[..8]);
    let path = dir.join(file_name);

    let handler = helper.handler(helper.stage_name(), STAGE_LOG_ASSET, STAGE_LOG_HANDLER)?;
    let snapshot = serde_json::json!({
        "stage": helper.stage_name(),
        "written_at": now.to_rfc3339(),
        "fingerprint": fingerprint,
        "config": serde_json::to_value(config).map_err(|e| CoreError::Config(format!("cannot serialize config: {e}")))?,
    });
    let asset = Asset::new(STAGE_LOG_ASSET, helper.stage_name(), AssetRole::Out, &path, STAGE_LOG_HANDLER, handler).with_create_dirs(config.create_dirs);
    asset.write(&AssetData::Json(snapshot))?;
    info!("stage '{}' config logged to {}", helper.stage_name(), path.display());
    Ok(Some(path))
}
