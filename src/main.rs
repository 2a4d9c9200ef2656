use std::process::ExitCode;

use cmbml_rust::config::AppConfig;
use cmbml_rust::stages::PipelineRunner;
use cmbml_rust::{logging, AppError};
use tracing::{error, info};

fn run() -> Result<(), AppError> {
    logging::init()?;
    let app = AppConfig::global()?;
    let pipeline = app.load_pipeline()?;
    let handlers = cmb_handlers::default_registry();

    let runner = PipelineRunner::new(&pipeline, &handlers);
    info!(run_id = %runner.run_id(), config = %app.config_path.display(), dataset = %pipeline.dataset_name, "starting pipeline");
    let reports = runner.run(app.stages.as_deref())?;
    for report in &reports {
        info!(stage = %report.stage, n_sims = report.n_sims, log = ?report.log_path, "done");
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("cmbml: {e}");
            ExitCode::FAILURE
        }
    }
}
