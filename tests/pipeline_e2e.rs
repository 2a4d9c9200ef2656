use std::fs;
use std::path::{Path, PathBuf};

use cmb_core::{Asset, AssetRole, CoreError, FunctionRegistry};
use cmb_handlers::{default_registry, SkyMap, SkyMapHandler};
use cmbml_rust::config::load_pipeline;
use cmbml_rust::stages::{stage_registry, PipelineRunner, StageFactory};
use cmbml_rust::AppError;

fn dummy_config(root: &Path) -> cmb_core::PipelineConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/dummy.yaml");
    load_pipeline(&path, Some(&root.display().to_string())).unwrap()
}

fn read_map(path: PathBuf) -> SkyMap {
    Asset::new("cmb_map", "test", AssetRole::In, path, "sky_map", std::sync::Arc::new(SkyMapHandler)).read_as()
                                                                                                    .unwrap()
}

#[test]
fn full_pipeline_writes_normalized_maps() {
    let dir = tempfile::tempdir().unwrap();
    let config = dummy_config(dir.path());
    let handlers = default_registry();

    let reports = PipelineRunner::new(&config, &handlers).run(None).unwrap();
    assert_eq!(reports.iter().map(|r| r.stage.as_str()).collect::<Vec<_>>(), vec!["make_sims", "preprocess"]);
    assert_eq!(reports[0].n_sims, 12);
    assert!(reports.iter().all(|r| r.log_path.as_ref().is_some_and(|p| p.is_file())));

    let data = dir.path().join("Dummy");
    assert!(data.join("Raw/Test/sim0003/sim_params.json").is_file());
    let norm: serde_json::Value = serde_json::from_str(&fs::read_to_string(data.join("Preprocessed/norm.json")).unwrap()).unwrap();
    assert_eq!(norm["method"], "zscore");
    assert_eq!(norm["fields"].as_array().unwrap().len(), 3);

    let mut field0 = Vec::new();
    for split in ["Train", "Test"] {
        for entry in fs::read_dir(data.join("Preprocessed").join(split)).unwrap() {
            let map = read_map(entry.unwrap().path().join("cmb_map.bin"));
            assert_eq!(map.nside(), 8);
            field0.extend(map.field(0).unwrap().iter().copied());
        }
    }
    assert_eq!(field0.len(), 12 * 768);
    let mean = field0.iter().sum::<f64>() / field0.len() as f64;
    let var = field0.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / field0.len() as f64;
    assert!(mean.abs() < 1e-9, "mean {mean}");
    assert!((var.sqrt() - 1.0).abs() < 1e-9, "std {}", var.sqrt());
}

#[test]
fn simulations_are_reproducible() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let handlers = default_registry();
    let only = vec!["make_sims".to_string()];
    for dir in [&a, &b] {
        let config = dummy_config(dir.path());
        PipelineRunner::new(&config, &handlers).run(Some(only.as_slice())).unwrap();
    }
    let rel = "Dummy/Raw/Train/sim0005/cmb_map.bin";
    assert_eq!(read_map(a.path().join(rel)), read_map(b.path().join(rel)));
    assert!(!a.path().join("Dummy/Preprocessed").exists());
}

#[test]
fn preprocess_falls_back_to_legacy_maps() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dummy_config(dir.path());
    for split in config.splits.values_mut() {
        split.n_sims = 1;
    }
    let handlers = default_registry();
    let legacy = dir.path().join("Dummy/Legacy");
    for split in ["Train", "Test"] {
        let map = SkyMap::from_fn(1, 2, |f, p| (f * 12 + p) as f64).unwrap();
        let path = legacy.join(split).join("sim0000.bin");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        Asset::new("cmb_map", "make_sims", AssetRole::Out, path, "sky_map", std::sync::Arc::new(SkyMapHandler)).write_payload(map)
                                                                                                               .unwrap();
    }

    let only = vec!["preprocess".to_string()];
    PipelineRunner::new(&config, &handlers).run(Some(only.as_slice())).unwrap();
    let out = read_map(dir.path().join("Dummy/Preprocessed/Train/sim0000/cmb_map.bin"));
    assert_eq!(out.n_fields(), 2);
    assert!(!dir.path().join("Dummy/Raw").exists());
}

#[test]
fn unknown_stage_factory_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = dummy_config(dir.path());
    let handlers = default_registry();
    let partial: FunctionRegistry<StageFactory> = FunctionRegistry::new("stage").with("make_sims", cmbml_rust::stages::make_sims::factory);

    let err = PipelineRunner::new(&config, &handlers).with_stages(partial).run(None).unwrap_err();
    assert!(matches!(err, AppError::Core(CoreError::UnknownFunction { ref name, .. }) if name == "preprocess"));
    assert!(!dir.path().join("Dummy").exists());
    assert_eq!(stage_registry().len(), 2);
}

#[test]
fn unknown_normalization_method_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dummy_config(dir.path());
    if let Some(stage) = config.pipeline.get_mut("preprocess") {
        stage.params.insert("method".into(), serde_json::json!("robust"));
    }
    let handlers = default_registry();
    let err = PipelineRunner::new(&config, &handlers).run(None).unwrap_err();
    assert!(matches!(err, AppError::Core(CoreError::UnknownFunction { kind: "normalization", .. })));
    assert!(!dir.path().join("Dummy").exists());
}

#[test]
fn selecting_an_undeclared_stage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dummy_config(dir.path());
    let handlers = default_registry();
    let only = vec!["train_unet".to_string()];
    let err = PipelineRunner::new(&config, &handlers).run(Some(only.as_slice())).unwrap_err();
    assert!(matches!(err, AppError::Core(CoreError::UnknownStage { .. })));
}
