mod common;

use std::fs;

use cmb_core::{AssetPayload, CoreError, Handler, StageHelper};
use cmb_handlers::{default_registry, SkyMap, SkyMapHandler};

#[test]
fn falls_back_to_existing_alternate() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::pipeline(dir.path());
    let registry = default_registry();
    let helper = StageHelper::new(&config, "preprocess", &registry).unwrap();
    let ctx = helper.context().with_split("Train").with_sim(2);

    let asset = helper.get_asset_in_alts(&ctx, "obs_map").unwrap();
    let candidates: Vec<_> = asset.candidates().iter().map(|c| (c.path.clone(), c.is_primary)).collect();
    let primary = dir.path().join("Dummy/Raw/Train/sim0002/cmb_map.bin");
    let legacy = dir.path().join("legacy/Train/sim0002.bin");
    assert_eq!(candidates, vec![(primary.clone(), true), (legacy.clone(), false)]);

    let map = SkyMap::from_fn(1, 1, |_, p| p as f64).unwrap();
    fs::create_dir_all(legacy.parent().unwrap()).unwrap();
    SkyMapHandler.write(&legacy, &map.clone().into_data().unwrap()).unwrap();

    assert_eq!(asset.resolved_read_path(), Some(legacy.as_path()));
    assert_eq!(asset.read_as::<SkyMap>().unwrap(), map);
}

#[test]
fn writes_go_to_primary_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::pipeline(dir.path());
    let registry = default_registry();
    let helper = StageHelper::new(&config, "preprocess", &registry).unwrap();
    let ctx = helper.context().with_split("Train").with_sim(0);

    let asset = helper.get_asset_in_alts(&ctx, "obs_map").unwrap();
    asset.write_payload(SkyMap::from_fn(1, 1, |_, _| 1.0).unwrap()).unwrap();
    assert!(asset.primary_path().is_file());
    assert!(!dir.path().join("legacy").exists());
    assert_eq!(asset.resolved_read_path(), Some(asset.primary_path()));
}

#[test]
fn missing_everywhere_lists_all_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::pipeline(dir.path());
    let registry = default_registry();
    let helper = StageHelper::new(&config, "preprocess", &registry).unwrap();
    let ctx = helper.context().with_split("Train").with_sim(1);

    let err = helper.get_asset_in_alts(&ctx, "obs_map").unwrap().read().unwrap_err();
    match err {
        CoreError::NoCandidateFound { asset, stage, attempted } => {
            assert_eq!(asset, "obs_map");
            assert_eq!(stage, "preprocess");
            assert_eq!(attempted,
                       vec![dir.path().join("Dummy/Raw/Train/sim0001/cmb_map.bin"),
                            dir.path().join("legacy/Train/sim0001.bin")]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn alternates_with_mixed_handlers_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::pipeline(dir.path());
    if let Some(stage) = config.pipeline.get_mut("preprocess") {
        stage.assets_in["obs_map"].alternates[0].handler = Some("json".into());
    }
    let err = StageHelper::new(&config, "preprocess", &default_registry()).unwrap_err();
    assert!(matches!(err, CoreError::Config(ref msg) if msg.contains("mixes handlers")));
}
