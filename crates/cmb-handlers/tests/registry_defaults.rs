use std::fs;

use cmb_core::{Asset, AssetRole, CoreError, Handler, Table};
use cmb_handlers::{default_registry, register_defaults, BandTableHandler, TextHandler, BAND_TABLE, JSON, SKY_MAP, TEXT, YAML};

#[test]
fn defaults_cover_every_tag() {
    let registry = default_registry();
    assert_eq!(registry.tags().collect::<Vec<_>>(), vec![JSON, YAML, TEXT, BAND_TABLE, SKY_MAP]);
    assert!(!registry.get(BAND_TABLE).unwrap().supports_write());
    assert!(registry.get(SKY_MAP).unwrap().supports_write());
}

#[test]
fn later_registration_replaces_earlier() {
    let mut registry = default_registry();
    let previous = registry.register(BAND_TABLE, TextHandler);
    assert!(previous.is_some());
    assert!(registry.get(BAND_TABLE).unwrap().supports_write());

    register_defaults(&mut registry);
    assert_eq!(registry.len(), 5);
    assert!(!registry.get(BAND_TABLE).unwrap().supports_write());
}

#[test]
fn band_table_reads_through_asset_and_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planck_bands.txt");
    fs::write(&path, "band center fwhm\n100 100 9.66\n217 217 5.01\n").unwrap();
    let asset = Asset::new("planck_bands", "make_sims", AssetRole::In, &path, BAND_TABLE, default_registry().get(BAND_TABLE).unwrap());

    let table: Table = asset.read_as().unwrap();
    assert_eq!(table.get_f64("217", "fwhm"), Some(5.01));

    let before = fs::read_to_string(&path).unwrap();
    let err = asset.write_payload(table).unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert!(BandTableHandler::parse(&before).is_ok());
}
