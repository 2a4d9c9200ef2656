use std::path::PathBuf;

use cmb_core::config::FileSystemConfig;
use cmb_core::{Context, Namer, PathTemplate, TemplateError};

#[test]
fn relative_structure_without_root() {
    let fs = FileSystemConfig { structure: Some("{dataset_name}/Raw/{split_name}/{sim_folder}".into()),
                                ..FileSystemConfig::default() };
    let namer = Namer::new(&fs).unwrap();
    let ctx = Context::new("Dummy", "make_sims").with_split("Train").with_sim(3);
    assert_eq!(namer.resolve_str("{structure}", &ctx).unwrap(), PathBuf::from("Dummy/Raw/Train/sim0003"));
}

#[test]
fn resolution_is_pure() {
    let fs = FileSystemConfig { root_dir: Some("/nonexistent/cmb".into()), ..FileSystemConfig::default() };
    let namer = Namer::new(&fs).unwrap();
    let template = PathTemplate::parse("{root}/{dataset_name}/{split_name}/{sim_folder}/map_{det}.bin").unwrap();
    let ctx = Context::new("Dummy", "make_sims").with_split("Test").with_sim(42).with_detector("143");

    let first = namer.resolve(&template, &ctx).unwrap();
    let second = namer.resolve(&template, &ctx).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, PathBuf::from("/nonexistent/cmb/Dummy/Test/sim0042/map_143.bin"));
    assert!(!PathBuf::from("/nonexistent/cmb").exists());
}

#[test]
fn missing_context_value_is_reported_by_name() {
    let namer = Namer::new(&FileSystemConfig::default()).unwrap();
    let ctx = Context::new("Dummy", "make_sims").with_split("Train");
    let err = namer.resolve_str("{dataset_name}/{split_name}/{sim_folder}", &ctx).unwrap_err();
    assert!(matches!(err, TemplateError::Unresolved { ref field, .. } if field == "sim_folder"));
}
