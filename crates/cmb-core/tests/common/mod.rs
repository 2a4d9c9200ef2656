use std::path::Path;

use cmb_core::PipelineConfig;

/// Pipeline de dos etapas (simulación + preproceso) con raíz en `root`.
pub const PIPELINE_YAML: &str = r#"
dataset_name: Dummy
create_dirs: true
file_system:
  root_dir: "__ROOT__"
  sim_folder_prefix: sim
  sim_str_num_digits: 4
  structure: "{root}/{dataset_name}/{stage}/{split_name}/{sim_folder}"
splits:
  Train: { n_sims: 3 }
  Test: { n_sims: 2 }
pipeline:
  make_sims:
    dir_name: Raw
    splits: [train, test]
    assets_out:
      cmb_map: { handler: sky_map, path_template: "{structure}/cmb_map.bin" }
      sim_params: { handler: json, path_template: "{structure}/params.json" }
  preprocess:
    dir_name: Preprocessed
    splits: [train]
    make_stage_log: true
    params:
      method: minmax
    assets_in:
      cmb_map: { stage: make_sims }
      planck_bands: { handler: band_table, path_template: "{root}/bands.txt" }
      norm_file: { handler: json, path_template: "{root}/{dataset_name}/{stage}/norm.json" }
      obs_map:
        stage: make_sims
        orig_name: cmb_map
        alternates:
          - { handler: sky_map, path_template: "{root}/legacy/{split_name}/{sim_folder}.bin" }
    assets_out:
      norm_file: { handler: json, path_template: "{root}/{dataset_name}/{stage}/norm.json" }
      cmb_map: { handler: sky_map, path_template: "{structure}/cmb_map.bin" }
"#;

pub fn pipeline(root: &Path) -> PipelineConfig {
    let yaml = PIPELINE_YAML.replace("__ROOT__", &root.display().to_string());
    PipelineConfig::from_yaml_str(&yaml).expect("fixture config")
}
