// Presets loaded from configuration and expanded per request

use super::test_harness::*;
use image::GenericImageView;
use shashin::config::Config;
use shashin::directive::DirectiveSet;
use shashin::plan::PlanResolver;
use tempfile::TempDir;

const PRESETS_YAML: &str = r#"
presets:
  t1: "q90"
  thumb: "rc50x50"
  brand: "wse-50-logo.png,fs"
"#;

fn resolver(extra_yaml: &str) -> PlanResolver {
    let yaml = format!(
        "storage:\n  backend: local\n  base_dir: /srv\n{}{}",
        PRESETS_YAML, extra_yaml
    );
    let config = Config::from_yaml_with_env(&yaml).unwrap();
    PlanResolver::new(config.preset_store().unwrap(), config.image.plan_settings())
}

#[test]
fn test_preset_sets_quality() {
    let plan = resolver("")
        .resolve(&DirectiveSet::decode("_t1/a.jpg").unwrap())
        .unwrap();
    assert_eq!(plan.quality, 90);
}

#[test]
fn test_presets_merge_in_reference_order() {
    let plan = resolver("")
        .resolve(&DirectiveSet::decode("wsw-x.png,_brand,_thumb/a.jpg").unwrap())
        .unwrap();

    assert_eq!(plan.watermarks.len(), 2);
    assert_eq!(plan.watermarks[0].asset_path, "x.png");
    assert_eq!(plan.watermarks[1].asset_path, "logo.png");
    assert_eq!(plan.watermarks[1].size_percent, 50);
    assert_eq!(plan.filters.len(), 1);
    assert!(plan.target.is_some());
}

#[test]
fn test_unknown_preset_fails() {
    let err = resolver("")
        .resolve(&DirectiveSet::decode("_missing/a.jpg").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), "unknown_preset");
}

#[test]
fn test_presets_only_rejects_raw_directives() {
    let resolver = resolver("image:\n  presets_only: true\n");
    assert!(resolver
        .resolve(&DirectiveSet::decode("_thumb/a.jpg").unwrap())
        .is_ok());
    assert!(resolver
        .resolve(&DirectiveSet::decode("n/a.jpg").unwrap())
        .is_ok());
    let err = resolver
        .resolve(&DirectiveSet::decode("r10x10/a.jpg").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), "grammar");
}

#[tokio::test]
async fn test_preset_request_end_to_end() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(200, 100));
    let handler = local_handler(&assets, PRESETS_YAML).await;

    let response = get(&handler, "/_thumb/a.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (50, 50));

    let response = get(&handler, "/_nope/a.jpg").await;
    assert_eq!(response.status, 500);
}
