use std::path::Path;

use curator::{config::{AppConfig, FallbackPolicy}, model::RetentionPolicy};

#[test]
fn bundled_config_parses_and_validates() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.yaml");
    let config = AppConfig::load_from_file(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(
        config.history.retention,
        RetentionPolicy::Count { max_entries: 36 }
    );
    assert_eq!(config.selection.platform_quota, 3);
    assert_eq!(config.selection.global_cap, 9);
    assert_eq!(config.selection.platforms[0], "腾讯娱乐");
    assert_eq!(config.ai.fallback, FallbackPolicy::Local);
    assert!(!config.ai.deepseek.has_api_key());
    assert_eq!(config.pipeline.category, "entertainment");
}
