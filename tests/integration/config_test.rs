//! Configuration files shipped with the binary.

use std::io::Write;
use std::sync::Arc;

use kbnav_core::config::AppConfig;
use kbnav_gateway::{EntityGateway, GatewayManager};
use kbnav_tree::TreeStore;

#[test]
fn test_default_config_targets_http_gateway() {
    let config = AppConfig::load("config/default.toml").unwrap();

    assert_eq!(config.gateway.provider, "http");
    assert_eq!(config.gateway.base_url, "http://localhost:8000/api/v1");
    assert_eq!(config.tree.max_depth, 3);
    assert_eq!(config.tree.document_page_size, 20);
    assert!(config.tree.probe_on_load);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_demo_overlay_switches_to_fixture() {
    let config = AppConfig::load_with_env("config/default.toml", "demo").unwrap();

    assert_eq!(config.gateway.provider, "memory");
    assert_eq!(config.gateway.fixture_path.as_deref(), Some("config/fixture.json"));
    assert_eq!(config.tree.max_depth, 3);
}

#[test]
fn test_unknown_provider_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[gateway]\nprovider = \"ftp\"").unwrap();

    let config = AppConfig::load(path.to_str().unwrap()).unwrap();
    let err = GatewayManager::new(&config.gateway).unwrap_err();
    assert_eq!(err.kind, kbnav_core::ErrorKind::Configuration);
}

#[tokio::test]
async fn test_bundled_fixture_loads_into_store() {
    let config = AppConfig::load_with_env("config/default.toml", "demo").unwrap();
    let gateway = GatewayManager::new(&config.gateway).unwrap();
    assert_eq!(gateway.provider_type(), "memory");

    let store = TreeStore::new(Arc::new(gateway), &config.tree);
    assert_eq!(store.load_forest().await.unwrap(), 3);

    let forest = store.current_forest().await;
    let names: Vec<&str> = forest.roots().iter().map(|root| root.name()).collect();
    assert_eq!(names, vec!["Employee Handbook", "Security Policies", "Archive"]);
    assert!(forest.roots()[2].is_leaf());
    assert!(!forest.roots()[1].is_leaf());
}
