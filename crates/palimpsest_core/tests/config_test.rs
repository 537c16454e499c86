use palimpsest_core::{StoreConfig, StoreConfigBuilder};
use std::io::Write;

#[test]
fn test_default_config_values() {
    let config = StoreConfig::default();
    assert_eq!(*config.snapshot_interval(), 10);
    assert_eq!(*config.agent_memory_limit(), 80);
    assert_eq!(config.default_branch(), "main");
    assert_eq!(*config.history_limit(), 50);
    assert_eq!(*config.gc_retention_days(), 30);
    assert!(config.validate().is_ok());
}

#[test]
fn test_snapshot_cadence() {
    let config = StoreConfig::default();
    assert!(!config.should_create_snapshot(0));
    assert!(!config.should_create_snapshot(-10));
    assert!(!config.should_create_snapshot(9));
    assert!(config.should_create_snapshot(10));
    assert!(!config.should_create_snapshot(11));
    assert!(config.should_create_snapshot(40));
}

#[test]
fn test_builder_and_setters() {
    let built = StoreConfigBuilder::default()
        .snapshot_interval(3)
        .default_branch("trunk")
        .build()
        .unwrap();
    assert_eq!(*built.snapshot_interval(), 3);
    assert_eq!(built.default_branch(), "trunk");
    assert_eq!(*built.agent_memory_limit(), 80);

    let set = StoreConfig::default().with_agent_memory_limit(5);
    assert_eq!(*set.agent_memory_limit(), 5);
}

#[test]
fn test_validate_rejects_bad_values() {
    assert!(StoreConfig::default().with_snapshot_interval(0).validate().is_err());
    assert!(StoreConfig::default().with_agent_memory_limit(0).validate().is_err());
    assert!(StoreConfig::default().with_default_branch(" ").validate().is_err());
    assert!(StoreConfig::default().with_gc_retention_days(-1).validate().is_err());
}

#[test]
fn test_from_file_fills_missing_keys_with_defaults() {
    let dir = std::env::temp_dir().join(format!("palimpsest-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("store.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "snapshot_interval = 25").unwrap();

    let config = StoreConfig::from_file(&path).unwrap();
    assert_eq!(*config.snapshot_interval(), 25);
    assert_eq!(*config.agent_memory_limit(), 80);

    std::fs::remove_dir_all(&dir).unwrap();
}
