use ar_data_logger::config::{ConfigError, LoggerConfig, PointSchema};
use ar_data_logger::io::object_to_json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = LoggerConfig::default();
    assert_eq!(config.confidence_threshold, 0.5);
    assert_eq!(config.point_schema, PointSchema::Colored);
    assert_eq!(config.output_prefix, "R_ARCore");
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{"point_schema": "compact", "confidence_threshold": 0.7}"#).unwrap();
    let config = LoggerConfig::from_json_file(&path).unwrap();
    assert_eq!(config.point_schema, PointSchema::Compact);
    assert_eq!(config.confidence_threshold, 0.7);
    assert_eq!(config.far_clip, 100.0);
}

#[test]
fn test_config_json_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    let config = LoggerConfig {
        point_schema: PointSchema::Disabled,
        output_prefix: "R_test".to_string(),
        ..Default::default()
    };
    object_to_json(&path, &config).unwrap();
    assert_eq!(LoggerConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn test_invalid_configs() {
    let bad_threshold = LoggerConfig {
        confidence_threshold: 1.5,
        ..Default::default()
    };
    assert!(matches!(bad_threshold.validate(), Err(ConfigError::Invalid(_))));

    let bad_clip = LoggerConfig {
        near_clip: 10.0,
        far_clip: 1.0,
        ..Default::default()
    };
    assert!(matches!(bad_clip.validate(), Err(ConfigError::Invalid(_))));

    let bad_prefix = LoggerConfig {
        output_prefix: "a/b".to_string(),
        ..Default::default()
    };
    assert!(bad_prefix.validate().is_err());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(LoggerConfig::from_json_file(&path), Err(ConfigError::Io(_))));
}

#[test]
fn test_schema_flags() {
    assert!(PointSchema::Colored.samples_color());
    assert!(PointSchema::Colored.tracks_points());
    assert!(!PointSchema::Compact.samples_color());
    assert!(PointSchema::Compact.tracks_points());
    assert!(!PointSchema::Disabled.tracks_points());
}
