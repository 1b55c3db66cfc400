//! Tests for configuration validation

use std::time::Duration;

use mminte::config::{default_worker_count, WorkerPoolConfig, MAX_DEFAULT_WORKERS};

#[test]
fn test_default_config_is_valid() {
    let config = WorkerPoolConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.worker_count, default_worker_count());
    assert_eq!(config.thread_name_prefix, "mminte-worker");
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
}

#[test]
fn test_default_worker_count_is_capped() {
    let count = default_worker_count();
    assert!(count >= 1);
    assert!(count <= MAX_DEFAULT_WORKERS);
}

#[test]
fn test_invalid_worker_count() {
    let invalid = WorkerPoolConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_stack_size() {
    let invalid = WorkerPoolConfig::new().with_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_thread_name_prefix() {
    let invalid = WorkerPoolConfig::new().with_thread_name_prefix("");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_shutdown_timeout() {
    let invalid = WorkerPoolConfig::new().with_shutdown_timeout(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_optional_worker_count_override() {
    let base = WorkerPoolConfig::new().with_worker_count(3);
    assert_eq!(base.clone().with_optional_worker_count(None).worker_count, 3);
    assert_eq!(base.with_optional_worker_count(Some(7)).worker_count, 7);
}

#[test]
fn test_config_from_json() {
    let config =
        WorkerPoolConfig::from_json_str(r#"{ "worker_count": 2, "shutdown_timeout_ms": 500 }"#)
            .expect("Valid JSON config");
    assert_eq!(config.worker_count, 2);
    assert_eq!(config.shutdown_timeout(), Duration::from_millis(500));
    assert_eq!(config.thread_name_prefix, "mminte-worker");
}

#[test]
fn test_config_from_json_rejects_invalid_values() {
    assert!(WorkerPoolConfig::from_json_str(r#"{ "worker_count": 0 }"#).is_err());
    assert!(WorkerPoolConfig::from_json_str("not json").is_err());
}
