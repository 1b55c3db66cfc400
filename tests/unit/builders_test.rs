//! Tests for builder modules

use mminte::builders::{create_model_pool, growth_rate_pool};
use mminte::config::WorkerPoolConfig;
use mminte::core::PoolError;

#[test]
fn test_create_model_pool_binds_output_folder() {
    let config = WorkerPoolConfig::new().with_worker_count(2);
    let pool = create_model_pool("out/pairs", &config).expect("Valid pool");

    assert_eq!(pool.worker_count(), 2);
    assert_eq!(pool.executor().output_folder().to_str(), Some("out/pairs"));
    assert!(!pool.is_running());
}

#[test]
fn test_growth_rate_pool_binds_medium() {
    let config = WorkerPoolConfig::new().with_worker_count(1);
    let pool = growth_rate_pool("media/western.json", &config).expect("Valid pool");

    assert_eq!(pool.worker_count(), 1);
    assert_eq!(
        pool.executor().medium_file().to_str(),
        Some("media/western.json")
    );
}

#[test]
fn test_growth_rate_pool_does_not_read_medium() {
    // A missing medium fails jobs, not construction
    let config = WorkerPoolConfig::new().with_worker_count(1);
    assert!(growth_rate_pool("does/not/exist.json", &config).is_ok());
}

#[test]
fn test_builders_reject_invalid_config() {
    let config = WorkerPoolConfig::new().with_worker_count(0);
    assert!(matches!(
        create_model_pool("out", &config),
        Err(PoolError::InvalidConfig(_))
    ));
    assert!(matches!(
        growth_rate_pool("western.json", &config),
        Err(PoolError::InvalidConfig(_))
    ));
}
