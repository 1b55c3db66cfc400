//! Tests for utility modules

use mminte::util::init_tracing;

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing("mminte=debug");
    init_tracing("mminte=info");
    tracing::info!("tracing initialized twice without panicking");
}
