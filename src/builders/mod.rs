//! Builders to construct the specialized pools from configuration.

pub mod pool_builder;

pub use pool_builder::{create_model_pool, growth_rate_pool};
