//! Community models and growth-rate computation run by the worker pools.

pub mod growth;
pub mod model;
pub mod table;

pub use growth::{growth_alone, growth_together, relative_change, GrowthRateRecord, InteractionType};
pub use model::{check_extension, CommunityModel, Medium, SpeciesModel, Uptake, MODEL_EXTENSION};
pub use table::{GrowthRateTable, GROWTH_RATE_COLUMNS};
