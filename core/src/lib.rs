//! Customer retention planning: ledger + roster in, ROI-ranked
//! retention action plan out.
//!
//! Entry point is [`pipeline::RetentionPipeline`]. The synthetic
//! [`generator::DatasetGenerator`] produces input tables for demos
//! and tests.

pub mod action_plan;
pub mod config;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod metrics;
pub mod pipeline;
pub mod recommendations;
pub mod risk_factors;
pub mod rng;
pub mod stats;
pub mod summary;
pub mod types;
