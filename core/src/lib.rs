//! Debt-collection case allocation core.
//!
//! Scores overdue cases with a random-forest recovery classifier and
//! routes each one to a collection agency by region, likelihood and
//! agency attributes.

pub mod aggregation;
pub mod assignment;
pub mod bundle;
pub mod case;
pub mod case_generator;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod label_heuristic;
pub mod metrics;
pub mod pipeline;
pub mod random_forest;
pub mod rng;
pub mod roster;
pub mod types;
