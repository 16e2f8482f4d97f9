//! Plurigaussian facies truncation rules.
//!
//! A [`model::RuleStore`] owns the truncation rules of every zone/region
//! together with their polygons and facies groups. Rules are built and
//! edited through the operation structs in [`operations`], checked with
//! [`operations::query::Validate`], and simulated through the
//! [`simulation::Simulator`] boundary. Facies and Gaussian fields live in
//! external registries reached through the traits in [`registry`].

pub mod config;
pub mod error;
pub mod math;
pub mod model;
pub mod operations;
pub mod registry;
pub mod simulation;

pub use config::EngineConfig;
pub use error::{Result, TruncationError};
