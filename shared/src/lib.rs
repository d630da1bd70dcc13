//! Shared types and models for the weather forecast pipeline
//!
//! This crate contains the domain types shared between the pipeline core,
//! the HTTP API and the dashboard view models. Nothing here performs I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
