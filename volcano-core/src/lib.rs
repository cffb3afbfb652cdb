//! Core library for the `volcano-aq` collector.
//!
//! This crate defines:
//! - Configuration (locations, parameters, endpoints, output path)
//! - Abstraction over the hourly data providers
//! - Merging and null-padding of provider responses
//! - The collector that runs every location and writes the JSON snapshot
//!
//! It is used by `volcano-cli`, but can also be reused by other binaries or services.

pub mod collector;
pub mod config;
pub mod error;
pub mod merge;
pub mod model;
pub mod output;
pub mod provider;

pub use collector::{Collector, RunSummary};
pub use config::{Config, ParameterSet};
pub use error::CollectError;
pub use model::{HourlySeries, Location, LocationResult, OutputLayout, RunOutput};
pub use provider::{HourlyProvider, OpenMeteoProvider, ProviderId};
