//! FILENAME: breakdown-engine/src/lib.rs
//! Breakdown subsystem: the multi-level weighted pivot aggregator.
//!
//! This crate folds a table into one aggregated row per group, driven by
//! a declarative list of (column, aggregation, weights) specs. It depends
//! on `engine` only for shared types (Value, Table, RowSource).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the breakdown IS)
//! - `engine`: Calculation engine (HOW we calculate)
//! - `stats`: Post-processing statistics helpers

pub mod definition;
pub mod engine;
pub mod stats;

pub use definition::{AggregationType, ColumnSpec, WeightArg};
pub use self::engine::{calculate_breakdown, Breakdown, OrderedFloat};
pub use stats::{percentile, sample_variance, standard_error};
