//! FILENAME: join-engine/src/lib.rs
//! Join subsystem: combines two tables into one.
//!
//! This crate provides the two join algorithms as a standalone module,
//! separate from the core table engine. It depends on `engine` for shared
//! types (Value, Table, RowSource) and on `breakdown-engine` for the
//! column specs that drive interval proration.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the join IS)
//! - `key`: Equality join on a key column or row ordinals
//! - `interval`: Sweep-line join of range-tagged tables

pub mod definition;
pub mod interval;
pub mod key;

pub use definition::{IntervalJoinSpec, JoinMode, KeyJoinSpec};
pub use interval::interval_join;
pub use key::key_join;
