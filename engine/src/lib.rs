//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the table engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod ops;
pub mod source;
pub mod table;
pub mod value;

// Re-export commonly used types at the crate root
pub use config::TableConfig;
pub use error::EngineError;
pub use evaluator::{EvalOutcome, Evaluator, ExternalFn, FunctionRegistry};
pub use ops::{compare_tables, sort_rows};
pub use source::RowSource;
pub use table::Table;
pub use value::{Value, SENTINEL};
