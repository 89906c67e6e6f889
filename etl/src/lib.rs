//! # Tabular ETL - delimited file cleaning for downstream analysis
//!
//! Reads a delimited text file (payroll exports and the like), cleans and
//! normalizes its columns according to a [`Schema`], and writes a
//! model-ready delimited file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │  CSV File   │────▶│   Parser    │────▶│    Transform     │────▶│  CSV File   │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │ (impute, scale,  │     │ (atomic)    │
//! └─────────────┘     └─────────────┘     │  one-hot encode) │     └─────────────┘
//!                                         └────────┬─────────┘
//!                                                  ▼
//!                                         ┌──────────────────┐
//!                                         │ Fitted pipeline  │
//!                                         │     (JSON)       │
//!                                         └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabular_etl::{run, salaries_schema, RunOptions};
//! use std::path::Path;
//!
//! fn main() {
//!     let report = run(
//!         Path::new("Salaries.csv"),
//!         Path::new("processed_salaries_data.csv"),
//!         &salaries_schema(),
//!         &RunOptions::default(),
//!     )
//!     .unwrap();
//!     println!("Wrote {} rows", report.rows_out);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Timestamped log lines and stage notices
//! - [`table`] - Column-oriented in-memory table
//! - [`schema`] - Column roles and options
//! - [`parser`] - Delimited text parsing with auto-detection
//! - [`transform`] - Column stages and the pipeline
//! - [`writer`] - Atomic delimited output
//! - [`artifact`] - Fitted pipeline persistence

// Core modules
pub mod error;
pub mod logs;
pub mod table;

// Configuration
pub mod schema;

// Extract
pub mod parser;

// Transformation
pub mod transform;

// Load
pub mod artifact;
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArtifactError, ExtractError, LoadError, PipelineError, PipelineResult, SchemaError,
    TransformError,
};

// =============================================================================
// Re-exports - Table and schema
// =============================================================================

pub use schema::{salaries_schema, ColumnRole, Schema};
pub use table::{Column, Table, Values};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_table, read_table,
    ParsedTable,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    apply, fit_transform, run, CategoricalStrategy, Imputer, NumericStrategy, OneHotEncoder,
    RunOptions, RunReport, Scaler, Transformed,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use artifact::FittedPipeline;
pub use writer::{to_delimited_string, write_table};

// =============================================================================
// Re-exports - Logs
// =============================================================================

pub use logs::{log_error, log_info, log_success, log_warning, Stage, StageNotice, LOG_BROADCASTER};
