//! Error types for the tabular ETL pipeline.
//!
//! Errors are grouped by the stage that raises them:
//!
//! - [`ExtractError`] - reading and parsing the input table
//! - [`SchemaError`] - loading or validating the column schema
//! - [`TransformError`] - fitting and applying the column transforms
//! - [`LoadError`] - writing the output table
//! - [`ArtifactError`] - saving or loading a fitted pipeline
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors while reading the input table.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input path does not exist.
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Failed to read file.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be decoded as text.
    #[error("Failed to decode input as {encoding}")]
    Encoding { encoding: String },

    /// The file is not a well-formed delimited table.
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: u64, message: String },

    /// Delimiter cannot be used with the CSV reader.
    #[error("Invalid delimiter {0:?}: must be a single ASCII character")]
    InvalidDelimiter(char),
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors while loading or validating a [`crate::schema::Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Failed to read the schema file.
    #[error("Failed to read schema: {0}")]
    Io(#[from] std::io::Error),

    /// Schema JSON is invalid.
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A column was given more than one role.
    #[error("Column '{column}' is declared as both {first} and {second}")]
    DuplicateRole {
        column: String,
        first: &'static str,
        second: &'static str,
    },

    /// No identifier column configured.
    #[error("Schema has no identifier column")]
    MissingIdentifier,
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while fitting or applying column transforms.
#[derive(Debug, Error)]
pub enum TransformError {
    /// No usable value to compute an imputation statistic from.
    #[error("Column '{column}' has no non-missing values to impute from")]
    AllValuesMissing { column: String },

    /// Required column is not in the table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Two output columns ended up with the same name.
    #[error("Output column name '{0}' is produced more than once")]
    ColumnCollision(String),

    /// A fitted statistic or a transformed value is NaN or infinite.
    #[error("Column '{column}' produces a value outside the finite range")]
    NonFinite { column: String },

    /// The table has a header but no data rows.
    #[error("Input has no data rows")]
    EmptyInput,

    /// `transform` called before `fit`.
    #[error("{0} used before fit")]
    NotFitted(&'static str),

    /// Column does not hold the kind of values the stage expects.
    #[error("Column '{column}' is not {expected}")]
    WrongKind {
        column: String,
        expected: &'static str,
    },
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while writing the output table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Output could not be created or persisted.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoder failed.
    #[error("Failed to encode output: {0}")]
    Serialize(#[from] csv::Error),
}

// =============================================================================
// Artifact Errors
// =============================================================================

/// Errors while saving or loading a fitted pipeline.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// IO error.
    #[error("Artifact IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`].
/// Each variant names the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extract: {0}")]
    Extract(#[from] ExtractError),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("transform: {0}")]
    Transform(#[from] TransformError),

    #[error("load: {0}")]
    Load(#[from] LoadError),

    #[error("artifact: {0}")]
    Artifact(#[from] ArtifactError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
