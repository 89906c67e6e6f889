//! Transformation module.
//!
//! Column-level stages, applied in this order by the pipeline:
//! - Exclude: drop configured columns
//! - Numeric: strip formatting and convert to numbers
//! - Impute: fill missing values
//! - Scale: standardize numeric columns
//! - Encode: one-hot encode categorical columns
//! - Assemble: order the output columns
//! - Pipeline: extract, transform and load end to end

pub mod assemble;
pub mod encode;
pub mod exclude;
pub mod impute;
pub mod numeric;
pub mod pipeline;
pub mod scale;

pub use assemble::{assemble, Assembly};
pub use encode::{indicator_name, Levels, OneHotEncoder};
pub use exclude::exclude_columns;
pub use impute::{CategoricalStrategy, Imputer, NumericStrategy};
pub use numeric::{normalize_numeric, parse_numeric};
pub use pipeline::*;
pub use scale::{ScaleParams, Scaler};
