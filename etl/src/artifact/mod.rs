//! Fitted pipeline artifact.
//!
//! Everything learned from the data during a run (fill values, scaling
//! statistics, label sets) together with the schema it was fitted under.
//! Saved as JSON, it lets later batches be transformed exactly like the
//! one it was fitted on.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ArtifactResult;
use crate::schema::Schema;
use crate::transform::encode::OneHotEncoder;
use crate::transform::impute::Imputer;
use crate::transform::scale::Scaler;

/// Current artifact format version.
pub const ARTIFACT_VERSION: &str = "1.0";

fn default_version() -> String {
    ARTIFACT_VERSION.to_string()
}

/// Statistics and label sets learned from one input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedPipeline {
    /// Version of the artifact format
    #[serde(default = "default_version")]
    pub version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Schema the pipeline was fitted under
    pub schema: Schema,
    /// Input columns seen at fit time
    pub input_columns: Vec<String>,
    pub imputer: Imputer,
    pub scaler: Scaler,
    pub encoder: OneHotEncoder,
}

impl FittedPipeline {
    pub fn new(
        schema: Schema,
        input_columns: Vec<String>,
        imputer: Imputer,
        scaler: Scaler,
        encoder: OneHotEncoder,
    ) -> Self {
        Self {
            version: default_version(),
            created_at: Utc::now().to_rfc3339(),
            schema,
            input_columns,
            imputer,
            scaler,
            encoder,
        }
    }

    /// Columns a table must have for [`crate::transform::pipeline::apply`].
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.schema.identifier.as_str()];
        columns.extend(self.imputer.numeric_fills().iter().map(|f| f.column.as_str()));
        columns.extend(self.imputer.categorical_fills().iter().map(|f| f.column.as_str()));
        columns
    }

    /// Columns from [`FittedPipeline::required_columns`] missing in `headers`.
    pub fn missing_columns(&self, headers: &[&str]) -> Vec<String> {
        self.required_columns()
            .into_iter()
            .filter(|c| !headers.contains(c))
            .map(str::to_string)
            .collect()
    }

    pub fn to_json(&self) -> ArtifactResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ArtifactResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the artifact, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> ArtifactResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> ArtifactResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
