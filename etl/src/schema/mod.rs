//! Column schema: which input column plays which role.
//!
//! Roles are fixed ahead of time, never inferred from the data. A schema is
//! an immutable value handed to the pipeline entry point, so the same
//! pipeline runs unchanged over differently shaped tables.
//!
//! ```rust,ignore
//! let schema = Schema::new("Id")
//!     .with_passthrough(["EmployeeName"])
//!     .with_numeric(["BasePay", "Benefits"])
//!     .with_categorical(["JobTitle"])
//!     .with_excluded(["Notes"]);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};
use crate::transform::impute::{CategoricalStrategy, NumericStrategy};

/// Role of an input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identifier,
    Passthrough,
    Numeric,
    Categorical,
    Excluded,
}

impl ColumnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::Passthrough => "passthrough",
            ColumnRole::Numeric => "numeric",
            ColumnRole::Categorical => "categorical",
            ColumnRole::Excluded => "excluded",
        }
    }
}

/// Column roles and transform settings for one kind of input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Row identifier, copied unchanged to the first output column
    pub identifier: String,

    /// Text columns copied unchanged
    #[serde(default)]
    pub passthrough: Vec<String>,

    /// Columns parsed as numbers, imputed and standardized
    #[serde(default)]
    pub numeric: Vec<String>,

    /// Columns expanded into one indicator column per label
    #[serde(default)]
    pub categorical: Vec<String>,

    /// Columns removed before any transformation
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Output name prefix for numeric columns (`num` gives `num__BasePay`)
    #[serde(default)]
    pub numeric_prefix: Option<String>,

    /// Output name prefix for indicator columns (`cat` gives `cat__Dept_Fire`)
    #[serde(default)]
    pub categorical_prefix: Option<String>,

    /// Statistic used to fill missing numeric cells
    #[serde(default)]
    pub numeric_strategy: NumericStrategy,

    /// How empty categorical cells are handled
    #[serde(default)]
    pub categorical_strategy: CategoricalStrategy,
}

fn to_strings<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

impl Schema {
    /// Schema with only an identifier column.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            passthrough: Vec::new(),
            numeric: Vec::new(),
            categorical: Vec::new(),
            excluded: Vec::new(),
            numeric_prefix: None,
            categorical_prefix: None,
            numeric_strategy: NumericStrategy::default(),
            categorical_strategy: CategoricalStrategy::default(),
        }
    }

    pub fn with_passthrough<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passthrough = to_strings(names);
        self
    }

    pub fn with_numeric<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric = to_strings(names);
        self
    }

    pub fn with_categorical<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical = to_strings(names);
        self
    }

    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = to_strings(names);
        self
    }

    pub fn with_prefixes(mut self, numeric: Option<&str>, categorical: Option<&str>) -> Self {
        self.numeric_prefix = numeric.map(str::to_string);
        self.categorical_prefix = categorical.map(str::to_string);
        self
    }

    pub fn with_numeric_strategy(mut self, strategy: NumericStrategy) -> Self {
        self.numeric_strategy = strategy;
        self
    }

    pub fn with_categorical_strategy(mut self, strategy: CategoricalStrategy) -> Self {
        self.categorical_strategy = strategy;
        self
    }

    /// Role assigned to `column`, if any.
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.roles()
            .find(|(name, _)| *name == column)
            .map(|(_, role)| role)
    }

    fn roles(&self) -> impl Iterator<Item = (&str, ColumnRole)> {
        std::iter::once((self.identifier.as_str(), ColumnRole::Identifier))
            .chain(self.passthrough.iter().map(|c| (c.as_str(), ColumnRole::Passthrough)))
            .chain(self.numeric.iter().map(|c| (c.as_str(), ColumnRole::Numeric)))
            .chain(self.categorical.iter().map(|c| (c.as_str(), ColumnRole::Categorical)))
            .chain(self.excluded.iter().map(|c| (c.as_str(), ColumnRole::Excluded)))
    }

    /// Check that an identifier is set and no column holds two roles.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.identifier.is_empty() {
            return Err(SchemaError::MissingIdentifier);
        }

        let mut seen: Vec<(&str, ColumnRole)> = Vec::new();
        for (name, role) in self.roles() {
            if let Some((_, first)) = seen.iter().find(|(n, _)| *n == name) {
                // Listing a column twice under the same role is harmless
                if *first != role {
                    return Err(SchemaError::DuplicateRole {
                        column: name.to_string(),
                        first: first.as_str(),
                        second: role.as_str(),
                    });
                }
                continue;
            }
            seen.push((name, role));
        }

        Ok(())
    }

    /// Parse and validate a schema from JSON.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema file.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Schema for the San Francisco `Salaries.csv` public payroll dataset.
pub fn salaries_schema() -> Schema {
    Schema::new("Id")
        .with_passthrough(["EmployeeName"])
        .with_numeric([
            "BasePay",
            "OvertimePay",
            "OtherPay",
            "Benefits",
            "TotalPay",
            "TotalPayBenefits",
            "Year",
        ])
        .with_categorical(["JobTitle", "Agency"])
        .with_excluded(["Notes", "Status"])
        .with_prefixes(Some("num"), Some("cat"))
}
