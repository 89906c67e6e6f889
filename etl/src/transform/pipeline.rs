//! High-level pipeline API: extract, transform, load.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabular_etl::{run, salaries_schema, RunOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = run(
//!         Path::new("Salaries.csv"),
//!         Path::new("processed_salaries_data.csv"),
//!         &salaries_schema(),
//!         &RunOptions::default(),
//!     )?;
//!
//!     println!("Wrote {} rows x {} columns", report.rows_out, report.columns_out);
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::assemble::assemble;
use super::encode::OneHotEncoder;
use super::exclude::{dropped_columns, exclude_columns};
use super::impute::Imputer;
use super::numeric::normalize_numeric;
use super::scale::Scaler;
use crate::artifact::FittedPipeline;
use crate::error::{PipelineResult, TransformError};
use crate::logs::{
    log_info, log_info_indent, log_stage, log_success, log_warning, Stage, StageNotice,
};
use crate::parser::{delimiter_byte, read_table, ParsedTable};
use crate::schema::{ColumnRole, Schema};
use crate::table::Table;
use crate::writer::write_table;

/// Options for [`run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Input delimiter; detected from the header line when `None`
    pub delimiter: Option<char>,

    /// Apply this fitted artifact instead of fitting on the input
    pub fitted: Option<PathBuf>,

    /// Save the fitted artifact here after a successful run
    pub save_fitted: Option<PathBuf>,
}

/// Input file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputInfo {
    pub path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl InputInfo {
    fn new(path: &Path, parsed: &ParsedTable) -> Self {
        Self {
            path: path.to_path_buf(),
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers().into_iter().map(str::to_string).collect(),
            row_count: parsed.row_count(),
        }
    }
}

/// Output of the transform stages.
#[derive(Debug, Clone)]
pub struct Transformed {
    /// Assembled output table
    pub table: Table,
    /// What was learned from the input, or the artifact that was applied
    pub fitted: FittedPipeline,
    /// One notice per stage, in order
    pub notices: Vec<StageNotice>,
    /// Input columns with no role, left out of the output
    pub unassigned: Vec<String>,
}

/// Summary of a complete run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub input: InputInfo,
    pub output: PathBuf,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_in: usize,
    pub columns_out: usize,
    pub notices: Vec<StageNotice>,
    /// Numeric columns written unscaled
    pub degenerate_columns: Vec<String>,
    pub unassigned_columns: Vec<String>,
    /// Fitted or applied pipeline
    pub fitted: FittedPipeline,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Run extract, transform and load end to end.
///
/// With [`RunOptions::fitted`] set, the stored artifact is applied and
/// `schema` is ignored in favour of the artifact's own schema. Any error
/// aborts the run; the output file is only replaced once the whole table
/// has been written.
pub fn run(
    input: &Path,
    output: &Path,
    schema: &Schema,
    options: &RunOptions,
) -> PipelineResult<RunReport> {
    let started_at = Utc::now();
    log_info(format!("Starting ETL pipeline for {}...", input.display()));

    // 1. Extract
    log_info(format!("Extracting data from {}...", input.display()));
    let parsed = read_table(input, options.delimiter)?;
    let extract = log_stage(Stage::Extract, (0, 0), parsed.table.shape());
    log_success(format!(
        "Data extracted successfully. Initial shape: ({}, {})",
        parsed.row_count(),
        parsed.table.column_count()
    ));
    log_info(format!(
        "Encoding: {}, delimiter: '{}'",
        parsed.encoding,
        format_delimiter(parsed.delimiter)
    ));
    log_missing_counts(&parsed);

    // 2. Transform
    let transformed = match &options.fitted {
        Some(path) => {
            log_info(format!("Applying fitted pipeline from {}", path.display()));
            let fitted = FittedPipeline::load(path)?;
            apply(&parsed.table, &fitted)?
        }
        None => fit_transform(&parsed.table, schema)?,
    };
    log_success(format!(
        "Data transformed successfully. New shape: ({}, {})",
        transformed.table.row_count(),
        transformed.table.column_count()
    ));

    // 3. Load
    log_info(format!("Loading processed data to {}...", output.display()));
    write_table(&transformed.table, output, delimiter_byte(parsed.delimiter)?)?;
    let load = log_stage(
        Stage::Load,
        transformed.table.shape(),
        transformed.table.shape(),
    );
    log_success("Processed data loaded successfully.");

    if let Some(path) = &options.save_fitted {
        transformed.fitted.save(path)?;
        log_success(format!("Fitted pipeline saved to {}", path.display()));
    }

    let mut notices = Vec::with_capacity(transformed.notices.len() + 2);
    notices.push(extract);
    notices.extend(transformed.notices);
    notices.push(load);

    log_success("ETL pipeline completed.");

    Ok(RunReport {
        input: InputInfo::new(input, &parsed),
        output: output.to_path_buf(),
        rows_in: parsed.row_count(),
        rows_out: transformed.table.row_count(),
        columns_in: parsed.table.column_count(),
        columns_out: transformed.table.column_count(),
        notices,
        degenerate_columns: transformed
            .fitted
            .scaler
            .degenerate_columns()
            .into_iter()
            .map(str::to_string)
            .collect(),
        unassigned_columns: transformed.unassigned,
        fitted: transformed.fitted,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Fit every stage on `raw` and transform it in the same pass.
pub fn fit_transform(raw: &Table, schema: &Schema) -> PipelineResult<Transformed> {
    execute(raw, schema, Mode::Fit)
}

/// Transform `raw` with statistics and label sets fitted earlier.
pub fn apply(raw: &Table, fitted: &FittedPipeline) -> PipelineResult<Transformed> {
    let missing = fitted.missing_columns(&raw.headers());
    if let Some(column) = missing.into_iter().next() {
        return Err(TransformError::MissingColumn(column).into());
    }
    execute(raw, &fitted.schema, Mode::Apply(fitted))
}

#[derive(Clone, Copy)]
enum Mode<'a> {
    Fit,
    Apply(&'a FittedPipeline),
}

fn execute(raw: &Table, schema: &Schema, mode: Mode<'_>) -> PipelineResult<Transformed> {
    schema.validate()?;
    check_input(raw, schema, mode)?;

    let mut notices = Vec::with_capacity(6);

    // Exclude
    let dropped: Vec<String> = dropped_columns(raw, &schema.excluded)
        .into_iter()
        .map(str::to_string)
        .collect();
    let excluded = exclude_columns(raw, &schema.excluded);
    if dropped.is_empty() {
        log_info("No predefined excluded columns found.");
    } else {
        log_info(format!("Dropped excluded columns: {}", dropped.join(", ")));
    }
    notices.push(log_stage(Stage::Exclude, raw.shape(), excluded.shape()));

    // Normalize
    let normalized = normalize_numeric(&excluded, &schema.numeric)?;
    for column in normalized.columns() {
        if schema.numeric.contains(&column.name) {
            log_info_indent(
                format!(
                    "'{}' converted to numeric ({} missing)",
                    column.name,
                    column.values.missing_count()
                ),
                1,
            );
        }
    }
    notices.push(log_stage(Stage::Normalize, excluded.shape(), normalized.shape()));

    // Impute
    let imputer = match mode {
        Mode::Fit => {
            let mut imputer = Imputer::new(schema.numeric_strategy, schema.categorical_strategy);
            imputer.fit(&normalized, &schema.numeric, &schema.categorical)?;
            imputer
        }
        Mode::Apply(fitted) => fitted.imputer.clone(),
    };
    let imputed = imputer.transform(&normalized)?;
    for fill in imputer.numeric_fills().iter().filter(|f| f.missing > 0) {
        log_info_indent(
            format!("'{}': {} missing filled with {}", fill.column, fill.missing, fill.value),
            1,
        );
    }
    for fill in imputer.categorical_fills().iter().filter(|f| f.missing > 0) {
        if let Some(ref value) = fill.value {
            log_info_indent(
                format!("'{}': {} empty filled with '{}'", fill.column, fill.missing, value),
                1,
            );
        }
    }
    notices.push(log_stage(Stage::Impute, normalized.shape(), imputed.shape()));

    // Scale
    let scaler = match mode {
        Mode::Fit => {
            let mut scaler = Scaler::new();
            scaler.fit(&imputed, &schema.numeric)?;
            scaler
        }
        Mode::Apply(fitted) => fitted.scaler.clone(),
    };
    let scaled = scaler.transform(&imputed)?;
    for column in scaler.degenerate_columns() {
        log_warning(format!("'{}': degenerate column: scaling skipped", column));
    }
    notices.push(log_stage(Stage::Scale, imputed.shape(), scaled.shape()));

    // Encode
    let encoder = match mode {
        Mode::Fit => {
            let mut encoder = OneHotEncoder::new(schema.categorical_prefix.clone());
            encoder.fit(&scaled, &schema.categorical)?;
            encoder
        }
        Mode::Apply(fitted) => fitted.encoder.clone(),
    };
    let encoded = encoder.transform(&scaled)?;
    for levels in encoder.levels() {
        log_info_indent(
            format!("'{}': {} indicator columns", levels.column, levels.labels.len()),
            1,
        );
    }
    notices.push(log_stage(Stage::Encode, scaled.shape(), encoded.shape()));

    // Assemble
    let assembly = assemble(&encoded, schema, &encoder)?;
    if !assembly.unassigned.is_empty() {
        log_warning(format!(
            "Columns with no role left out: {}",
            assembly.unassigned.join(", ")
        ));
    }
    notices.push(log_stage(Stage::Assemble, encoded.shape(), assembly.table.shape()));

    let fitted = match mode {
        Mode::Fit => FittedPipeline::new(
            schema.clone(),
            raw.headers().into_iter().map(str::to_string).collect(),
            imputer,
            scaler,
            encoder,
        ),
        Mode::Apply(fitted) => fitted.clone(),
    };

    Ok(Transformed {
        table: assembly.table,
        fitted,
        notices,
        unassigned: assembly.unassigned,
    })
}

/// Fail early on problems that would make the run meaningless.
fn check_input(raw: &Table, schema: &Schema, mode: Mode<'_>) -> PipelineResult<()> {
    if !raw.contains(&schema.identifier) {
        return Err(TransformError::MissingColumn(schema.identifier.clone()).into());
    }

    if matches!(mode, Mode::Fit) && raw.row_count() == 0 {
        return Err(TransformError::EmptyInput.into());
    }

    let declared = [
        (ColumnRole::Passthrough, &schema.passthrough),
        (ColumnRole::Numeric, &schema.numeric),
        (ColumnRole::Categorical, &schema.categorical),
    ];
    for (role, names) in declared {
        for name in names.iter().filter(|n| !raw.contains(n)) {
            log_warning(format!(
                "Declared {} column '{}' not found, skipped",
                role.as_str(),
                name
            ));
        }
    }

    Ok(())
}

fn log_missing_counts(parsed: &ParsedTable) {
    let missing: Vec<(&str, usize)> = parsed
        .missing_counts()
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .collect();

    if missing.is_empty() {
        log_info("No empty cells in input.");
        return;
    }
    log_info("Empty cells per column:");
    for (column, count) in missing {
        log_info_indent(format!("{}: {}", column, count), 1);
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::parser::parse_table;

    fn payroll() -> Table {
        parse_table(
            "Id,EmployeeName,JobTitle,BasePay,Benefits,Year,Notes\n\
             1,ALICE,Fire,$100.00,10,2014,\n\
             2,BOB,Police,,20,2014,\n\
             3,CAROL,Fire,$300.00,,2014,\n",
            ',',
        )
        .unwrap()
    }

    fn schema() -> Schema {
        Schema::new("Id")
            .with_passthrough(["EmployeeName"])
            .with_numeric(["BasePay", "Benefits", "Year"])
            .with_categorical(["JobTitle"])
            .with_excluded(["Notes", "Status"])
    }

    #[test]
    fn test_fit_transform_layout() {
        let out = fit_transform(&payroll(), &schema()).unwrap();

        assert_eq!(
            out.table.headers(),
            vec![
                "Id",
                "EmployeeName",
                "BasePay",
                "Benefits",
                "Year",
                "JobTitle_Fire",
                "JobTitle_Police"
            ]
        );
        assert_eq!(out.table.row_count(), 3);
        assert!(out.unassigned.is_empty());
        assert_eq!(out.notices.len(), 6);
        assert_eq!(out.notices[0].stage, Stage::Exclude);
        assert_eq!(out.notices[5].stage, Stage::Assemble);
    }

    #[test]
    fn test_base_pay_is_imputed_then_standardized() {
        let out = fit_transform(&payroll(), &schema()).unwrap();
        let fills = out.fitted.imputer.numeric_fills();
        assert_eq!(fills[0].column, "BasePay");
        assert_eq!(fills[0].value, 200.0);

        let pay = out.table.column("BasePay").unwrap().as_numeric().unwrap();
        let sum: f64 = pay.iter().flatten().sum();
        assert!(sum.abs() < 1e-12);
        assert_eq!(pay[1], Some(0.0));
    }

    #[test]
    fn test_degenerate_year_unchanged() {
        let out = fit_transform(&payroll(), &schema()).unwrap();
        assert_eq!(out.fitted.scaler.degenerate_columns(), vec!["Year"]);
        assert_eq!(
            out.table.column("Year").unwrap().as_numeric().unwrap(),
            &[Some(2014.0); 3]
        );
    }

    #[test]
    fn test_all_missing_numeric_is_fatal() {
        let raw = parse_table("Id,Benefits\n1,\n2,Not Provided\n", ',').unwrap();
        let schema = Schema::new("Id").with_numeric(["Benefits"]);
        let err = fit_transform(&raw, &schema).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::AllValuesMissing { ref column })
                if column == "Benefits"
        ));
    }

    #[test]
    fn test_huge_finite_values_stay_finite() {
        let raw = parse_table("Id,Pay\n1,1.7e308\n2,1.6e308\n3,\n", ',').unwrap();
        let schema = Schema::new("Id").with_numeric(["Pay"]);
        let out = fit_transform(&raw, &schema).unwrap();

        assert!(out.fitted.scaler.degenerate_columns().is_empty());
        let pay = out.table.column("Pay").unwrap().as_numeric().unwrap();
        assert!(pay.iter().all(|v| v.map_or(false, f64::is_finite)));
        assert!(pay[2].unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let raw = parse_table("Id,BasePay\n", ',').unwrap();
        let schema = Schema::new("Id").with_numeric(["BasePay"]);
        assert!(matches!(
            fit_transform(&raw, &schema),
            Err(PipelineError::Transform(TransformError::EmptyInput))
        ));
    }

    #[test]
    fn test_missing_identifier_is_fatal() {
        let schema = Schema::new("EmployeeId");
        assert!(matches!(
            fit_transform(&payroll(), &schema),
            Err(PipelineError::Transform(TransformError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let schema = schema().with_categorical(["BasePay"]);
        assert!(matches!(
            fit_transform(&payroll(), &schema),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_unassigned_columns_are_dropped() {
        let schema = Schema::new("Id").with_numeric(["BasePay"]);
        let out = fit_transform(&payroll(), &schema).unwrap();
        assert_eq!(out.table.headers(), vec!["Id", "BasePay"]);
        assert_eq!(
            out.unassigned,
            vec!["EmployeeName", "JobTitle", "Benefits", "Year", "Notes"]
        );
    }

    #[test]
    fn test_apply_matches_fit_transform() {
        let first = fit_transform(&payroll(), &schema()).unwrap();
        let again = apply(&payroll(), &first.fitted).unwrap();
        assert_eq!(again.table, first.table);
    }

    #[test]
    fn test_apply_to_new_batch() {
        let first = fit_transform(&payroll(), &schema()).unwrap();
        let batch = parse_table(
            "Id,EmployeeName,JobTitle,BasePay,Benefits,Year\n\
             9,DAVE,Library,,15,2015\n",
            ',',
        )
        .unwrap();

        let out = apply(&batch, &first.fitted).unwrap();
        assert_eq!(out.table.row_count(), 1);
        // Unseen label: no indicator set
        assert_eq!(out.table.column("JobTitle_Fire").unwrap().as_indicator().unwrap(), &[0]);
        assert_eq!(out.table.column("JobTitle_Police").unwrap().as_indicator().unwrap(), &[0]);
        // Missing pay filled with the fitted mean, which scales to zero
        assert_eq!(out.table.column("BasePay").unwrap().as_numeric().unwrap(), &[Some(0.0)]);
    }

    #[test]
    fn test_apply_requires_fitted_columns() {
        let first = fit_transform(&payroll(), &schema()).unwrap();
        let batch = parse_table("Id,EmployeeName\n9,DAVE\n", ',').unwrap();
        assert!(matches!(
            apply(&batch, &first.fitted),
            Err(PipelineError::Transform(TransformError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "\\t");
        assert_eq!(format_delimiter(';'), ";");
    }
}
