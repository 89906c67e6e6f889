use std::fs;
use std::path::Path;

use tabular_etl::error::{ExtractError, LoadError, TransformError};
use tabular_etl::{
    parse_table, run, salaries_schema, FittedPipeline, PipelineError, RunOptions, Schema, Table,
};

const SALARIES: &str = "\
Id,EmployeeName,JobTitle,BasePay,OvertimePay,OtherPay,Benefits,TotalPay,TotalPayBenefits,Year,Notes,Agency,Status
1,NATHANIEL FORD,GENERAL MANAGER-METROPOLITAN TRANSIT AUTHORITY,\"$167,411.18\",0.00,\"400,184.25\",,\"567,595.43\",\"567,595.43\",2011,,San Francisco,
2,GARY JIMENEZ,CAPTAIN III (POLICE DEPARTMENT),\"155,966.02\",\"245,131.88\",\"137,811.38\",,\"538,909.28\",\"538,909.28\",2011,,San Francisco,
3,ALBERT PARDINI,CAPTAIN III (POLICE DEPARTMENT),\"212,739.13\",\"106,088.18\",\"16,452.60\",,\"335,279.91\",\"335,279.91\",2011,,San Francisco,
4,CHRISTOPHER CHONG,WIRE ROPE CABLE MAINTENANCE MECHANIC,,\"56,120.71\",\"198,306.90\",\"44,430.12\",\"332,343.61\",\"376,773.73\",2012,,San Francisco,FT
5,\"SMITH, JOHN\",TRANSIT OPERATOR,Not Provided,0.00,0.00,\"30,100.00\",\"61,500.00\",\"91,600.00\",2012,,San Francisco,PT
";

fn write_input(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_output(path: &Path) -> Table {
    parse_table(&fs::read_to_string(path).unwrap(), ',').unwrap()
}

fn numbers(table: &Table, column: &str) -> Vec<f64> {
    table
        .column(column)
        .unwrap()
        .as_text()
        .unwrap()
        .iter()
        .map(|c| c.parse::<f64>().unwrap())
        .collect()
}

#[test]
fn test_salaries_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let output = dir.path().join("processed_salaries_data.csv");

    let report = run(&input, &output, &salaries_schema(), &RunOptions::default()).unwrap();
    assert_eq!(report.rows_in, 5);
    assert_eq!(report.rows_out, 5);
    assert_eq!(report.input.delimiter, ',');

    let out = read_output(&output);
    let headers = out.headers();
    assert_eq!(&headers[..3], &["Id", "EmployeeName", "num__BasePay"]);
    assert!(!headers.contains(&"Notes"));
    assert!(!headers.contains(&"Status"));
    assert!(!headers.contains(&"JobTitle"));
    assert!(headers.contains(&"cat__Agency_San Francisco"));
    assert_eq!(
        out.column("EmployeeName").unwrap().as_text().unwrap()[4],
        "SMITH, JOHN"
    );

    // Indicator columns come after every numeric column
    let first_indicator = headers.iter().position(|h| h.starts_with("cat__")).unwrap();
    assert!(headers[first_indicator..].iter().all(|h| h.starts_with("cat__")));
}

#[test]
fn test_scaled_columns_are_standardized() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let output = dir.path().join("out.csv");
    run(&input, &output, &salaries_schema(), &RunOptions::default()).unwrap();

    let out = read_output(&output);
    for column in ["num__BasePay", "num__OtherPay", "num__Benefits", "num__Year"] {
        let values = numbers(&out, column);
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 1e-9, "{} mean {}", column, mean);
        assert!((var.sqrt() - 1.0).abs() < 1e-9, "{} std {}", column, var.sqrt());
    }
}

#[test]
fn test_one_indicator_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let output = dir.path().join("out.csv");
    run(&input, &output, &salaries_schema(), &RunOptions::default()).unwrap();

    let out = read_output(&output);
    let job_titles: Vec<&str> = out
        .headers()
        .into_iter()
        .filter(|h| h.starts_with("cat__JobTitle_"))
        .collect();
    assert_eq!(job_titles.len(), 4);

    for row in 0..out.row_count() {
        let ones: u32 = job_titles
            .iter()
            .map(|h| out.column(h).unwrap().as_text().unwrap()[row].parse::<u32>().unwrap())
            .sum();
        assert_eq!(ones, 1);
    }
    assert_eq!(numbers(&out, "cat__Agency_San Francisco"), vec![1.0; 5]);
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    run(&input, &first, &salaries_schema(), &RunOptions::default()).unwrap();
    run(&input, &second, &salaries_schema(), &RunOptions::default()).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_semicolon_input_keeps_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        "in.csv",
        "Id;Dept;Pay\n1;Fire;10\n2;Police;30\n3;Fire;10\n4;;30\n",
    );
    let output = dir.path().join("out.csv");
    let schema = Schema::new("Id")
        .with_numeric(["Pay"])
        .with_categorical(["Dept"]);

    run(&input, &output, &schema, &RunOptions::default()).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "Id;Pay;Dept_Fire;Dept_Police\n1;-1;1;0\n2;1;0;1\n3;-1;1;0\n4;1;1;0\n"
    );
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(
        &dir.path().join("absent.csv"),
        &dir.path().join("out.csv"),
        &salaries_schema(),
        &RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Extract(ExtractError::NotFound { .. })));
    assert!(err.to_string().starts_with("extract:"));
}

#[test]
fn test_ragged_rows_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.csv", "Id,Pay\n1,10\n2,20,extra\n");
    let output = dir.path().join("out.csv");

    let err = run(&input, &output, &Schema::new("Id"), &RunOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extract(ExtractError::MalformedInput { line: 3, .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_all_missing_column_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.csv", "Id,Benefits\n1,\n2,Not Provided\n");
    let output = dir.path().join("out.csv");
    let schema = Schema::new("Id").with_numeric(["Benefits"]);

    let err = run(&input, &output, &schema, &RunOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Transform(TransformError::AllValuesMissing { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_unwritable_output_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let output = dir.path().join("missing-dir").join("out.csv");
    let fitted = dir.path().join("fitted.json");

    let options = RunOptions {
        save_fitted: Some(fitted.clone()),
        ..RunOptions::default()
    };
    let err = run(&input, &output, &salaries_schema(), &options).unwrap_err();

    assert!(matches!(err, PipelineError::Load(LoadError::Write { .. })));
    assert!(!output.exists());
    assert!(!fitted.exists());
}

#[test]
fn test_fitted_pipeline_applies_to_new_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "Salaries.csv", SALARIES);
    let output = dir.path().join("out.csv");
    let fitted_path = dir.path().join("fitted.json");

    run(
        &input,
        &output,
        &salaries_schema(),
        &RunOptions {
            save_fitted: Some(fitted_path.clone()),
            ..RunOptions::default()
        },
    )
    .unwrap();

    let fitted = FittedPipeline::load(&fitted_path).unwrap();
    assert_eq!(fitted.schema, salaries_schema());

    // Re-applying to the fitting data reproduces the same output
    let replay = dir.path().join("replay.csv");
    let options = RunOptions {
        fitted: Some(fitted_path.clone()),
        ..RunOptions::default()
    };
    run(&input, &replay, &Schema::new("ignored"), &options).unwrap();
    assert_eq!(fs::read(&output).unwrap(), fs::read(&replay).unwrap());

    // A new batch keeps the fitted column layout
    let batch = write_input(
        dir.path(),
        "batch.csv",
        "Id,EmployeeName,JobTitle,BasePay,OvertimePay,OtherPay,Benefits,TotalPay,TotalPayBenefits,Year,Agency\n\
         6,JANE DOE,LIBRARIAN,\"90,000.00\",0,0,\"20,000.00\",\"90,000.00\",\"110,000.00\",2013,San Francisco\n",
    );
    let batch_out = dir.path().join("batch_out.csv");
    run(&batch, &batch_out, &Schema::new("ignored"), &options).unwrap();

    let first = read_output(&output);
    let applied = read_output(&batch_out);
    assert_eq!(applied.headers(), first.headers());
    assert_eq!(applied.row_count(), 1);
}
