//! Tabular ETL CLI - Clean delimited files for downstream analysis
//!
//! # Main Commands
//!
//! ```bash
//! tabular-etl run Salaries.csv processed_salaries_data.csv
//! tabular-etl run input.csv output.csv --schema schema.json --save-fitted fitted.json
//! tabular-etl run batch.csv out.csv --fitted fitted.json
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! tabular-etl inspect input.csv    # Show encoding, delimiter and a preview
//! tabular-etl example-schema       # Print the built-in salaries schema
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tabular_etl::transform::format_delimiter;
use tabular_etl::{log_error, read_table, run, salaries_schema, RunOptions, Schema};

#[derive(Parser)]
#[command(name = "tabular-etl")]
#[command(about = "Clean and normalize delimited tabular data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: extract, transform, load
    Run {
        /// Input delimited file
        #[arg(env = "ETL_INPUT")]
        input: PathBuf,

        /// Output delimited file (replaced atomically)
        #[arg(env = "ETL_OUTPUT")]
        output: PathBuf,

        /// Schema JSON file (default: built-in salaries schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Apply a fitted pipeline instead of fitting on the input
        #[arg(short, long, conflicts_with = "schema")]
        fitted: Option<PathBuf>,

        /// Save the fitted pipeline to file
        #[arg(long)]
        save_fitted: Option<PathBuf>,

        /// Write a JSON run report to file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Show encoding, delimiter, columns and the first rows of a file
    Inspect {
        /// Input delimited file
        input: PathBuf,

        /// Delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Number of preview rows
        #[arg(short, long, default_value = "5")]
        rows: usize,
    },

    /// Show the built-in salaries schema
    ExampleSchema,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            schema,
            delimiter,
            fitted,
            save_fitted,
            report,
        } => cmd_run(
            &input,
            &output,
            schema.as_deref(),
            RunOptions {
                delimiter,
                fitted,
                save_fitted,
            },
            report.as_deref(),
        ),

        Commands::Inspect {
            input,
            delimiter,
            rows,
        } => cmd_inspect(&input, delimiter, rows),

        Commands::ExampleSchema => cmd_example_schema(),
    };

    if let Err(e) = result {
        log_error(format!("An error occurred during the ETL process: {}", e));
        std::process::exit(1);
    }
}

fn cmd_run(
    input: &Path,
    output: &Path,
    schema_path: Option<&Path>,
    options: RunOptions,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = match schema_path {
        Some(path) => Schema::load(path)?,
        None => salaries_schema(),
    };

    let report = run(input, output, &schema, &options)?;

    eprintln!("\n📊 Summary:");
    eprintln!("   Rows: {} -> {}", report.rows_in, report.rows_out);
    eprintln!("   Columns: {} -> {}", report.columns_in, report.columns_out);
    if !report.degenerate_columns.is_empty() {
        eprintln!("   Unscaled: {}", report.degenerate_columns.join(", "));
    }

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        eprintln!("   💾 Report saved to: {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(
    input: &Path,
    delimiter: Option<char>,
    rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let parsed = read_table(input, delimiter)?;

    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(parsed.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Rows: {}", parsed.row_count());
    eprintln!("   Columns: {}", parsed.headers().join(", "));

    eprintln!("\n   Empty cells:");
    for (column, count) in parsed.missing_counts() {
        eprintln!("     {}: {}", column, count);
    }

    println!("{}", parsed.headers().join(" | "));
    for row in 0..rows.min(parsed.row_count()) {
        println!("{}", parsed.table.render_row(row).join(" | "));
    }

    Ok(())
}

fn cmd_example_schema() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", salaries_schema().to_json()?);
    Ok(())
}
