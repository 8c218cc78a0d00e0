use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use precios_to_csv::{
    ConversionReport, ConversionStatus, ConvertOptions, DEFAULT_CURRENCY, PageSelection,
    ReportFamily, convert_pdf_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "precios2csv",
    version,
    about = "Convert price survey PDFs into CSV reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert one survey and write its CSV reports next to the input.
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Survey family: a (retail) or b (pharmacy).
    #[arg(short, long, default_value = "a")]
    family: String,

    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Currency code written on every record.
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,

    /// Reprocess even if the CSV reports already exist.
    #[arg(long)]
    force: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ConvertArgs) -> Result<ConvertOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(ConvertOptions {
        pages,
        delimiter: args.delimiter as u8,
        currency: args.currency.trim().to_uppercase(),
        force: args.force,
        ..ConvertOptions::default()
    })
}

fn log_report(report: &ConversionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} page(s) skipped", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?}: {}",
                warning.code, warning.page, warning.message
            );
        }
    }
}

fn run_convert(args: &ConvertArgs) -> Result<ConversionReport> {
    let family = ReportFamily::from_str(&args.family)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --family")?;
    let options = parse_options(args)?;
    convert_pdf_file(&args.input, family, &options)
        .with_context(|| format!("failed to convert '{}'", args.input.display()))
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("precios_to_csv=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => match run_convert(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                for output in &report.outputs {
                    println!("{}", output.display());
                }
                if report.status == ConversionStatus::Existing || report.record_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
