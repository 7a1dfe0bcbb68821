//! CLI for renaming inspection reports and building their summary bundle.
//!
//! Takes PDF files, directories, and ZIP archives, copies every report to the
//! output directory as `RAPPORT - <reference>.pdf`, writes the Excel summary
//! there, and packs everything into one ZIP.

use clap::Parser;
use controlreport::{
    package_run, run_batch, stage_inputs, ProcessorConfig, ReportError, Result, RunSummary,
    DEFAULT_SPREADSHEET_NAME,
};
use std::path::{Path, PathBuf};
use std::process;

const DEFAULT_ARCHIVE_NAME: &str = "rapports_greenprime_traites.zip";

#[derive(Parser, Debug)]
#[command(
    name = "controlreport",
    version,
    about = "Extract, rename and summarize heating-control inspection reports"
)]
struct Args {
    /// PDF files, directories or ZIP archives to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the renamed PDFs and the summary table
    #[arg(short, long, default_value = "rapports_renommes")]
    output: PathBuf,

    /// Path of the result archive (default: next to the output directory)
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// File name of the summary table (`.xlsx`, or `.csv` for CSV output)
    #[arg(long, default_value = DEFAULT_SPREADSHEET_NAME)]
    spreadsheet_name: String,

    /// Process files in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => println!("\n✅ Processing completed."),
        Err(e) => {
            eprintln!("\n❌ Error: {e}");
            process::exit(1);
        }
    }
}

fn default_archive_path(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) => parent.join(DEFAULT_ARCHIVE_NAME),
        None => PathBuf::from(DEFAULT_ARCHIVE_NAME),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = ProcessorConfig {
        spreadsheet_name: args.spreadsheet_name.clone(),
        parallel: args.parallel,
        ..Default::default()
    };
    let archive = args
        .archive
        .clone()
        .unwrap_or_else(|| default_archive_path(&args.output));

    println!("📁 Output directory: {}", args.output.display());
    println!("{}", "─".repeat(60));

    let staging = tempfile::tempdir()?;
    let inputs = stage_inputs(&args.inputs, staging.path())?;

    let outcome = run_batch(&inputs, &args.output, &config)?;
    print_summary(&outcome.summary);

    if outcome.summary.found == 0 {
        println!("\n⚠️  No PDF file found to process.");
        return Ok(());
    }

    println!("\n📦 Building result archive...");
    match package_run(&outcome.records, &args.output, &archive, &config) {
        Ok(artifacts) => {
            match (&artifacts.spreadsheet, &artifacts.export_error) {
                (Some(path), _) => println!("   📊 Spreadsheet: {}", path.display()),
                (None, Some(err)) => println!("   ⚠️  Spreadsheet not generated: {err}"),
                (None, None) => println!("   ℹ️  No extracted data, no spreadsheet"),
            }
            println!(
                "   🗜️  Archive: {} ({} PDF(s))",
                artifacts.archive.display(),
                artifacts.pdf_count
            );
            Ok(())
        }
        Err(ReportError::NoArtifacts) => {
            println!("   ℹ️  No renamed PDF and no spreadsheet, archive not created");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn print_summary(summary: &RunSummary) {
    println!("📊 Summary:");
    println!("   • PDF found            : {}", summary.found);
    println!("   • PDF processed        : {}", summary.processed);
    println!("   • ✅ Renamed           : {}", summary.succeeded_rename);
    println!("   • 📊 Data extracted    : {}", summary.succeeded_extraction);
    println!("   • ❌ Failed            : {}", summary.failed);

    if !summary.failures.is_empty() {
        println!("\n🔍 Failures:");
        for failure in &summary.failures {
            println!("   {:<40} {}", failure.file, failure.reason);
        }
    }
}
