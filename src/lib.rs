//! # controlreport
//!
//! Batch processor for heating-control inspection reports delivered as PDF.
//!
//! ## What this crate does
//!
//! 1. **Extract fields**: reads the text of pages 1 and 2 and applies a fixed
//!    table of labeled-field rules (reference, FOS code, address, yes/no
//!    answers, conclusion, …) to build an [`ExtractedRecord`].
//! 2. **Rename**: derives `RAPPORT - <reference>.pdf` from the report
//!    reference, resolving name collisions with `_1`, `_2`, … suffixes.
//! 3. **Copy**: writes the renamed copy into a flat output directory. The
//!    input files are never moved or modified.
//! 4. **Summarize**: writes one spreadsheet row per report (Excel workbook,
//!    or CSV) and bundles it with the renamed PDFs in a ZIP archive.
//!
//! ## Quick example
//!
//! ```no_run
//! use controlreport::{package_run, run_batch, ProcessorConfig};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProcessorConfig::default();
//! let out = Path::new("renamed");
//!
//! let outcome = run_batch(&[PathBuf::from("incoming")], out, &config)?;
//! println!("{} renamed, {} failed", outcome.summary.succeeded_rename, outcome.summary.failed);
//!
//! let artifacts = package_run(&outcome.records, out, Path::new("bundle.zip"), &config)?;
//! println!("archive: {}", artifacts.archive.display());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod batch;
mod discovery;
mod disposer;
mod document;
mod export;
mod extractor;
mod fields;
mod naming;
pub mod rules;

pub use batch::{run_batch, BatchCoordinator, BatchOutcome, FailureEntry, RunSummary};
pub use discovery::{discover_pdfs, expand_zip, is_candidate_pdf, stage_inputs};
pub use disposer::{DispositionResult, DispositionStatus, FileDisposer};
pub use document::{LopdfTextSource, PageTextSource, PageTexts, ReportDocument};
pub use export::{
    export_spreadsheet, package_archive, package_run, read_spreadsheet, RunArtifacts,
    SpreadsheetFormat, SHEET_NAME,
};
pub use extractor::{extract_document, extract_fields};
pub use fields::{normalize_whitespace, ExtractedRecord, Field};
pub use naming::{
    candidate_name, resolve_name, sanitize_reference, ClaimedName, OutputDirectory, NAME_PREFIX,
};

// ── Configuration ────────────────────────────────────────────────────────────

/// Most names tried for one reference before giving up.
pub const DEFAULT_MAX_NAME_ATTEMPTS: usize = 20;

/// `NewFileName` written for reports that were extracted but not renamed.
pub const DEFAULT_RENAME_ERROR_MARKER: &str = "RENAME_ERROR";

/// File name of the summary table inside the output directory.
pub const DEFAULT_SPREADSHEET_NAME: &str = "recapitulatif_controles_greenprime.xlsx";

/// Runtime configuration for a batch run.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Names tried per reference (`RAPPORT - X.pdf`, then `_1` … `_{n-1}`)
    /// before the file fails with a conflict.
    pub max_name_attempts: usize,

    /// Placed in the `NewFileName` column when the rename step failed.
    pub rename_error_marker: String,

    /// Name of the summary table written into the output directory. A `.csv`
    /// name selects CSV, anything else an Excel workbook.
    pub spreadsheet_name: String,

    /// Dispose of files on a rayon pool. Output order is unaffected.
    pub parallel: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_name_attempts: DEFAULT_MAX_NAME_ATTEMPTS,
            rename_error_marker: DEFAULT_RENAME_ERROR_MARKER.into(),
            spreadsheet_name: DEFAULT_SPREADSHEET_NAME.into(),
            parallel: false,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A filesystem I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying lopdf parser returned an error.
    #[error("PDF parse error: {0}")]
    ParseError(#[from] lopdf::Error),

    /// The document could not be opened or its pages could not be read.
    #[error("Unreadable document: {0}")]
    DocumentUnreadable(String),

    /// The reference contained no character usable in a file name.
    #[error("Invalid reference after sanitizing: '{0}'")]
    InvalidReference(String),

    /// Every candidate name for this reference is already taken.
    #[error("Too many name conflicts for '{reference}' ({attempts} attempts)")]
    ConflictLimitExceeded { reference: String, attempts: usize },

    /// The spreadsheet was not written because there were no records.
    #[error("No data to export")]
    NoData,

    /// Neither renamed PDFs nor a spreadsheet exist to be packaged.
    #[error("Nothing to package")]
    NoArtifacts,

    /// The result archive could not be produced.
    #[error("Packaging failed: {0}")]
    PackagingFailed(String),

    /// Writing the Excel summary failed.
    #[error("XLSX write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    /// Reading back the Excel summary failed.
    #[error("XLSX read error: {0}")]
    XlsxReadError(#[from] calamine::XlsxError),

    /// Reading or writing the CSV summary failed.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Reading or writing a ZIP archive failed.
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ReportError>;
