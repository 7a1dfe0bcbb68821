use crate::discovery::discover_pdfs;
use crate::disposer::{DispositionResult, DispositionStatus, FileDisposer};
use crate::document::{LopdfTextSource, PageTextSource};
use crate::naming::OutputDirectory;
use crate::{ExtractedRecord, ProcessorConfig, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

// ── RunSummary ───────────────────────────────────────────────────────────────

/// One file that did not make it through cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub file: String,
    pub reason: String,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub processed: usize,
    pub succeeded_rename: usize,
    pub succeeded_extraction: usize,
    pub failed: usize,
    pub failures: Vec<FailureEntry>,
}

impl RunSummary {
    /// Fold one disposition into the counters. Returns the record to report,
    /// if any; failed renames get `rename_error_marker` as their new name.
    pub fn record(
        &mut self,
        result: DispositionResult,
        rename_error_marker: &str,
    ) -> Option<ExtractedRecord> {
        self.processed += 1;

        match result.status {
            DispositionStatus::Success => {
                self.succeeded_rename += 1;
                self.succeeded_extraction += 1;
                result.record
            }
            DispositionStatus::ExtractionError => {
                self.fail(result.original_name, "data extraction error".into());
                None
            }
            status => {
                let reason = format!("rename/copy failed ({status})");
                let record = result.record.map(|mut record| {
                    self.succeeded_extraction += 1;
                    record.set_file_names(&result.original_name, rename_error_marker);
                    record
                });
                self.fail(result.original_name, reason);
                record
            }
        }
    }

    fn fail(&mut self, file: String, reason: String) {
        self.failed += 1;
        self.failures.push(FailureEntry { file, reason });
    }
}

/// Everything a batch run produces besides the files on disk.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub summary: RunSummary,
    /// One record per file that got past extraction, in discovery order.
    pub records: Vec<ExtractedRecord>,
}

// ── BatchCoordinator ─────────────────────────────────────────────────────────

/// Runs the disposer over every discovered report and aggregates the results.
pub struct BatchCoordinator<'a> {
    source: &'a dyn PageTextSource,
    config: &'a ProcessorConfig,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(source: &'a dyn PageTextSource, config: &'a ProcessorConfig) -> Self {
        Self { source, config }
    }

    /// Process every PDF found under `inputs` into `output_dir`.
    ///
    /// Per-file problems never abort the run; only failing to create the
    /// output directory or to walk the inputs does.
    pub fn run(&self, inputs: &[PathBuf], output_dir: &Path) -> Result<BatchOutcome> {
        std::fs::create_dir_all(output_dir)?;
        let files = discover_pdfs(inputs, Some(output_dir))?;
        log::info!("found {} PDF file(s) to process", files.len());

        let output = OutputDirectory::new(output_dir, self.config.max_name_attempts);
        let disposer = FileDisposer::new(self.source, &output);

        let results: Vec<DispositionResult> = if self.config.parallel {
            files.par_iter().map(|path| disposer.dispose(path)).collect()
        } else {
            files.iter().map(|path| disposer.dispose(path)).collect()
        };

        let mut outcome = BatchOutcome::default();
        outcome.summary.found = files.len();
        for result in results {
            if let Some(record) = outcome
                .summary
                .record(result, &self.config.rename_error_marker)
            {
                outcome.records.push(record);
            }
        }

        log::info!(
            "processed {} file(s): {} renamed, {} extracted, {} failed",
            outcome.summary.processed,
            outcome.summary.succeeded_rename,
            outcome.summary.succeeded_extraction,
            outcome.summary.failed
        );

        Ok(outcome)
    }
}

/// [`BatchCoordinator::run`] with the lopdf text source.
pub fn run_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &ProcessorConfig,
) -> Result<BatchOutcome> {
    BatchCoordinator::new(&LopdfTextSource, config).run(inputs, output_dir)
}
