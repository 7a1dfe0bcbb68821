use crate::document::PageTextSource;
use crate::extractor::{display_name, extract_document};
use crate::naming::OutputDirectory;
use crate::{ExtractedRecord, ReportError};
use std::path::Path;

// ── DispositionStatus ────────────────────────────────────────────────────────

/// Terminal outcome of processing one report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispositionStatus {
    /// Extracted, renamed and copied.
    Success,
    /// Extracted, but the report reference was not found.
    NoReferenceFound,
    /// Extracted, but the reference had no usable character.
    InvalidReference,
    /// Extracted, but every candidate name was already taken.
    ConflictLimitExceeded,
    /// Extracted and named, but the copy failed.
    CopyError,
    /// The document could not be read at all. No record.
    ExtractionError,
}

impl DispositionStatus {
    /// Short human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoReferenceFound => "no reference found",
            Self::InvalidReference => "invalid reference",
            Self::ConflictLimitExceeded => "too many name conflicts",
            Self::CopyError => "copy error",
            Self::ExtractionError => "extraction error",
        }
    }
}

impl std::fmt::Display for DispositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── DispositionResult ────────────────────────────────────────────────────────

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct DispositionResult {
    pub status: DispositionStatus,
    pub original_name: String,
    /// Set on `Success`, and on `CopyError` (the name that was being written).
    pub new_name: Option<String>,
    /// Present for every status except `ExtractionError`.
    pub record: Option<ExtractedRecord>,
    /// Underlying error message, for non-success statuses.
    pub detail: Option<String>,
}

impl DispositionResult {
    fn new(status: DispositionStatus, original_name: String) -> Self {
        Self {
            status,
            original_name,
            new_name: None,
            record: None,
            detail: None,
        }
    }

    fn with_record(mut self, record: ExtractedRecord) -> Self {
        self.record = Some(record);
        self
    }

    fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

// ── FileDisposer ─────────────────────────────────────────────────────────────

/// Runs extract → name → copy for one file.
///
/// Nothing is retried; each call ends in exactly one [`DispositionStatus`].
pub struct FileDisposer<'a> {
    source: &'a dyn PageTextSource,
    output: &'a OutputDirectory,
}

impl<'a> FileDisposer<'a> {
    pub fn new(source: &'a dyn PageTextSource, output: &'a OutputDirectory) -> Self {
        Self { source, output }
    }

    pub fn dispose(&self, input: &Path) -> DispositionResult {
        let original_name = display_name(input);

        let mut record = match extract_document(self.source, input) {
            Ok(record) => record,
            Err(e) => {
                log::error!("failed to extract data from {original_name}: {e}");
                return DispositionResult::new(DispositionStatus::ExtractionError, original_name)
                    .with_detail(e);
            }
        };

        if record.reference().is_empty() {
            log::warn!("{original_name}: empty or missing reference, not renamed");
            return DispositionResult::new(DispositionStatus::NoReferenceFound, original_name)
                .with_record(record);
        }

        let claimed = match self.output.claim(record.reference()) {
            Ok(claimed) => claimed,
            Err(e) => {
                let status = match e {
                    ReportError::InvalidReference(_) => DispositionStatus::InvalidReference,
                    ReportError::ConflictLimitExceeded { .. } => {
                        DispositionStatus::ConflictLimitExceeded
                    }
                    _ => DispositionStatus::CopyError,
                };
                log::warn!("{original_name}: cannot name output file: {e}");
                return DispositionResult::new(status, original_name)
                    .with_record(record)
                    .with_detail(e);
            }
        };

        if let Err(e) = std::fs::copy(input, &claimed.path) {
            log::error!(
                "failed to copy {original_name} to {}: {e}",
                claimed.file_name
            );
            self.output.release(&claimed);
            let mut result = DispositionResult::new(DispositionStatus::CopyError, original_name)
                .with_record(record)
                .with_detail(e);
            result.new_name = Some(claimed.file_name);
            return result;
        }

        log::info!("{original_name} -> {}", claimed.file_name);
        record.set_file_names(&original_name, &claimed.file_name);

        let mut result = DispositionResult::new(DispositionStatus::Success, original_name)
            .with_record(record);
        result.new_name = Some(claimed.file_name);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageTexts;
    use crate::{Field, Result};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Serves canned page text keyed by file name; unknown files are unreadable.
    struct CannedText(HashMap<String, PageTexts>);

    impl PageTextSource for CannedText {
        fn page_texts(&self, path: &Path) -> Result<PageTexts> {
            self.0
                .get(&display_name(path))
                .cloned()
                .ok_or_else(|| ReportError::DocumentUnreadable(display_name(path)))
        }
    }

    fn canned(entries: &[(&str, &str)]) -> CannedText {
        CannedText(
            entries
                .iter()
                .map(|(name, first)| {
                    let second = "Nom du bénéficiaire Mme Durand\nConclusion du contrôle SATISFAISANT\n";
                    (name.to_string(), PageTexts::new(*first, Some(second.into())))
                })
                .collect(),
        )
    }

    fn input(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("%PDF-fake {name}")).unwrap();
        path
    }

    #[test]
    fn success_copies_and_names_record() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let path = input(src.path(), "scan.pdf");
        let source = canned(&[("scan.pdf", "Référence du rapport GP-1\n")]);
        let out = OutputDirectory::new(dst.path(), 20);

        let result = FileDisposer::new(&source, &out).dispose(&path);

        assert_eq!(result.status, DispositionStatus::Success);
        assert_eq!(result.new_name.as_deref(), Some("RAPPORT - GP-1.pdf"));
        let record = result.record.unwrap();
        assert_eq!(record.get(Field::OriginalFileName), "scan.pdf");
        assert_eq!(record.get(Field::NewFileName), "RAPPORT - GP-1.pdf");
        assert_eq!(
            std::fs::read(dst.path().join("RAPPORT - GP-1.pdf")).unwrap(),
            std::fs::read(&path).unwrap()
        );
        assert!(path.exists(), "original must be left in place");
    }

    #[test]
    fn missing_reference_keeps_record_without_copy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let path = input(src.path(), "a.pdf");
        let source = canned(&[("a.pdf", "pas de référence ici\n")]);
        let out = OutputDirectory::new(dst.path(), 20);

        let result = FileDisposer::new(&source, &out).dispose(&path);

        assert_eq!(result.status, DispositionStatus::NoReferenceFound);
        let record = result.record.unwrap();
        assert_eq!(record.reference(), "");
        assert_eq!(record.get(Field::NomBeneficiaire), "Mme Durand");
        assert_eq!(std::fs::read_dir(dst.path()).unwrap().count(), 0);
    }

    #[test]
    fn punctuation_reference_is_invalid() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let path = input(src.path(), "a.pdf");
        let source = canned(&[("a.pdf", "Référence du rapport ///\n")]);
        let out = OutputDirectory::new(dst.path(), 20);

        let result = FileDisposer::new(&source, &out).dispose(&path);

        assert_eq!(result.status, DispositionStatus::InvalidReference);
        assert!(result.record.is_some());
        assert!(result.new_name.is_none());
    }

    #[test]
    fn unreadable_document_has_no_record() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let path = input(src.path(), "broken.pdf");
        let source = canned(&[]);
        let out = OutputDirectory::new(dst.path(), 20);

        let result = FileDisposer::new(&source, &out).dispose(&path);

        assert_eq!(result.status, DispositionStatus::ExtractionError);
        assert!(result.record.is_none());
        assert!(result.detail.is_some());
    }

    #[test]
    fn vanished_source_is_copy_error_and_frees_the_name() {
        let dst = tempfile::tempdir().unwrap();
        let source = canned(&[("gone.pdf", "Référence du rapport R7\n")]);
        let out = OutputDirectory::new(dst.path(), 20);

        let result = FileDisposer::new(&source, &out).dispose(Path::new("/nowhere/gone.pdf"));

        assert_eq!(result.status, DispositionStatus::CopyError);
        assert_eq!(result.new_name.as_deref(), Some("RAPPORT - R7.pdf"));
        assert!(result.record.is_some());
        assert!(!dst.path().join("RAPPORT - R7.pdf").exists());
    }

    #[test]
    fn twenty_first_duplicate_hits_the_cap() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..21).map(|i| format!("f{i}.pdf")).collect();
        let entries: Vec<(&str, &str)> = names
            .iter()
            .map(|n| (n.as_str(), "Référence du rapport X1\n"))
            .collect();
        let source = canned(&entries);
        let out = OutputDirectory::new(dst.path(), 20);
        let disposer = FileDisposer::new(&source, &out);

        let results: Vec<_> = names
            .iter()
            .map(|n| disposer.dispose(&input(src.path(), n)))
            .collect();

        for (i, r) in results.iter().take(20).enumerate() {
            assert_eq!(r.status, DispositionStatus::Success);
            let expected = if i == 0 {
                "RAPPORT - X1.pdf".to_string()
            } else {
                format!("RAPPORT - X1_{i}.pdf")
            };
            assert_eq!(r.new_name.as_deref(), Some(expected.as_str()));
        }
        assert_eq!(results[20].status, DispositionStatus::ConflictLimitExceeded);
        assert!(results[20].record.is_some());
    }
}
