use crate::{ReportError, Result};
use lopdf::Document;
use std::path::Path;

// ── PageTexts ────────────────────────────────────────────────────────────────

/// Raw text of the two pages the report template spreads its fields over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTexts {
    pub first: String,
    /// Page 2, or a copy of page 1 for single-page documents.
    pub second: String,
}

impl PageTexts {
    /// Build from the first page and an optional second page.
    pub fn new(first: impl Into<String>, second: Option<String>) -> Self {
        let first = first.into();
        let second = second.unwrap_or_else(|| first.clone());
        Self { first, second }
    }
}

// ── PageTextSource ───────────────────────────────────────────────────────────

/// Anything able to turn a report file into its page texts.
///
/// Every failure to open or read the document is reported as
/// [`ReportError::DocumentUnreadable`]; missing fields are not errors.
pub trait PageTextSource: Send + Sync {
    fn page_texts(&self, path: &Path) -> Result<PageTexts>;
}

/// [`PageTextSource`] backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextSource;

impl PageTextSource for LopdfTextSource {
    fn page_texts(&self, path: &Path) -> Result<PageTexts> {
        let report = ReportDocument::from_path(path).map_err(|e| unreadable(path, e))?;
        report.page_texts().map_err(|e| unreadable(path, e))
    }
}

fn unreadable(path: &Path, err: ReportError) -> ReportError {
    match err {
        ReportError::DocumentUnreadable(_) => err,
        other => ReportError::DocumentUnreadable(format!("{}: {other}", path.display())),
    }
}

// ── ReportDocument ───────────────────────────────────────────────────────────

/// A loaded report PDF.
///
/// ```no_run
/// use controlreport::ReportDocument;
///
/// let doc = ReportDocument::from_path("rapport.pdf").unwrap();
/// let pages = doc.page_texts().unwrap();
/// println!("{}", pages.first);
/// ```
pub struct ReportDocument {
    document: Document,
}

impl ReportDocument {
    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            document: Document::load(path)?,
        })
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            document: Document::load_mem(data)?,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of pages 1 and 2. A document without pages is unreadable.
    pub fn page_texts(&self) -> Result<PageTexts> {
        let pages = self.document.get_pages();
        if pages.is_empty() {
            return Err(ReportError::DocumentUnreadable(
                "document has no pages".into(),
            ));
        }

        let first = self.document.extract_text(&[1])?;
        let second = if pages.len() > 1 {
            Some(self.document.extract_text(&[2])?)
        } else {
            None
        };

        Ok(PageTexts::new(first, second))
    }
}
