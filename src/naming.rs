use crate::{ReportError, Result};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Prefix of every renamed report.
pub const NAME_PREFIX: &str = "RAPPORT - ";

/// Keep only alphanumerics and `-`, `_`, `.` from a raw reference.
///
/// Fails with [`ReportError::InvalidReference`] when nothing is left.
///
/// ```
/// # use controlreport::sanitize_reference;
/// assert_eq!(sanitize_reference(" GP/2024 #42 ").unwrap(), "GP202442");
/// assert!(sanitize_reference(" / # ").is_err());
/// ```
pub fn sanitize_reference(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(ReportError::InvalidReference(raw.to_string()));
    }
    Ok(cleaned.to_string())
}

/// File name for the `attempt`-th try: `RAPPORT - <ref>.pdf`, then
/// `RAPPORT - <ref>_1.pdf`, `RAPPORT - <ref>_2.pdf`, …
pub fn candidate_name(sanitized: &str, attempt: usize) -> String {
    if attempt == 0 {
        format!("{NAME_PREFIX}{sanitized}.pdf")
    } else {
        format!("{NAME_PREFIX}{sanitized}_{attempt}.pdf")
    }
}

/// First candidate name for which `taken` returns `false`, trying at most
/// `max_attempts` names.
pub fn resolve_name<F>(sanitized: &str, max_attempts: usize, mut taken: F) -> Result<String>
where
    F: FnMut(&str) -> bool,
{
    (0..max_attempts)
        .map(|attempt| candidate_name(sanitized, attempt))
        .find(|name| !taken(name))
        .ok_or_else(|| ReportError::ConflictLimitExceeded {
            reference: sanitized.to_string(),
            attempts: max_attempts,
        })
}

// ── OutputDirectory ──────────────────────────────────────────────────────────

/// A name reserved in the output directory by [`OutputDirectory::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedName {
    pub file_name: String,
    pub path: PathBuf,
}

/// The flat directory receiving renamed reports.
///
/// All name reservations go through [`claim`](Self::claim), which holds a lock
/// and creates the target with `create_new`: two workers can never leave with
/// the same name.
#[derive(Debug)]
pub struct OutputDirectory {
    root: PathBuf,
    max_attempts: usize,
    claim_lock: Mutex<()>,
}

impl OutputDirectory {
    pub fn new<P: Into<PathBuf>>(root: P, max_attempts: usize) -> Self {
        Self {
            root: root.into(),
            max_attempts,
            claim_lock: Mutex::new(()),
        }
    }

    /// The name `raw_reference` would get right now, without reserving it.
    pub fn name_for(&self, raw_reference: &str) -> Result<String> {
        let sanitized = sanitize_reference(raw_reference)?;
        resolve_name(&sanitized, self.max_attempts, |name| {
            self.root.join(name).exists()
        })
    }

    /// Reserve a free name for `raw_reference` by creating an empty file under
    /// it. The caller fills it in, or gives it back with [`release`](Self::release).
    pub fn claim(&self, raw_reference: &str) -> Result<ClaimedName> {
        let sanitized = sanitize_reference(raw_reference)?;
        let _guard = self.claim_lock.lock().unwrap_or_else(PoisonError::into_inner);

        for attempt in 0..self.max_attempts {
            let file_name = candidate_name(&sanitized, attempt);
            let path = self.root.join(&file_name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    log::debug!("claimed {}", path.display());
                    return Ok(ClaimedName { file_name, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ReportError::ConflictLimitExceeded {
            reference: sanitized,
            attempts: self.max_attempts,
        })
    }

    /// Drop a claimed placeholder that will not be filled.
    pub fn release(&self, claimed: &ClaimedName) {
        if let Err(e) = std::fs::remove_file(&claimed.path) {
            log::warn!("could not remove placeholder {}: {e}", claimed.path.display());
        }
    }
}
