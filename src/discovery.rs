//! Finding report PDFs among the submitted inputs.
//!
//! Inputs may be PDF files, directories, or ZIP archives. Archives are first
//! expanded by [`stage_inputs`]; [`discover_pdfs`] then walks the resulting
//! paths and returns every candidate report in a stable order.

use crate::Result;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["__MACOSX"];

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn is_skipped_dir(path: &Path) -> bool {
    is_hidden(path)
        || path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| SKIPPED_DIRS.contains(&n))
            .unwrap_or(false)
}

/// Returns `true` for a visible `*.pdf` file name (covers `._foo.pdf`
/// resource forks, which start with a dot).
pub fn is_candidate_pdf(path: &Path) -> bool {
    has_extension(path, "pdf") && !is_hidden(path)
}

/// Every candidate PDF under `roots`, in order: roots as given, and within a
/// directory, paths sorted.
///
/// Symlinked directories are not followed. `exclude` (typically the output
/// directory) is never descended into, so earlier results are not picked up
/// again when it lies under a root.
pub fn discover_pdfs(roots: &[PathBuf], exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let excluded = exclude.and_then(|dir| dir.canonicalize().ok());
    let mut found = Vec::new();

    for root in roots {
        if root.is_dir() {
            if is_excluded(root, excluded.as_deref()) {
                log::debug!("skipping output directory {}", root.display());
                continue;
            }
            let mut files = Vec::new();
            walk(root, excluded.as_deref(), &mut files)?;
            files.sort();
            found.extend(files);
        } else if is_candidate_pdf(root) {
            found.push(root.clone());
        } else {
            log::debug!("ignoring {}", root.display());
        }
    }

    Ok(found)
}

fn is_excluded(dir: &Path, excluded: Option<&Path>) -> bool {
    match excluded {
        Some(excluded) => dir.canonicalize().is_ok_and(|dir| dir == excluded),
        None => false,
    }
}

fn walk(dir: &Path, excluded: Option<&Path>, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            if !is_skipped_dir(&path) && !is_excluded(&path, excluded) {
                walk(&path, excluded, files)?;
            }
        } else if file_type.is_symlink() && path.is_dir() {
            log::debug!("not following directory link {}", path.display());
        } else if is_candidate_pdf(&path) {
            files.push(path);
        }
    }
    Ok(())
}

// ── Archive staging ──────────────────────────────────────────────────────────

/// Expand every `.zip` among `inputs` into its own directory under
/// `staging_dir` and return the list of paths to discover from.
///
/// Non-archive inputs are passed through untouched. A corrupt archive is
/// logged and skipped.
pub fn stage_inputs(inputs: &[PathBuf], staging_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        if !(input.is_file() && has_extension(input, "zip")) {
            staged.push(input.clone());
            continue;
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".into());
        let target = staging_dir.join(format!("{index:03}_{stem}"));

        match expand_zip(input, &target) {
            Ok(count) => {
                log::info!("expanded {} ({count} entries)", input.display());
                staged.push(target);
            }
            Err(e) => log::error!("cannot expand {}: {e}", input.display()),
        }
    }

    Ok(staged)
}

/// Extract `archive` into `target`, skipping entries whose path would escape
/// it. Returns the number of files written.
pub fn expand_zip(archive: &Path, target: &Path) -> Result<usize> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
    std::fs::create_dir_all(target)?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("skipping unsafe entry {} in {}", entry.name(), archive.display());
            continue;
        };
        let dest = target.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}
