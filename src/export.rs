use crate::{ExtractedRecord, Field, ProcessorConfig, ReportError, Result};
use calamine::Reader;
use rust_xlsxwriter::{Format, Workbook};
use std::fs::File;
use std::path::{Path, PathBuf};

// ── Spreadsheet ──────────────────────────────────────────────────────────────

/// Worksheet holding the summary table in `.xlsx` output.
pub const SHEET_NAME: &str = "Controles";

/// On-disk format of the summary table, picked from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Excel workbook, one sheet. Used for every name not ending in `.csv`.
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

/// Write `records` as a table named `file_name` inside `output_dir`.
///
/// The header is [`Field::ALL`] in order; each record fills every column,
/// using `""` for anything it lacks. Returns [`ReportError::NoData`] instead
/// of writing a header-only file.
pub fn export_spreadsheet(
    records: &[ExtractedRecord],
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    if records.is_empty() {
        return Err(ReportError::NoData);
    }

    let path = output_dir.join(file_name);
    match SpreadsheetFormat::from_path(&path) {
        SpreadsheetFormat::Xlsx => write_xlsx(records, &path)?,
        SpreadsheetFormat::Csv => write_csv(records, &path)?,
    }

    log::info!("wrote {} row(s) to {}", records.len(), path.display());
    Ok(path)
}

fn write_xlsx(records: &[ExtractedRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, field) in (0u16..).zip(Field::ALL) {
        sheet.write_string_with_format(0, col, field.name(), &bold)?;
    }
    for (row, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(record.to_row()) {
            if !value.is_empty() {
                sheet.write_string(row, col, value)?;
            }
        }
    }
    sheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

fn write_csv(records: &[ExtractedRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(Field::ALL.iter().map(|f| f.name()))?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back a table written by [`export_spreadsheet`]. Unknown columns are
/// ignored.
pub fn read_spreadsheet(path: &Path) -> Result<Vec<ExtractedRecord>> {
    let rows = match SpreadsheetFormat::from_path(path) {
        SpreadsheetFormat::Xlsx => read_xlsx_rows(path)?,
        SpreadsheetFormat::Csv => read_csv_rows(path)?,
    };
    let mut rows = rows.into_iter();
    let columns: Vec<Option<Field>> = match rows.next() {
        Some(header) => header.iter().map(|name| Field::from_name(name)).collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        let mut record = ExtractedRecord::new();
        let (mut original, mut new) = (None, None);

        for (column, value) in columns.iter().zip(row.iter()) {
            match column {
                Some(Field::OriginalFileName) => original = Some(value.as_str()),
                Some(Field::NewFileName) => new = Some(value.as_str()),
                Some(field) => record.set(*field, value),
                None => {}
            }
        }
        if original.is_some() || new.is_some() {
            record.set_file_names(original.unwrap_or(""), new.unwrap_or(""));
        }
        records.push(record);
    }

    Ok(records)
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: calamine::Xlsx<_> = calamine::open_workbook(path)?;
    let range = workbook.worksheet_range(SHEET_NAME)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.records() {
        rows.push(row?.iter().map(String::from).collect());
    }
    Ok(rows)
}

// ── Archive ──────────────────────────────────────────────────────────────────

/// Renamed reports sitting directly in `output_dir`, sorted by name.
fn renamed_pdfs(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.is_file() && crate::discovery::is_candidate_pdf(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Pack every PDF of `output_dir` plus `spreadsheet` at the root of a ZIP at
/// `archive_path`. Returns the number of PDFs packed.
///
/// Fails with [`ReportError::NoArtifacts`] when there is nothing to pack, and
/// with [`ReportError::PackagingFailed`] on any write error, in which case the
/// partial archive is removed.
pub fn package_archive(
    output_dir: &Path,
    spreadsheet: Option<&Path>,
    archive_path: &Path,
) -> Result<usize> {
    let pdfs = renamed_pdfs(output_dir).map_err(packaging_failed)?;
    let spreadsheet = spreadsheet.filter(|p| p.is_file());

    if pdfs.is_empty() && spreadsheet.is_none() {
        return Err(ReportError::NoArtifacts);
    }

    let entries: Vec<&Path> = pdfs
        .iter()
        .map(PathBuf::as_path)
        .chain(spreadsheet)
        .collect();

    if let Err(e) = write_zip(&entries, archive_path) {
        if archive_path.exists() {
            let _ = std::fs::remove_file(archive_path);
        }
        return Err(packaging_failed(e));
    }

    log::info!(
        "packed {} PDF(s){} into {}",
        pdfs.len(),
        if spreadsheet.is_some() { " and the spreadsheet" } else { "" },
        archive_path.display()
    );
    Ok(pdfs.len())
}

fn write_zip(entries: &[&Path], archive_path: &Path) -> Result<()> {
    let mut writer = zip::ZipWriter::new(File::create(archive_path)?);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ReportError::PackagingFailed(format!("no file name: {}", path.display())))?;
        writer.start_file(name, options)?;
        std::io::copy(&mut File::open(path)?, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

fn packaging_failed(err: ReportError) -> ReportError {
    match err {
        ReportError::PackagingFailed(_) => err,
        other => ReportError::PackagingFailed(other.to_string()),
    }
}

// ── Run packaging ────────────────────────────────────────────────────────────

/// What [`package_run`] left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    /// `None` when there was no data or the export failed.
    pub spreadsheet: Option<PathBuf>,
    pub archive: PathBuf,
    pub pdf_count: usize,
    /// Message of a spreadsheet export failure. The archive is still built.
    pub export_error: Option<String>,
}

/// Export the spreadsheet, then bundle it with the renamed PDFs.
///
/// An export failure is not fatal: it is recorded in
/// [`RunArtifacts::export_error`] and the PDFs are packed alone. A packaging
/// failure is returned as an error.
pub fn package_run(
    records: &[ExtractedRecord],
    output_dir: &Path,
    archive_path: &Path,
    config: &ProcessorConfig,
) -> Result<RunArtifacts> {
    let (spreadsheet, export_error) =
        match export_spreadsheet(records, output_dir, &config.spreadsheet_name) {
            Ok(path) => (Some(path), None),
            Err(ReportError::NoData) => {
                log::warn!("no extracted data, spreadsheet not generated");
                (None, None)
            }
            Err(e) => {
                log::error!("spreadsheet export failed: {e}");
                (None, Some(e.to_string()))
            }
        };

    let pdf_count = package_archive(output_dir, spreadsheet.as_deref(), archive_path)?;

    Ok(RunArtifacts {
        spreadsheet,
        archive: archive_path.to_path_buf(),
        pdf_count,
        export_error,
    })
}
