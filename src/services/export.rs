use crate::models::{OutputFormat, ResolvedFormat};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

/// Name of the single worksheet in exported workbooks.
pub const EXPORT_SHEET_NAME: &str = "Cleaned";

/// Base name used when the input name has nothing left after removing its extension.
const FALLBACK_BASE_NAME: &str = "cleaned";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error("Too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

/// An encoded cleaned list, ready to be written out or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serialize `emails` in `format`, resolving "same as input" against `input_name`.
pub fn export(
    emails: &[String],
    format: OutputFormat,
    input_name: &str,
) -> Result<ExportedFile, ExportError> {
    let input_extension = crate::services::content::file_extension(input_name).unwrap_or_default();
    export_resolved(emails, format.resolve(&input_extension), input_name)
}

/// Serialize `emails` in an already resolved format, naming the file after `input_name`.
pub fn export_resolved(
    emails: &[String],
    resolved: ResolvedFormat,
    input_name: &str,
) -> Result<ExportedFile, ExportError> {
    let bytes = match resolved {
        ResolvedFormat::Csv | ResolvedFormat::Txt => join_lines(emails).into_bytes(),
        ResolvedFormat::Xlsx => to_xlsx(emails)?,
    };

    tracing::debug!(
        "Encoded {} emails as {} ({} bytes)",
        emails.len(),
        resolved.extension(),
        bytes.len()
    );

    Ok(ExportedFile {
        file_name: output_file_name(input_name, resolved),
        media_type: resolved.media_type(),
        bytes,
    })
}

/// One email per line, no header, no quoting, no trailing newline.
pub fn join_lines(emails: &[String]) -> String {
    emails.join("\n")
}

/// Single-column workbook, one row per email, on a sheet named [`EXPORT_SHEET_NAME`].
pub fn to_xlsx(emails: &[String]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (row, email) in emails.iter().enumerate() {
        let row = u32::try_from(row).map_err(|_| ExportError::TooManyRows(emails.len()))?;
        worksheet.write_string(row, 0, email.as_str())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// `<basename>.<ext>` where basename is `input_name` without its directory and last extension.
pub fn output_file_name(input_name: &str, format: ResolvedFormat) -> String {
    let file_name = Utf8Path::new(input_name).file_name().unwrap_or(input_name);
    let base = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    let base = if base.is_empty() { FALLBACK_BASE_NAME } else { base };

    format!("{}.{}", base, format.extension())
}

/// Write an exported file into `dir`, returning the full path.
pub async fn write_to_dir(file: &ExportedFile, dir: &Utf8Path) -> Result<Utf8PathBuf> {
    if !dir.exists() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir))?;
    }

    let path = dir.join(&file.file_name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Failed to write export: {}", path))?;

    tracing::info!("Wrote {} ({}) to {}", file.file_name, file.media_type, path);
    Ok(path)
}
