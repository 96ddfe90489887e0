use crate::services::tokenizer::Tokenizer;
use calamine::{Data, Reader, Xlsx};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Cursor;
use thiserror::Error;

/// Extensions accepted when a file is handed over by a drag-and-drop source.
pub const DROP_EXTENSIONS: [&str; 3] = ["txt", "csv", "xlsx"];

/// Errors that can occur while turning an input file into candidates
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Unsupported file type '{0}'. Use .txt, .csv, or .xlsx")]
    UnsupportedFileType(String),

    #[error("Failed to read {path}: {source}")]
    FileReadFailure {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse spreadsheet: {0}")]
    SpreadsheetParseFailure(#[from] calamine::XlsxError),
}

/// How a file's content is flattened before tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.txt`, `.csv`, `.log`: tokenized once as a whole
    Text,
    /// `.xlsx`: tokenized cell by cell
    Spreadsheet,
}

impl FileKind {
    /// Classify a file by the extension of its name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ContentError> {
        match file_extension(name).as_deref() {
            Some("txt" | "csv" | "log") => Ok(Self::Text),
            Some("xlsx") => Ok(Self::Spreadsheet),
            _ => Err(ContentError::UnsupportedFileType(name.to_string())),
        }
    }
}

/// Lower-cased extension after the last `.` of a file name.
pub fn file_extension(name: &str) -> Option<String> {
    let file_name = Utf8Path::new(name).file_name().unwrap_or(name);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Whether a dropped file should be accepted. Narrower than [`FileKind::from_name`]:
/// `.log` files can be selected explicitly but not dropped.
pub fn accepts_drop(name: &str) -> bool {
    file_extension(name).is_some_and(|ext| DROP_EXTENSIONS.contains(&ext.as_str()))
}

/// A spreadsheet cell value with its type made explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Empty,
}

impl CellValue {
    /// Text handed to the tokenizer, or `None` for empty cells.
    pub fn stringify(&self) -> Option<String> {
        match self {
            Self::Text(s) if s.is_empty() => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Empty => None,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Boolean(*b),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::Error(_) | Data::Empty => Self::Empty,
        }
    }
}

/// Turns raw file content into an ordered list of email candidates.
///
/// Performs no filtering: duplicates and odd forms are passed through untouched
/// for the [`CleaningService`](crate::services::CleaningService) to handle.
#[derive(Debug, Clone, Default)]
pub struct ContentAdapter {
    tokenizer: Tokenizer,
}

impl ContentAdapter {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
        }
    }

    /// Read a file from disk and extract candidates from it.
    ///
    /// The file type is checked before anything is read.
    pub async fn read_file(&self, path: &Utf8Path) -> Result<Vec<String>, ContentError> {
        let name = path.file_name().unwrap_or(path.as_str());
        FileKind::from_name(name)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ContentError::FileReadFailure {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Read {} bytes from {}", bytes.len(), path);

        self.extract(name, &bytes)
    }

    /// Extract candidates from in-memory content, dispatching on `name`'s extension.
    pub fn extract(&self, name: &str, bytes: &[u8]) -> Result<Vec<String>, ContentError> {
        let candidates = match FileKind::from_name(name)? {
            FileKind::Text => self.extract_from_text(bytes),
            FileKind::Spreadsheet => self.extract_from_workbook(bytes)?,
        };

        tracing::info!("Extracted {} candidates from {}", candidates.len(), name);
        Ok(candidates)
    }

    fn extract_from_text(&self, bytes: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(bytes);
        self.tokenizer.extract(&text)
    }

    /// Sheets in workbook order, rows top to bottom, cells left to right.
    fn extract_from_workbook(&self, bytes: &[u8]) -> Result<Vec<String>, ContentError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let mut candidates = Vec::new();

        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name)?;
            let before = candidates.len();

            for row in range.rows() {
                for cell in row {
                    if let Some(text) = CellValue::from(cell).stringify() {
                        candidates.extend(self.tokenizer.extract(&text));
                    }
                }
            }

            tracing::debug!(
                "Sheet '{}': {} candidates",
                sheet_name,
                candidates.len() - before
            );
        }

        Ok(candidates)
    }
}
