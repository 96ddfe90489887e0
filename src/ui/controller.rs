// Session Controller - drives cleaning runs for a front end
//
// This module contains the SessionController which coordinates between:
// - StateManager (session state and change events)
// - ContentAdapter / CleaningService (extraction and filtering)
// - Export encoding
// - BookmarkStore (saved keyword filters)

use crate::metrics::Metrics;
use crate::models::{CleaningSummary, FilterConfiguration, OutputFormat, parse_keyword_list};
use crate::services::bookmarks::{self, BookmarkError, BookmarkStore};
use crate::services::content::{self, ContentAdapter, ContentError};
use crate::services::export::{self, ExportedFile};
use crate::services::CleaningService;
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please choose a file")]
    NoFileSelected,

    #[error("A cleaning run is already in progress")]
    RunInProgress,

    #[error("Refusing to overwrite the input file {0}")]
    WouldOverwriteInput(Utf8PathBuf),
}

/// How the input file reached the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    /// Explicitly chosen (command-line argument or file picker)
    Picker,
    /// Dropped onto the front end; only `.txt`, `.csv` and `.xlsx` are accepted
    Drop,
}

/// Which saved bookmark to pull keywords from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkSelection {
    MostRecent,
    Index(usize),
}

/// Application-level session object
///
/// Owns one [`StateManager`] and runs read → tokenize → clean for the selected
/// file. Each run works on its own candidate list and configuration snapshot;
/// results land in the session state where export and presentation pick them up.
///
/// # Example
/// ```ignore
/// let controller = SessionController::new(state, bookmarks, metrics);
/// controller.select_file("list.csv".into(), SelectionSource::Picker)?;
/// let summary = controller.run(&filter_config).await?;
/// let written = controller.export_to_dir(OutputFormat::SameAsInput, out_dir).await?;
/// ```
pub struct SessionController {
    state_manager: Arc<StateManager>,
    adapter: ContentAdapter,
    cleaning: CleaningService,
    bookmarks: Arc<dyn BookmarkStore>,
    metrics: Arc<Metrics>,
}

impl SessionController {
    pub fn new(
        state_manager: Arc<StateManager>,
        bookmarks: Arc<dyn BookmarkStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        tracing::debug!("Session controller initialized");
        Self {
            state_manager,
            adapter: ContentAdapter::new(),
            cleaning: CleaningService::new(),
            bookmarks,
            metrics,
        }
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state_manager
    }

    /// Select the input file for the next run.
    ///
    /// Dropped files are rejected unless they end in `.txt`, `.csv` or `.xlsx`;
    /// in that case the previous selection is kept.
    pub fn select_file(&self, path: &Utf8Path, source: SelectionSource) -> Result<(), ContentError> {
        if source == SelectionSource::Drop && !content::accepts_drop(path.as_str()) {
            tracing::warn!("Rejected dropped file: {}", path);
            return Err(ContentError::UnsupportedFileType(path.to_string()));
        }

        tracing::info!("Selected input file: {}", path);
        self.state_manager.select_file(path);
        Ok(())
    }

    /// Read, tokenize and clean the selected file.
    ///
    /// The file read is the only await point. On failure the session is left in
    /// the `Failed` state with the error message and the error is returned.
    pub async fn run(&self, config: &FilterConfiguration) -> Result<CleaningSummary> {
        let path = self
            .state_manager
            .read(|s| s.input_file.clone())
            .ok_or(SessionError::NoFileSelected)?;

        if self.state_manager.begin_reading().is_none() {
            return Err(SessionError::RunInProgress.into());
        }

        let start = Instant::now();
        tracing::info!("Starting cleaning run for {}", path);

        let candidates = match self.adapter.read_file(&path).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!("Cleaning run failed for {}: {}", path, e);
                self.state_manager.fail_run(e.to_string());
                self.metrics.record_run_failed(start.elapsed());
                return Err(e.into());
            }
        };

        self.state_manager.begin_cleaning(candidates.len());
        let result = self.cleaning.clean(&candidates, config);
        let summary = result.summary;

        self.state_manager.finish_run(result);
        self.metrics.record_run_completed(&summary, start.elapsed());

        tracing::info!(
            "Cleaning run finished in {:.2}s: {} of {} kept ({})",
            start.elapsed().as_secs_f32(),
            summary.kept,
            summary.original,
            summary.describe()
        );

        Ok(summary)
    }

    /// Encode the current result. `None` when there is nothing to export.
    ///
    /// "Same as input" resolves against the extension recorded when the file
    /// was selected.
    pub fn export(&self, format: OutputFormat) -> Result<Option<ExportedFile>> {
        let (emails, input_file, input_extension, exportable) = self.state_manager.read(|s| {
            (
                s.cleaned.clone(),
                s.input_file.clone(),
                s.input_extension.clone(),
                s.has_exportable_result(),
            )
        });

        if !exportable {
            tracing::info!("Nothing to export");
            return Ok(None);
        }

        let input_name = input_file
            .as_ref()
            .and_then(|p| p.file_name())
            .unwrap_or_default();

        let resolved = format.resolve(&input_extension);
        let file = export::export_resolved(&emails, resolved, input_name)
            .context("Failed to encode export")?;
        Ok(Some(file))
    }

    /// Encode the current result and write it into `dir`.
    ///
    /// Fails instead of replacing the input file.
    pub async fn export_to_dir(
        &self,
        format: OutputFormat,
        dir: &Utf8Path,
    ) -> Result<Option<Utf8PathBuf>> {
        let Some(file) = self.export(format)? else {
            return Ok(None);
        };

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", dir))?;

        if let Some(input) = self.state_manager.read(|s| s.input_file.clone()) {
            if is_same_file(&dir.join(&file.file_name), &input) {
                return Err(SessionError::WouldOverwriteInput(input).into());
            }
        }

        let path = export::write_to_dir(&file, dir).await?;
        self.metrics.record_export();
        Ok(Some(path))
    }

    // Bookmark operations. Failures are reported to the caller but never
    // touch the session state.

    /// Saved keyword strings; a corrupt store reads as empty.
    pub fn bookmarks(&self) -> Vec<String> {
        bookmarks::load_all_or_empty(self.bookmarks.as_ref())
    }

    /// Saved keyword strings, surfacing a corrupt store so the user can be told.
    pub fn try_bookmarks(&self) -> Result<Vec<String>, BookmarkError> {
        self.bookmarks.load_all()
    }

    pub fn save_bookmark(&self, keywords: &str) -> Result<(), BookmarkError> {
        self.bookmarks.save(keywords)
    }

    pub fn delete_bookmark(&self, index: usize) -> Result<(), BookmarkError> {
        self.bookmarks.delete(index)
    }

    /// Raw keyword string of a saved bookmark.
    pub fn bookmark(&self, selection: BookmarkSelection) -> Result<String, BookmarkError> {
        match selection {
            BookmarkSelection::MostRecent => self.bookmarks.load_most_recent(),
            BookmarkSelection::Index(index) => self.bookmarks.get(index),
        }
    }

    /// Parsed keywords of a saved bookmark, falling back to `fallback` if it cannot be loaded.
    pub fn bookmark_keywords_or(
        &self,
        selection: BookmarkSelection,
        fallback: Vec<String>,
    ) -> Vec<String> {
        match self.bookmark(selection) {
            Ok(raw) => {
                tracing::info!("Using saved keywords: {}", raw);
                parse_keyword_list(&raw)
            }
            Err(e) => {
                tracing::warn!("Could not load saved keywords: {}", e);
                fallback
            }
        }
    }
}

/// Compare two paths by their canonical form, so `dir/sub/../a.txt` matches
/// `dir/a.txt`. A path that cannot be canonicalized (missing file) is
/// compared after canonicalizing its parent.
fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn canonical(path: &Utf8Path) -> Option<Utf8PathBuf> {
    if let Ok(resolved) = path.canonicalize_utf8() {
        return Some(resolved);
    }

    let file_name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    parent
        .canonicalize_utf8()
        .ok()
        .map(|parent| parent.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use crate::services::bookmarks::{KvBookmarkStore, MemoryKvStore, MockBookmarkStore};
    use tempfile::TempDir;

    fn controller_with(store: Arc<dyn BookmarkStore>) -> SessionController {
        SessionController::new(Arc::new(StateManager::new()), store, Arc::new(Metrics::new()))
    }

    fn controller() -> SessionController {
        controller_with(Arc::new(KvBookmarkStore::new(MemoryKvStore::new())))
    }

    fn write_input(dir: &TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn all_rules() -> FilterConfiguration {
        FilterConfiguration {
            remove_duplicates: true,
            remove_invalid: true,
            remove_single_char_local: true,
            remove_numeric_start_local: true,
            keywords: vec!["spam".to_string()],
            output_format: OutputFormat::SameAsInput,
        }
    }

    #[tokio::test]
    async fn test_run_without_file() {
        let controller = controller();
        let err = controller.run(&all_rules()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<SessionError>(),
            Some(&SessionError::NoFileSelected)
        );
    }

    #[tokio::test]
    async fn test_run_and_export() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(
            &temp_dir,
            "contacts.txt",
            "bob@x.com; a@x.com; 1st@x.com; BOB@x.com; deals@spam.com\r\nalice@y.org",
        );
        let controller = controller();
        controller.select_file(&input, SelectionSource::Picker).unwrap();

        let summary = controller.run(&all_rules()).await.unwrap();

        assert_eq!(summary.original, 6);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.removed_single_char, 1);
        assert_eq!(summary.removed_numeric_start, 1);
        assert_eq!(summary.removed_keywords, 1);
        assert_eq!(summary.removed_duplicates, 1);
        assert_eq!(
            controller.state().read(|s| s.cleaned.clone()),
            vec!["bob@x.com", "alice@y.org"]
        );

        let in_place = controller
            .export_to_dir(OutputFormat::SameAsInput, input.parent().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            in_place.downcast_ref::<SessionError>(),
            Some(SessionError::WouldOverwriteInput(_))
        ));

        let out_dir = Utf8PathBuf::try_from(temp_dir.path().join("out")).unwrap();
        let written = controller
            .export_to_dir(OutputFormat::SameAsInput, &out_dir)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written, out_dir.join("contacts.txt"));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            "bob@x.com\nalice@y.org"
        );
    }

    #[tokio::test]
    async fn test_export_refuses_input_through_other_spelling() {
        let temp_dir = TempDir::new().unwrap();
        let original = "ok@a.com\njunk line\nzz@b.com";
        let input = write_input(&temp_dir, "signups.txt", original);
        let dir = input.parent().unwrap().to_path_buf();
        let controller = controller();
        controller.select_file(&input, SelectionSource::Picker).unwrap();
        controller.run(&all_rules()).await.unwrap();

        let roundabout = dir.join("sub").join("..");
        let err = controller
            .export_to_dir(OutputFormat::SameAsInput, &roundabout)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::WouldOverwriteInput(_))
        ));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);

        // A different format in the same directory is a different file
        let written = controller
            .export_to_dir(OutputFormat::Csv, &roundabout)
            .await
            .unwrap()
            .unwrap();
        assert!(written.as_str().ends_with("signups.csv"));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), original);
    }

    #[tokio::test]
    async fn test_run_refused_while_running() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "list.csv", "bob@x.com");
        let controller = controller();
        controller.select_file(&input, SelectionSource::Picker).unwrap();
        controller.state().begin_reading().unwrap();

        let err = controller.run(&all_rules()).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<SessionError>(),
            Some(&SessionError::RunInProgress)
        );
        assert_eq!(controller.state().read(|s| s.status), RunStatus::Reading);
    }

    #[test]
    fn test_same_as_input_uses_selected_extension() {
        let controller = controller();
        controller
            .select_file(Utf8Path::new("exports/Contacts.TXT"), SelectionSource::Picker)
            .unwrap();
        controller.state().finish_run(crate::services::CleanResult {
            emails: vec!["a@x.com".to_string()],
            summary: CleaningSummary {
                original: 1,
                kept: 1,
                ..Default::default()
            },
        });

        let file = controller.export(OutputFormat::SameAsInput).unwrap().unwrap();

        assert_eq!(file.file_name, "Contacts.txt");
        assert_eq!(file.media_type, "text/plain");
    }

    #[tokio::test]
    async fn test_empty_result_is_not_exported() {
        let temp_dir = TempDir::new().unwrap();
        let input = write_input(&temp_dir, "empty.csv", "nothing useful here");
        let controller = controller();
        controller.select_file(&input, SelectionSource::Picker).unwrap();

        let summary = controller.run(&all_rules()).await.unwrap();

        assert_eq!(summary.kept, 0);
        assert!(controller.export(OutputFormat::Csv).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_failure_sets_failed_state() {
        let controller = controller();
        controller
            .select_file(Utf8Path::new("/nonexistent/list.csv"), SelectionSource::Picker)
            .unwrap();

        let err = controller.run(&all_rules()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::FileReadFailure { .. })
        ));
        let state = controller.state().snapshot();
        assert_eq!(state.status, RunStatus::Failed);
        assert!(state.last_error.is_some());
    }

    #[test]
    fn test_drop_rejects_log_files() {
        let controller = controller();
        let result = controller.select_file(Utf8Path::new("server.log"), SelectionSource::Drop);
        assert!(matches!(result, Err(ContentError::UnsupportedFileType(_))));
        assert!(controller.state().read(|s| s.input_file.is_none()));

        // Explicit selection accepts the same file
        controller
            .select_file(Utf8Path::new("server.log"), SelectionSource::Picker)
            .unwrap();
        assert!(controller.state().read(|s| s.input_file.is_some()));
    }

    #[test]
    fn test_bookmark_keywords_from_mock() {
        let mut mock = MockBookmarkStore::new();
        mock.expect_load_most_recent()
            .times(1)
            .returning(|| Ok("spam, promo ,".to_string()));
        let controller = controller_with(Arc::new(mock));

        let keywords = controller.bookmark_keywords_or(BookmarkSelection::MostRecent, Vec::new());

        assert_eq!(keywords, vec!["spam", "promo"]);
    }

    #[test]
    fn test_bookmark_failure_falls_back() {
        let mut mock = MockBookmarkStore::new();
        mock.expect_get()
            .returning(|index| Err(BookmarkError::IndexOutOfRange { index, len: 0 }));
        let controller = controller_with(Arc::new(mock));

        let keywords =
            controller.bookmark_keywords_or(BookmarkSelection::Index(3), vec!["keep".to_string()]);

        assert_eq!(keywords, vec!["keep"]);
    }

    #[test]
    fn test_corrupt_bookmarks_read_as_empty() {
        let mut mock = MockBookmarkStore::new();
        mock.expect_load_all()
            .returning(|| Err(BookmarkError::CorruptBookmarkStore("bad json".to_string())));
        let controller = controller_with(Arc::new(mock));

        assert!(controller.bookmarks().is_empty());
    }
}
