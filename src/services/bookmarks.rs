use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use thiserror::Error;

/// Key under which the bookmark list is stored.
pub const BOOKMARKS_KEY: &str = "emailFilterKeywords";

/// Errors from bookmark operations. All of them are recoverable.
#[derive(Error, Debug)]
pub enum BookmarkError {
    #[error("Please enter keywords to save")]
    EmptyKeyword,

    #[error("These keywords are already saved: {0}")]
    DuplicateBookmark(String),

    #[error("Saved keywords could not be read: {0}")]
    CorruptBookmarkStore(String),

    #[error("No saved keywords found")]
    NoBookmarks,

    #[error("No saved keywords at position {index} (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Bookmark storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Saved keyword-filter strings.
#[cfg_attr(test, mockall::automock)]
pub trait BookmarkStore: Send + Sync {
    /// Append `keywords` (trimmed) unless an identical entry exists.
    fn save(&self, keywords: &str) -> Result<(), BookmarkError>;

    /// All entries in save order. Missing storage reads as empty.
    fn load_all(&self) -> Result<Vec<String>, BookmarkError>;

    /// The last saved entry.
    fn load_most_recent(&self) -> Result<String, BookmarkError>;

    /// The entry at `index`.
    fn get(&self, index: usize) -> Result<String, BookmarkError>;

    /// Remove the entry at `index`.
    fn delete(&self, index: usize) -> Result<(), BookmarkError>;
}

/// String key-value storage, the persistence seam under [`KvBookmarkStore`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Key-value store kept in memory. Used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key-value store persisted as a JSON object in a single file.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so readers never observe a partial write.
#[derive(Debug)]
pub struct JsonFileKvStore {
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl JsonFileKvStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<IndexMap<String, String>> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path))?;
        if contents.trim().is_empty() {
            return Ok(IndexMap::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse storage file: {}", self.path))
    }
}

impl KeyValueStore for JsonFileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create storage directory: {}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(&map).context("Failed to serialize storage")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write storage file: {}", tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace storage file: {}", self.path))?;

        tracing::debug!("Stored key '{}' in {}", key, self.path);
        Ok(())
    }
}

/// [`BookmarkStore`] keeping a JSON array under [`BOOKMARKS_KEY`] in a key-value store.
#[derive(Debug)]
pub struct KvBookmarkStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> KvBookmarkStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    fn read(&self) -> Result<Vec<String>, BookmarkError> {
        let Some(raw) = self.kv.get(BOOKMARKS_KEY).map_err(storage_error)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
            tracing::warn!("Bookmark entry '{}' is not a JSON string list: {}", BOOKMARKS_KEY, e);
            BookmarkError::CorruptBookmarkStore(e.to_string())
        })
    }

    fn write(&self, bookmarks: &[String]) -> Result<(), BookmarkError> {
        let json = serde_json::to_string(bookmarks)
            .context("Failed to serialize bookmarks")?;
        self.kv.set(BOOKMARKS_KEY, &json).map_err(storage_error)?;
        Ok(())
    }
}

/// Unparseable storage is corrupt; anything else is an I/O failure.
fn storage_error(err: anyhow::Error) -> BookmarkError {
    if err.downcast_ref::<serde_json::Error>().is_some() {
        tracing::warn!("Bookmark storage is not valid JSON: {:#}", err);
        BookmarkError::CorruptBookmarkStore(format!("{:#}", err))
    } else {
        BookmarkError::Storage(err)
    }
}

impl<S: KeyValueStore> BookmarkStore for KvBookmarkStore<S> {
    fn save(&self, keywords: &str) -> Result<(), BookmarkError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(BookmarkError::EmptyKeyword);
        }

        let mut bookmarks = self.read()?;
        if bookmarks.iter().any(|saved| saved == keywords) {
            return Err(BookmarkError::DuplicateBookmark(keywords.to_string()));
        }
        bookmarks.push(keywords.to_string());

        self.write(&bookmarks)?;
        tracing::info!("Saved bookmark #{}: {}", bookmarks.len() - 1, keywords);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<String>, BookmarkError> {
        self.read()
    }

    fn load_most_recent(&self) -> Result<String, BookmarkError> {
        self.read()?.pop().ok_or(BookmarkError::NoBookmarks)
    }

    fn get(&self, index: usize) -> Result<String, BookmarkError> {
        let bookmarks = self.read()?;
        let len = bookmarks.len();
        bookmarks
            .get(index)
            .cloned()
            .ok_or(BookmarkError::IndexOutOfRange { index, len })
    }

    fn delete(&self, index: usize) -> Result<(), BookmarkError> {
        let mut bookmarks = self.read()?;
        let len = bookmarks.len();
        if index >= len {
            return Err(BookmarkError::IndexOutOfRange { index, len });
        }
        let removed = bookmarks.remove(index);

        self.write(&bookmarks)?;
        tracing::info!("Deleted bookmark #{}: {}", index, removed);
        Ok(())
    }
}

/// Load all bookmarks, treating a corrupt store as empty.
pub fn load_all_or_empty(store: &dyn BookmarkStore) -> Vec<String> {
    match store.load_all() {
        Ok(bookmarks) => bookmarks,
        Err(e) => {
            tracing::warn!("Treating bookmarks as empty: {}", e);
            Vec::new()
        }
    }
}
