//! Services module - the extraction and filtering pipeline.
//!
//! Everything here is independent of the command-line front end and takes all
//! inputs as explicit parameters.
//!
//! # Components
//!
//! - [`Tokenizer`]: finds email-shaped substrings in text
//! - [`ContentAdapter`]: flattens `.txt`/`.csv`/`.log` text or `.xlsx` workbooks and
//!   runs the tokenizer over them
//! - [`CleaningService`]: the ordered removal rules, producing a [`CleanResult`]
//! - [`export`](export::export): csv / txt / xlsx encoding of a cleaned list
//! - [`BookmarkStore`]: saved keyword filters in a key-value store
//!
//! # Flow
//!
//! ```ignore
//! let candidates = ContentAdapter::new().read_file(path).await?;
//! let result = CleaningService::new().clean(&candidates, &filter_config);
//! let file = export::export(&result.emails, filter_config.output_format, "list.csv")?;
//! ```

pub mod bookmarks;
pub mod cleaning;
pub mod content;
pub mod export;
pub mod tokenizer;

pub use bookmarks::{
    BOOKMARKS_KEY, BookmarkError, BookmarkStore, JsonFileKvStore, KeyValueStore, KvBookmarkStore,
    MemoryKvStore,
};
pub use cleaning::{CleanResult, CleaningService};
pub use content::{CellValue, ContentAdapter, ContentError, FileKind, accepts_drop};
pub use export::{ExportError, ExportedFile};
pub use tokenizer::Tokenizer;
