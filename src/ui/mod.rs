// UI module - front-end glue around the cleaning pipeline
//
// This module contains:
// - SessionController: drives file selection, cleaning runs, export and bookmarks
// - report: terminal rendering of summaries, previews and bookmark lists

pub mod controller;
pub mod report;

pub use controller::{BookmarkSelection, SelectionSource, SessionController, SessionError};
