//! Data models for MailSift.
//!
//! - [`FilterConfiguration`]: immutable options for one cleaning run
//! - [`CleaningSummary`]: per-rule removal counts produced by a run
//! - [`OutputFormat`] / [`ResolvedFormat`]: requested and resolved export encodings
//! - [`SessionState`]: results of the current session, owned by [`StateManager`](crate::state::StateManager)
//! - [`UserConfig`]: user settings loaded from `settings.yaml`

pub mod config;
pub mod filter;
pub mod session_state;

pub use config::{
    FilterSettings, LoggingSettings, MAX_PREVIEW_COUNT, MIN_PREVIEW_COUNT, PreviewSettings,
    UserConfig, clamp_preview_count,
};
pub use filter::{
    CleaningSummary, FilterConfiguration, OutputFormat, ParseFormatError, ResolvedFormat,
    parse_keyword_list,
};
pub use session_state::{RunStatus, SessionState};
