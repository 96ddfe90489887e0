// MailSift - extract, filter and export email lists
//
// This is the library crate containing the extraction pipeline, session state
// and persistence. The binary crate (main.rs) provides the command-line front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{CleaningSummary, FilterConfiguration, OutputFormat, SessionState, UserConfig};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
