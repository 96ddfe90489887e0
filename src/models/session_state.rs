use crate::models::filter::CleaningSummary;
use camino::Utf8PathBuf;
use std::fmt;

/// Where the session is in the read → clean → export cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Reading,
    Cleaning,
    Ready,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Cleaning => "cleaning",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Single source of truth for the current session.
///
/// Holds the results of the most recent cleaning run so that presentation and
/// export read them from one place instead of ambient globals. Wrapped by
/// [`crate::state::StateManager`], which is the only thing that should mutate it.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    // Selected input
    pub input_file: Option<Utf8PathBuf>,
    /// Lower-cased extension of the input file, used to resolve "same as input"
    pub input_extension: String,

    // Runtime state
    pub status: RunStatus,
    pub status_text: String,

    // Results
    pub raw_count: usize,
    pub cleaned: Vec<String>,
    pub last_summary: Option<CleaningSummary>,
    pub last_error: Option<String>,
}

impl SessionState {
    /// True when a run finished and left something to export.
    pub fn has_exportable_result(&self) -> bool {
        self.status == RunStatus::Ready && !self.cleaned.is_empty()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, RunStatus::Reading | RunStatus::Cleaning)
    }

    /// Drop results of a previous run. The selected input is kept.
    pub fn reset_run(&mut self) {
        self.status = RunStatus::Idle;
        self.status_text.clear();
        self.raw_count = 0;
        self.cleaned.clear();
        self.last_summary = None;
        self.last_error = None;
    }
}
