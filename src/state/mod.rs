// State management module
//
// This module provides the StateManager which wraps SessionState with thread-safe access
// using Arc<RwLock<T>> and emits change events for front-end updates.

use crate::models::{RunStatus, SessionState};
use crate::services::cleaning::CleanResult;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// Front ends subscribe to these instead of polling the session state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A new input file was selected
    FileSelected { path: Utf8PathBuf },

    /// The run moved to a new status
    StatusChanged { status: RunStatus, text: String },

    /// A run completed and results are available
    RunFinished { original: usize, kept: usize },

    /// A run aborted with an error
    RunFailed { message: String },
}

/// Thread-safe session state with event emission
///
/// The application-level session object: it owns the current input, the last
/// cleaned list and summary, and the run status. Every mutation goes through
/// [`update()`](Self::update), which diffs old and new state and broadcasts
/// [`StateChange`] events.
///
/// # Related Types
///
/// - [`crate::models::SessionState`]: The underlying state structure
/// - [`crate::ui::SessionController`]: Drives runs and is the primary writer
pub struct StateManager {
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100-event channel buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            state_tx,
        }
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let kept = state_manager.read(|state| state.cleaned.len());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &SessionState, new: &SessionState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.input_file != new.input_file {
            if let Some(path) = &new.input_file {
                changes.push(StateChange::FileSelected { path: path.clone() });
            }
        }

        if old.status != new.status || old.status_text != new.status_text {
            changes.push(StateChange::StatusChanged {
                status: new.status,
                text: new.status_text.clone(),
            });
        }

        if old.status != new.status {
            match new.status {
                RunStatus::Ready => {
                    let original = new.last_summary.map(|s| s.original).unwrap_or(0);
                    changes.push(StateChange::RunFinished {
                        original,
                        kept: new.cleaned.len(),
                    });
                }
                RunStatus::Failed => {
                    changes.push(StateChange::RunFailed {
                        message: new.last_error.clone().unwrap_or_default(),
                    });
                }
                _ => {}
            }
        }

        changes
    }

    // Convenience methods for common state updates

    /// Select an input file, discarding the previous run's results
    pub fn select_file(&self, path: &Utf8Path) -> Vec<StateChange> {
        let extension = crate::services::content::file_extension(path.as_str()).unwrap_or_default();
        self.update(|state| {
            state.reset_run();
            state.input_file = Some(path.to_path_buf());
            state.input_extension = extension;
        })
    }

    /// Mark the start of a run: results of any previous run are dropped
    ///
    /// Returns `None` and leaves the state untouched when a run is already in
    /// progress. The check and the transition share one write lock.
    pub fn begin_reading(&self) -> Option<Vec<StateChange>> {
        let mut started = false;
        let changes = self.update(|state| {
            if state.is_running() {
                return;
            }
            state.reset_run();
            state.status = RunStatus::Reading;
            state.status_text = "Processing...".to_string();
            started = true;
        });
        started.then_some(changes)
    }

    /// Candidates were extracted; filtering is about to run
    pub fn begin_cleaning(&self, raw_count: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.raw_count = raw_count;
            state.status = RunStatus::Cleaning;
            state.status_text = format!("Cleaning {} candidates...", raw_count);
        })
    }

    /// Record the result of a completed run
    pub fn finish_run(&self, result: CleanResult) -> Vec<StateChange> {
        self.update(|state| {
            state.status = RunStatus::Ready;
            state.status_text = result.summary.describe();
            state.cleaned = result.emails;
            state.last_summary = Some(result.summary);
            state.last_error = None;
        })
    }

    /// Record a failed run
    pub fn fail_run(&self, message: String) -> Vec<StateChange> {
        self.update(|state| {
            state.status = RunStatus::Failed;
            state.status_text = "Error occurred.".to_string();
            state.cleaned.clear();
            state.last_summary = None;
            state.last_error = Some(message);
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
