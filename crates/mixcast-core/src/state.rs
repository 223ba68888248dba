//! Streaming-loop state machine types.

use serde::{Deserialize, Serialize};

/// State of the background streaming loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    /// No streaming thread is running.
    #[default]
    Idle,

    /// The loop is ticking.
    Running,

    /// The stop signal was observed; the loop is finishing its current tick.
    Stopping,
}

impl StreamState {
    /// Returns true if no streaming thread is running.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if the loop is ticking.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the loop is winding down.
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping)
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }
}
