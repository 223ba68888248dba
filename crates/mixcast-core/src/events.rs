//! Events emitted by the engine to observers.

use serde::{Deserialize, Serialize};

use crate::metrics::StreamMetrics;
use crate::state::StreamState;

/// Events the engine can emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// The streaming loop changed state.
    StateChanged {
        /// Previous state.
        previous: StreamState,

        /// Current state.
        current: StreamState,
    },

    /// A scene was registered (or replaced) under this name.
    SceneCreated { name: String },

    /// The streaming loop was launched.
    StreamStarted,

    /// The streaming loop exited and was joined.
    StreamStopped,

    /// Periodic metrics snapshot from the loop.
    Metrics(StreamMetrics),

    /// The engine has shut down.
    Shutdown,
}
