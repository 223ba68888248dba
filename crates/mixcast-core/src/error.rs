//! Error types shared across mixcast crates.

use thiserror::Error;

/// Errors a component can report through its contract.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Prerequisite resources could not be acquired.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// An encoder rejected a frame.
    #[error("encode failed: {0}")]
    Encode(String),

    /// An output could not start or deliver.
    #[error("output failed: {0}")]
    Output(String),

    /// The operation requires an initialized component.
    #[error("component not initialized")]
    NotInitialized,

    /// A frame failed validation.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

/// Result type for component operations.
pub type ComponentResult<T> = Result<T, ComponentError>;
