use std::io;
use thiserror::Error;

/// Custom error type for the fwatch application
#[derive(Error, Debug)]
pub enum FwatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Tool invocation failed: {0}")]
    ToolInvocation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed external state: {0}")]
    MalformedState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for the fwatch application
pub type Result<T> = std::result::Result<T, FwatchError>;

impl FwatchError {
    /// Create a tool invocation error
    pub fn tool_invocation<S: Into<String>>(msg: S) -> Self {
        FwatchError::ToolInvocation(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        FwatchError::Validation(msg.into())
    }

    /// Create a malformed external state error
    pub fn malformed_state<S: Into<String>>(msg: S) -> Self {
        FwatchError::MalformedState(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        FwatchError::Config(msg.into())
    }
}
