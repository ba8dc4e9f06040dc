//! Error types for the spy tool.
//!
//! Every error is terminal: the binary prints it to stderr and exits
//! nonzero. There are no retries and no partial-success modes.

use thiserror::Error;

/// Which half of the driver a port belongs to. Only used for error display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpyError {
    /// The underlying MIDI subsystem could not be initialized at all.
    #[error("MIDI driver unavailable: {0}")]
    DriverInit(String),

    /// The requested port index does not exist or the port refused to open.
    #[error("cannot open {direction} port {index} ({available} {direction} ports available): {reason}")]
    PortOpen {
        direction: PortDirection,
        index: usize,
        available: usize,
        reason: String,
    },

    /// Malformed or missing command-line arguments.
    #[error("{0}")]
    Argument(String),

    /// Forwarding a received message to the output port failed mid-stream.
    #[error("relay to output port failed: {0}")]
    Relay(String),
}

impl SpyError {
    pub fn is_argument(&self) -> bool {
        matches!(self, SpyError::Argument(_))
    }
}

impl From<midir::InitError> for SpyError {
    fn from(e: midir::InitError) -> Self {
        SpyError::DriverInit(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpyError>;
