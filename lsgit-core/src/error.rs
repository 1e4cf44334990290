//! Error types for lsgit

use thiserror::Error;

/// Result type alias for lsgit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for configuration and host I/O
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Failure of one stage of a refresh chain
///
/// Every stage returns one of these instead of panicking; the chain's terminal
/// handler matches on the kind once.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The probe process could not be started
    #[error("failed to start status probe: {reason}")]
    ProbeSpawn {
        /// Why the spawn failed
        reason: String,
    },

    /// The probe wrote to its diagnostic stream, invalidating the batch
    #[error("status probe reported diagnostics: {}", raw_err.trim_end())]
    ProbeOutput {
        /// Everything the probe wrote to stdout
        raw_out: String,
        /// Everything the probe wrote to stderr
        raw_err: String,
    },

    /// The probe output could not be parsed into status records
    #[error("failed to parse status probe output: {reason}")]
    Parse {
        /// The unparsed probe output
        raw_text: String,
        /// Parser message
        reason: String,
    },

    /// The listing was closed or invalidated while rendering
    #[error("listing target '{target}' is no longer available")]
    RenderTargetGone {
        /// Identity of the target
        target: String,
    },
}

impl PipelineError {
    /// Whether this failure is expected under normal navigation
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::RenderTargetGone { .. })
    }
}
