//! Error types for the scanr-core library.
//!
//! Every failure carries a free-text message that front-ends surface to the
//! user verbatim; nothing in this library retries or reclassifies an error.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scanr-core operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Failure modes of the scan-session lifecycle.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScanError {
    /// The request named no output file.
    #[error("output name must not be empty")]
    EmptyOutputName,

    /// No enumerated device matched the requested display label.
    #[error("scanner '{0}' not found")]
    DeviceNotFound(String),

    /// A previous scan has not yet produced its outcome.
    #[error("a scan is already in progress")]
    Busy,

    /// The device rejected a configuration option.
    #[error("failed to set option '{option}': {message}")]
    Configuration {
        /// Name of the rejected option.
        option: String,
        /// The backend's rejection message.
        message: String,
    },

    /// The device failed while enumerating or while the read loop was
    /// pulling scan data.
    #[error("failed to read from scanner: {0}")]
    Acquisition(String),

    /// The session terminated normally but yielded zero pages.
    #[error("no image data")]
    NoImageData,

    /// The acquired page could not be written to disk.
    #[error("failed to write '{path}': {message}")]
    Persistence {
        /// The output path that could not be written.
        path: PathBuf,
        /// The underlying encode or I/O error.
        message: String,
    },

    /// An external capture application failed to run or produced no output.
    #[error("capture via '{command}' failed: {message}")]
    Capture {
        /// The external command that was invoked.
        command: String,
        /// What went wrong.
        message: String,
    },
}

impl ScanError {
    /// Creates a configuration error for a rejected option.
    pub fn configuration(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Creates an acquisition error.
    pub fn acquisition(message: impl Into<String>) -> Self {
        Self::Acquisition(message.into())
    }

    /// Creates a persistence error for an output path.
    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a capture error for an external command.
    pub fn capture(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capture {
            command: command.into(),
            message: message.into(),
        }
    }

    /// True for failures reported synchronously by the session controller,
    /// before any worker is started.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyOutputName | Self::DeviceNotFound(_) | Self::Busy
        )
    }
}
