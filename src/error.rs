//! Error types for radioquery
//!
//! This module provides the error handling for the library, including:
//! - A single crate-wide [`Error`] enum with contextual variants
//! - The closed failure taxonomy ([`ErrorKind`]) reported to callers
//! - Structured error details attached to failed cutout results

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for radioquery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for radioquery
///
/// Each variant carries enough context to explain the failure in a log line.
/// Use [`Error::kind`] to branch on the failure category.
#[derive(Debug, Error)]
pub enum Error {
    /// The sky position cannot be represented (out of range, not finite, unparsable)
    #[error("coordinate format error: {0}")]
    Format(String),

    /// A query was constructed with malformed arguments
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_attempts")
        key: Option<String>,
    },

    /// Transport-level HTTP failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The archive answered with a non-success HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// HTTP status code returned by the archive
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The exchange did not complete in time (request timeout or polling budget)
    #[error("timed out: {0}")]
    Timeout(String),

    /// No VLASS tile covers the requested position
    #[error(
        "no tile covers RA={ra_deg:.5} Dec={dec_deg:.5}{}",
        nearest.as_ref().map(|(name, sep)| format!(" (nearest {name} at {sep:.3} deg)")).unwrap_or_default()
    )]
    NoCoverage {
        /// Right ascension of the target in degrees
        ra_deg: f64,
        /// Declination of the target in degrees
        dec_deg: f64,
        /// Nearest tile and its separation in degrees, if the index is not empty
        nearest: Option<(String, f64)>,
    },

    /// The archive returned a payload that is not a usable image
    #[error("invalid response: {reason}")]
    InvalidResponse {
        /// Why the payload was rejected
        reason: String,
    },

    /// The VLASS tile index could not be loaded
    #[error("tile index error: {0}")]
    TileIndex(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure category reported to callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input coordinate or construction argument (caller bug)
    Format,
    /// Transient network failure, terminal only once the retry budget is spent
    Network,
    /// The VLASS tile lookup found no covering tile
    NoCoverage,
    /// The archive returned a payload failing validation
    InvalidResponse,
    /// Local filesystem failure
    Io,
    /// Invalid configuration or unavailable tile index
    Config,
}

impl ErrorKind {
    /// Machine-readable error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Format => "format_error",
            ErrorKind::Network => "network_error",
            ErrorKind::NoCoverage => "no_coverage",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Io => "io_error",
            ErrorKind::Config => "config_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Map this error onto the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format(_) | Error::InvalidArgument(_) => ErrorKind::Format,
            Error::Network(_) | Error::Timeout(_) => ErrorKind::Network,
            // Statuses worth retrying are the archive being temporarily unavailable;
            // anything else means the archive rejected the request.
            Error::HttpStatus { status, .. } => {
                if is_transient_status(*status) {
                    ErrorKind::Network
                } else {
                    ErrorKind::InvalidResponse
                }
            }
            Error::NoCoverage { .. } => ErrorKind::NoCoverage,
            Error::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Error::Io(_) => ErrorKind::Io,
            Error::Config { .. } | Error::TileIndex(_) | Error::Serialization(_) => {
                ErrorKind::Config
            }
        }
    }

    pub(crate) fn invalid_response(reason: impl Into<String>) -> Self {
        Error::InvalidResponse {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// HTTP statuses that indicate a temporary archive-side condition
pub(crate) fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

/// Error information attached to a failed cutout result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl From<&Error> for ErrorDetail {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
