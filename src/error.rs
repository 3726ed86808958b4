//! Engine error type.
//!
//! Construction problems and broken invariants are programming errors and are
//! never caught inside the engine; they propagate to whoever called the
//! failing operation. Image loading is the only transient failure and the
//! engine never retries it by itself.

use std::fmt;

/// Why an image could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageLoadReason {
    /// The loader did not answer within the allotted time.
    Timeout { waited_ms: u64 },
    /// The file could not be read or decoded.
    Decode(String),
    /// The loader thread is gone (shut down or panicked).
    WorkerGone,
}

impl fmt::Display for ImageLoadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoadReason::Timeout { waited_ms } => write!(f, "timed out after {} ms", waited_ms),
            ImageLoadReason::Decode(msg) => write!(f, "{}", msg),
            ImageLoadReason::WorkerGone => write!(f, "image loader thread is not running"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A required construction argument is missing or invalid.
    Configuration(String),
    /// An image could not be resolved for sprite creation.
    ImageLoad { path: String, reason: ImageLoadReason },
    /// The caller broke an invariant of an engine object.
    InvariantViolation(String),
    /// An optional capability that the current backend does not provide.
    Unimplemented(&'static str),
    /// The configuration file could not be read or written.
    Config(String),
}

impl EngineError {
    /// True for errors a caller may sensibly retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::ImageLoad {
                reason: ImageLoadReason::Timeout { .. },
                ..
            }
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            EngineError::ImageLoad { path, reason } => {
                write!(f, "Failed to load image '{}': {}", path, reason)
            }
            EngineError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            EngineError::Unimplemented(what) => write!(f, "Not implemented: {}", what),
            EngineError::Config(msg) => write!(f, "Config file error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, EngineError>;
