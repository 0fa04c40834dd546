//! Error types for sfxkit

use crate::exit_codes::{
    EXIT_CONFIG_ERROR, EXIT_DEPENDENCY_ERROR, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_IO_ERROR,
    EXIT_PRECONDITION_ERROR, EXIT_PROCESS_ERROR, EXIT_VERIFICATION_ERROR,
};
use std::fmt;

/// Main error type for sfxkit operations
#[derive(Debug)]
pub enum SfxError {
    /// A required input is missing, empty or of the wrong kind
    Precondition(String),

    /// Installation root, bundled binary or staged artifact is absent
    MissingDependency(String),

    /// External process exited with a non-zero code
    ProcessFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// Operation reported success but the expected filesystem state does not hold
    Postcondition(String),

    /// Parameter outside its accepted range or set
    InvalidArgument(String),

    /// Invalid configuration or manifest
    Config(String),

    /// IO error
    IoError(std::io::Error),

    /// JSON parsing error
    JsonError(serde_json::Error),

    /// Generic error with message
    Generic(String),
}

/// Coarse classification of an [`SfxError`], kept by failed status results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    MissingDependency,
    Process,
    Postcondition,
    InvalidArgument,
    Config,
    Io,
    Other,
}

impl ErrorKind {
    /// Exit code a binary should report for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Precondition => EXIT_PRECONDITION_ERROR,
            ErrorKind::MissingDependency => EXIT_DEPENDENCY_ERROR,
            ErrorKind::Process => EXIT_PROCESS_ERROR,
            ErrorKind::Postcondition => EXIT_VERIFICATION_ERROR,
            ErrorKind::InvalidArgument => EXIT_INVALID_ARGS,
            ErrorKind::Config => EXIT_CONFIG_ERROR,
            ErrorKind::Io => EXIT_IO_ERROR,
            ErrorKind::Other => EXIT_ERROR,
        }
    }
}

impl SfxError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        SfxError::Precondition(msg.into())
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        SfxError::MissingDependency(msg.into())
    }

    pub fn postcondition(msg: impl Into<String>) -> Self {
        SfxError::Postcondition(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        SfxError::InvalidArgument(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        SfxError::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SfxError::Precondition(_) => ErrorKind::Precondition,
            SfxError::MissingDependency(_) => ErrorKind::MissingDependency,
            SfxError::ProcessFailed { .. } => ErrorKind::Process,
            SfxError::Postcondition(_) => ErrorKind::Postcondition,
            SfxError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SfxError::Config(_) | SfxError::JsonError(_) => ErrorKind::Config,
            SfxError::IoError(_) => ErrorKind::Io,
            SfxError::Generic(_) => ErrorKind::Other,
        }
    }

    /// Exit code a binary should report for this error
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

impl fmt::Display for SfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfxError::Precondition(msg) => write!(f, "Precondition failed: {msg}"),
            SfxError::MissingDependency(msg) => write!(f, "Missing dependency: {msg}"),
            SfxError::ProcessFailed {
                program,
                code,
                stderr,
            } => {
                if stderr.trim().is_empty() {
                    write!(f, "{program} exited with code {code}")
                } else {
                    write!(f, "{program} failed (exit code {code}): {}", stderr.trim())
                }
            }
            SfxError::Postcondition(msg) => write!(f, "Verification failed: {msg}"),
            SfxError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            SfxError::Config(msg) => write!(f, "Configuration error: {msg}"),
            SfxError::IoError(err) => write!(f, "IO error: {err}"),
            SfxError::JsonError(err) => write!(f, "JSON error: {err}"),
            SfxError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SfxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SfxError::IoError(err) => Some(err),
            SfxError::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SfxError {
    fn from(err: std::io::Error) -> Self {
        SfxError::IoError(err)
    }
}

impl From<serde_json::Error> for SfxError {
    fn from(err: serde_json::Error) -> Self {
        SfxError::JsonError(err)
    }
}

/// Context chains are flattened into the message; an I/O root cause keeps its kind
impl From<anyhow::Error> for SfxError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match err.downcast_ref::<std::io::Error>() {
            Some(io) => SfxError::IoError(std::io::Error::new(io.kind(), message)),
            None => SfxError::Generic(message),
        }
    }
}

impl From<walkdir::Error> for SfxError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => SfxError::IoError(io),
            None => SfxError::Generic("filesystem loop detected while walking directory".into()),
        }
    }
}

/// Result type for sfxkit operations
pub type Result<T> = std::result::Result<T, SfxError>;
