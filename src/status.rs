//! Uniform result envelope returned by every toolkit operation
//!
//! Internally operations are written against [`crate::exceptions::Result`] and
//! propagate with `?`. At the public boundary the outcome is folded into a
//! [`StatusResult`], so callers need a single `is_success()` check instead of
//! mixing error handling styles.

use crate::exceptions::{ErrorKind, Result, SfxError};
use serde::Serialize;
use std::fmt;

/// Outcome code of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusCode {
    Success,
    Failure,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Success => write!(f, "Success"),
            StatusCode::Failure => write!(f, "Failure"),
        }
    }
}

/// Code, human-readable message and optional payload of an operation
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult<T> {
    pub code: StatusCode,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip)]
    kind: Option<ErrorKind>,
}

impl<T> StatusResult<T> {
    /// Successful outcome carrying `data`
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: StatusCode::Success,
            message: message.into(),
            data: Some(data),
            kind: None,
        }
    }

    /// Failed outcome built from an error, keeping its kind
    pub fn from_error(err: &SfxError) -> Self {
        Self {
            code: StatusCode::Failure,
            message: err.to_string(),
            data: None,
            kind: Some(err.kind()),
        }
    }

    /// Fold an internal result into an envelope
    ///
    /// The success value is a `(message, data)` pair so each operation can
    /// phrase its own summary.
    pub fn from_result(result: Result<(String, T)>) -> Self {
        match result {
            Ok((message, data)) => Self::success(message, data),
            Err(err) => {
                log::debug!("Operation failed: {err}");
                Self::from_error(&err)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }

    /// Kind of the underlying error, `None` on success
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    /// Exit code a binary should use for this outcome
    pub fn exit_code(&self) -> i32 {
        self.kind
            .map(ErrorKind::exit_code)
            .unwrap_or(crate::exit_codes::EXIT_SUCCESS)
    }
}

impl<T> fmt::Display for StatusResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
