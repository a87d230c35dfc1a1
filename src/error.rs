//! Status codes and error reports
//!
//! Every fallible operation in the crate returns [`Result`]. At the C boundary
//! the error collapses into a [`StatusCode`] plus a caller-owned [`ErrorReport`].

use std::ffi::CString;
use std::fmt;
use thiserror::Error;

/// Status codes returned by every fallible operation
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Operation completed
    Success = 0,
    /// Malformed or mismatched arguments (lengths, types, vertex ids)
    InvalidInput = 1,
    /// Device or host allocation failure
    AllocationError = 2,
    /// Internal or unclassified failure of the underlying engine
    UnknownError = 3,
}

impl StatusCode {
    /// Stable upper-case name, as exposed to foreign callers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidInput => "INVALID_INPUT",
            Self::AllocationError => "ALLOCATION_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by handle, array, graph and algorithm operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or mismatched input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Allocation failed (budget exhausted, overflow, out of memory)
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Failure inside the device backend or algorithm engine
    #[error("internal error: {0}")]
    Unknown(String),
}

impl Error {
    /// Build an [`Error::InvalidInput`] from anything printable
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Status code this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::InvalidInput,
            Self::Allocation(_) => StatusCode::AllocationError,
            Self::Unknown(_) => StatusCode::UnknownError,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown(format!("{err:#}"))
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Status code plus diagnostic message, owned by whoever receives it
///
/// Foreign callers receive these boxed through an out-parameter and must
/// release them with `trueno_error_free`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    code: StatusCode,
    message: CString,
}

impl ErrorReport {
    /// Create a report from a code and message
    ///
    /// Interior NUL bytes are stripped so the message stays C-compatible.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        message.retain(|c| c != '\0');
        Self {
            code,
            message: CString::new(message).unwrap_or_default(),
        }
    }

    /// Status code carried by this report
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// Diagnostic message
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.to_str().unwrap_or_default()
    }

    /// Diagnostic message as a C string
    #[must_use]
    pub fn message_c(&self) -> &std::ffi::CStr {
        &self.message
    }
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

impl From<Error> for ErrorReport {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message())
    }
}
