use std::fmt;

use pyo3::exceptions::{PyKeyError, PyOSError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

/// Error type for filter and index operations
///
/// Short documents are not represented here: a token sequence shorter than the
/// window size yields no windows and a ratio of `0.0`.
///
/// # Examples
///
/// ```ignore
/// use plagiarism_core::errors::DetectorError;
///
/// let err = DetectorError::invalid_parameter("capacity", "must be at least 1");
/// eprintln!("{}", err); // Invalid parameter `capacity`: must be at least 1
/// ```
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DetectorError {
    /// A sizing or configuration value is outside its domain
    ///
    /// Raised before any counter array is allocated.
    InvalidParameter { name: &'static str, message: String },

    /// `delete` was called for an item the filter does not report as present
    ///
    /// No counter is modified when this is returned.
    NotFound { item: String },

    /// A document could not be read
    Document(String),

    /// Internal state corruption detected
    ///
    /// A counter was about to leave its valid range.
    StateCorruption(String),
}

pub type Result<T, E = DetectorError> = std::result::Result<T, E>;

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter `{}`: {}", name, message)
            }
            Self::NotFound { item } => {
                write!(
                    f,
                    "The item {} is not in the filter, there is nothing to delete",
                    item
                )
            }
            Self::Document(msg) => {
                write!(f, "Document error: {}", msg)
            }
            Self::StateCorruption(msg) => {
                write!(f, "State corruption: {}", msg)
            }
        }
    }
}

impl From<anyhow::Error> for DetectorError {
    fn from(err: anyhow::Error) -> Self {
        Self::StateCorruption(format!("{:#}", err))
    }
}

impl std::error::Error for DetectorError {}

/// Automatic conversion to Python exceptions with logging
impl From<DetectorError> for PyErr {
    fn from(err: DetectorError) -> Self {
        let err_msg = err.to_string();

        match &err {
            DetectorError::InvalidParameter { .. } => {
                log::warn!("{}", err_msg);
                PyValueError::new_err(err_msg)
            }
            DetectorError::NotFound { .. } => {
                log::warn!("{}", err_msg);
                PyKeyError::new_err(err_msg)
            }
            DetectorError::Document(_) => {
                log::error!("{}", err_msg);
                PyOSError::new_err(err_msg)
            }
            DetectorError::StateCorruption(_) => {
                log::error!("{}", err_msg);
                PyRuntimeError::new_err(err_msg)
            }
        }
    }
}

impl DetectorError {
    /// Create an invalid parameter error
    ///
    /// # Arguments
    /// * `name` - The offending parameter
    /// * `message` - What the valid domain is
    #[must_use]
    pub fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Create a not found error for a failed delete
    #[must_use]
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound { item: item.into() }
    }

    /// Create a document error
    #[must_use]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }

    /// Create a state corruption error
    #[must_use]
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::StateCorruption(message.into())
    }
}

/// Safely execute a closure, catching panics and converting them to PyErr
///
/// Keeps a bug in the index from taking down the Python interpreter.
///
/// # Arguments
/// * `f` - A closure that might panic
/// * `operation` - A string describing the operation for error messages
///
/// # Returns
/// * `Ok(T)` if the closure completes successfully
/// * `Err(PyRuntimeError)` if the closure panics
#[inline]
pub fn catch_panic<F, T>(f: F, operation: &str) -> PyResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).map_err(|_| {
        let msg = format!(
            "Detector operation panicked in {}: this indicates an internal bug",
            operation
        );
        log::error!("{}", msg);
        PyRuntimeError::new_err(msg)
    })
}
