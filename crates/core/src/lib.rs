//! Shared primitives for the Fieldgate access-control crates.

#![forbid(unsafe_code)]

/// Authenticated principal types consumed by every decision path.
pub mod subject;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use subject::{Subject, SubjectId};

/// Result type used across Fieldgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed metadata detected while building the registry. Fatal: the
    /// hosting process must not serve traffic with a registry in this state.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A collaborator (row lookup) failed while resolving policy inputs.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::NonEmptyString;

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_keeps_value() {
        let result = NonEmptyString::new("work_orders");
        assert!(result.is_ok_and(|value| value.as_str() == "work_orders"));
    }
}
