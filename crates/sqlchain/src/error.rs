//! Error types for sqlchain

use thiserror::Error;

/// Result type alias for sqlchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Error types for statement building and execution.
///
/// Errors are `Clone` so a [`Query`](crate::Query) can keep them in its error
/// log while also handing them back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Invalid builder input (empty assignment set, incomplete join, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Placeholder template arity or argument-kind mismatch
    #[error("Template error: {0}")]
    Template(String),

    /// Failure reported by the database driver, verbatim
    #[error("{0}")]
    Driver(String),

    /// Unknown model, request or table
    #[error("Not found: {0}")]
    NotFound(String),

    /// A model definition could not be read or parsed
    #[error("Definition error: {0}")]
    Definition(String),
}

impl ChainError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create a driver error
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a definition error
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a template error
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }

    /// Check if this error came from the driver
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_errors_display_verbatim() {
        let err = ChainError::driver("Duplicate entry '5' for key 'PRIMARY'");
        assert_eq!(err.to_string(), "Duplicate entry '5' for key 'PRIMARY'");
        assert!(err.is_driver());
    }

    #[test]
    fn helpers_build_matching_variants() {
        assert!(ChainError::not_found("users.list").is_not_found());
        assert!(ChainError::template("missing argument").is_template());
        assert_eq!(
            ChainError::validation("empty set").to_string(),
            "Validation error: empty set"
        );
    }
}
