//! Error types for the color grouping engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, GroupingError>;

/// Errors raised while parsing colors or running a grouping strategy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupingError {
    /// A color token could not be normalized to RGB
    #[error("cannot parse color '{token}': {reason}")]
    Parse { token: String, reason: String },

    /// Fewer distinct colors (or distinct seeds) than requested groups
    #[error("requested {requested} groups but only {available} distinct colors are available")]
    InsufficientDistinctColors { requested: usize, available: usize },

    /// A configuration value is missing or out of range
    #[error("invalid configuration: {parameter}: {reason}")]
    InvalidConfig { parameter: String, reason: String },

    /// No colors were supplied
    #[error("no colors to group")]
    EmptyInput,
}

impl GroupingError {
    /// Create a parse error for `token`
    pub fn parse(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error for `parameter`
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can recover by changing its request (e.g. a lower group count)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GroupingError::InsufficientDistinctColors { .. } | GroupingError::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GroupingError::parse("url(#grad)", "not a color");
        assert_eq!(err.to_string(), "cannot parse color 'url(#grad)': not a color");

        let err = GroupingError::InsufficientDistinctColors {
            requested: 5,
            available: 2,
        };
        assert!(err.to_string().contains("5 groups"));
        assert!(err.is_recoverable());
        assert!(!GroupingError::EmptyInput.is_recoverable());
    }
}
