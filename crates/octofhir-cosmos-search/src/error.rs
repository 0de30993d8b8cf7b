use thiserror::Error;

/// Errors that can occur while compiling a search request.
///
/// None of these originate from the store: compilation performs no I/O, so
/// every variant describes a request the compiler refuses to translate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryBuildError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Invalid search expression: {0}")]
    InvalidExpression(String),

    #[error("Query too complex: {0}")]
    QueryTooComplex(String),

    #[error("Unknown compartment type: {0}")]
    UnknownCompartment(String),
}

impl QueryBuildError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Self::InvalidExpression(message.into())
    }

    pub fn too_complex(message: impl Into<String>) -> Self {
        Self::QueryTooComplex(message.into())
    }

    /// Check if the error was caused by the shape of the caller's input
    /// rather than by configured limits.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidExpression(_) | Self::UnknownCompartment(_)
        )
    }
}

/// Convenience result type for query compilation.
pub type Result<T> = std::result::Result<T, QueryBuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryBuildError::invalid_request("compartment id is empty");
        assert_eq!(
            err.to_string(),
            "Invalid search request: compartment id is empty"
        );

        let err = QueryBuildError::too_complex("depth 40 exceeds 32");
        assert_eq!(err.to_string(), "Query too complex: depth 40 exceeds 32");
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(QueryBuildError::invalid_expression("empty OR").is_contract_violation());
        assert!(QueryBuildError::UnknownCompartment("Group".into()).is_contract_violation());
        assert!(!QueryBuildError::too_complex("too many parameters").is_contract_violation());
    }
}
