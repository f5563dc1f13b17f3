use explorer_types::{ParameterError, StoreError};
use thiserror::Error;

pub type Result<T, E = GovernanceError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// Missing or out-of-range consensus parameter. Fatal for the network.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Upstream query failed: {0}")]
    Upstream(StoreError),
    #[error("Request cancelled")]
    Cancelled,
}

impl From<ParameterError> for GovernanceError {
    fn from(err: ParameterError) -> Self {
        GovernanceError::Configuration(err.to_string())
    }
}

impl From<StoreError> for GovernanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => GovernanceError::NotFound(what),
            other => GovernanceError::Upstream(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use explorer_types::ParameterId;

    #[test]
    fn test_store_not_found_is_surfaced_verbatim() {
        let err: GovernanceError = StoreError::NotFound("block 42".to_string()).into();
        assert_eq!(err, GovernanceError::NotFound("block 42".to_string()));
        assert_eq!(err.to_string(), "block 42 not found");
    }

    #[test]
    fn test_store_failures_become_upstream() {
        let err: GovernanceError = StoreError::Timeout.into();
        assert_eq!(err, GovernanceError::Upstream(StoreError::Timeout));
    }

    #[test]
    fn test_parameter_errors_are_configuration_errors() {
        let err: GovernanceError = ParameterError::Missing(ParameterId::VotingCycleLength).into();
        assert!(matches!(err, GovernanceError::Configuration(_)));
    }
}
