use thiserror::Error;

use crate::consensus::ParameterId;

/// Problems with a network's consensus parameter set. These are configuration
/// faults, never per-request tallying errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("Consensus parameter {0:?} is not set")]
    Missing(ParameterId),
    #[error("Consensus parameter {id:?} has invalid value {value}")]
    Invalid { id: ParameterId, value: i64 },
    #[error("Unknown consensus parameter id {0}")]
    UnknownId(u16),
}

/// Failures reported by the indexed store collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Malformed result: {0}")]
    Malformed(String),
    #[error("Query returned {buckets} buckets, limit is {limit}")]
    TooManyBuckets { buckets: usize, limit: usize },
    #[error("Query timed out")]
    Timeout,
}
