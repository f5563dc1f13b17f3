//! Interfaces to the indexed store the engine reads from.
//!
//! The engine never talks to a concrete database; it is handed trait objects
//! implementing these surfaces at construction time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use explorer_types::{
    BlockRef, ConsensusParameterSet, Hash, Network, StoreError, SubjectRecord, SubjectType,
    VoterTally,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-voter tallies returned for one partition of a vote query.
pub type VoterTallies = HashMap<String, VoterTally>;

/// One partition of a per-voter vote aggregation over an inclusive height
/// range. Voters are split across `partitions` disjoint buckets; `partition`
/// selects which bucket this query returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteQuery {
    pub network: Network,
    pub subject_type: SubjectType,
    pub subject_hash: Hash,
    pub from_height: u64,
    pub to_height: u64,
    pub partition: u32,
    pub partitions: u32,
}

#[async_trait]
pub trait ConsensusParameterSource: Send + Sync {
    /// Fails with `StoreError::NotFound` when the network has no indexed
    /// parameters yet.
    async fn parameters(&self, network: Network) -> StoreResult<ConsensusParameterSet>;
}

#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn block_by_height(&self, network: Network, height: u64) -> StoreResult<BlockRef>;

    async fn best_block(&self, network: Network) -> StoreResult<BlockRef>;
}

#[async_trait]
pub trait VoteEventSource: Send + Sync {
    async fn voter_tallies(&self, query: &VoteQuery) -> StoreResult<VoterTallies>;

    /// Votes cast in an absolute cycle that do not count toward quorum.
    async fn excluded_votes(&self, network: Network, cycle_index: u64) -> StoreResult<u64>;
}

#[async_trait]
pub trait SubjectSource: Send + Sync {
    async fn subject(
        &self,
        network: Network,
        subject_type: SubjectType,
        hash: Hash,
    ) -> StoreResult<SubjectRecord>;
}

/// The full set of collaborators a [`crate::GovernanceEngine`] needs.
#[derive(Clone)]
pub struct Sources {
    pub parameters: Arc<dyn ConsensusParameterSource>,
    pub chain: Arc<dyn ChainSource>,
    pub votes: Arc<dyn VoteEventSource>,
    pub subjects: Arc<dyn SubjectSource>,
}

impl Sources {
    /// Use one store that implements every surface.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ConsensusParameterSource + ChainSource + VoteEventSource + SubjectSource + 'static,
    {
        Self {
            parameters: store.clone(),
            chain: store.clone(),
            votes: store.clone(),
            subjects: store,
        }
    }
}
