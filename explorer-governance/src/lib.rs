//! DAO explorer governance engine
//!
//! Maps chain heights onto voting cycles, generates the windows a governance
//! subject has lived through, tallies per-window votes from the indexed store
//! and projects a smoothed percentage trend from those tallies.

pub mod block_cycle;
pub mod engine;
pub mod error;
pub mod source;
pub mod tally;
pub mod trend;
pub mod voting_cycle;

pub use block_cycle::{compute_cycle, BlockCycleCalculator};
pub use engine::GovernanceEngine;
pub use error::{GovernanceError, Result};
pub use source::{
    ChainSource, ConsensusParameterSource, Sources, StoreResult, SubjectSource, VoteEventSource,
    VoteQuery, VoterTallies,
};
pub use tally::{TallyConfig, VoteTallyAggregator, PARTITION_CEILING};
pub use trend::{normalize, TrendProjector, TREND_SEGMENTS};
pub use voting_cycle::{segments_for, VotingCycleGenerator, BUFFER_CYCLES};

// Re-export the data model for callers that only depend on this crate
pub use explorer_types::*;
