//! Data model shared by the DAO explorer crates.
//!
//! Everything here is plain data: networks, block references, consensus
//! parameters, governance subjects and the voting-cycle / tally / trend
//! records produced by the governance engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod consensus;
pub mod cycle;
pub mod error;
pub mod governance;

pub use consensus::{ConsensusParameter, ConsensusParameterSet, ParameterId};
pub use cycle::{
    BlockCycleInfo, PercentageCounts, VoteCounts, VoteTally, VoteTrend, VoterTally, VotingCycle,
};
pub use error::{ParameterError, StoreError};
pub use governance::{
    ConsultationAnswer, GovernanceSubject, PaymentRequest, Proposal, SubjectRecord, SubjectStatus,
    SubjectType, VoteChoice,
};

/// A 32 byte transaction or object hash, hex encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Hash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Hash(bytes))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The chain a request is scoped to. Every store lookup is keyed by network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Devnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(format!("Unknown network: {}", other)),
        }
    }
}

/// An indexed block as seen by the governance engine: its height and the
/// absolute voting cycle the indexer assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub height: u64,
    pub cycle_index: u64,
}
