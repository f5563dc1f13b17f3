//! Network consensus parameters as indexed from the chain.
//!
//! A [`ConsensusParameterSet`] is loaded once per network and never mutated;
//! a refresh replaces the whole set.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::governance::SubjectType;
use crate::Network;

/// Closed enumeration of consensus parameter identifiers. The discriminants
/// are the numeric ids the chain uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
#[repr(u16)]
pub enum ParameterId {
    VotingCycleLength = 0,
    ConsultationMinSupport = 1,
    ConsultationAnswerMinSupport = 2,
    ConsultationMinCycles = 3,
    ConsultationMaxVotingCycles = 4,
    ConsultationMaxSupportCycles = 5,
    ConsultationReflectionLength = 6,
    ConsultationMinFee = 7,
    ConsultationAnswerMinFee = 8,
    ProposalMinQuorum = 9,
    ProposalMinAccept = 10,
    ProposalMinReject = 11,
    ProposalMinFee = 12,
    ProposalMaxVotingCycles = 13,
    PaymentRequestMinQuorum = 14,
    PaymentRequestMinAccept = 15,
    PaymentRequestMinReject = 16,
    PaymentRequestMinFee = 17,
    PaymentRequestMaxVotingCycles = 18,
    FundSpreadAccumulation = 19,
    FundPercentPerBlock = 20,
    GenerationPerBlock = 21,
    NavNsFee = 22,
    DaoVoteLightMinFee = 23,
}

impl ParameterId {
    pub const ALL: [ParameterId; 24] = [
        ParameterId::VotingCycleLength,
        ParameterId::ConsultationMinSupport,
        ParameterId::ConsultationAnswerMinSupport,
        ParameterId::ConsultationMinCycles,
        ParameterId::ConsultationMaxVotingCycles,
        ParameterId::ConsultationMaxSupportCycles,
        ParameterId::ConsultationReflectionLength,
        ParameterId::ConsultationMinFee,
        ParameterId::ConsultationAnswerMinFee,
        ParameterId::ProposalMinQuorum,
        ParameterId::ProposalMinAccept,
        ParameterId::ProposalMinReject,
        ParameterId::ProposalMinFee,
        ParameterId::ProposalMaxVotingCycles,
        ParameterId::PaymentRequestMinQuorum,
        ParameterId::PaymentRequestMinAccept,
        ParameterId::PaymentRequestMinReject,
        ParameterId::PaymentRequestMinFee,
        ParameterId::PaymentRequestMaxVotingCycles,
        ParameterId::FundSpreadAccumulation,
        ParameterId::FundPercentPerBlock,
        ParameterId::GenerationPerBlock,
        ParameterId::NavNsFee,
        ParameterId::DaoVoteLightMinFee,
    ];

    /// The max-voting-cycles parameter that bounds a subject type's lifetime.
    pub fn max_voting_cycles_for(subject_type: SubjectType) -> ParameterId {
        match subject_type {
            SubjectType::Proposal => ParameterId::ProposalMaxVotingCycles,
            SubjectType::PaymentRequest => ParameterId::PaymentRequestMaxVotingCycles,
            SubjectType::ConsultationAnswer => ParameterId::ConsultationMaxVotingCycles,
        }
    }
}

impl From<ParameterId> for u16 {
    fn from(id: ParameterId) -> Self {
        id as u16
    }
}

impl TryFrom<u16> for ParameterId {
    type Error = ParameterError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ParameterId::ALL
            .get(value as usize)
            .copied()
            .ok_or(ParameterError::UnknownId(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParameter {
    pub id: ParameterId,
    pub value: i64,
}

/// All consensus parameters known for one network, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParameterSet {
    pub network: Network,
    parameters: BTreeMap<ParameterId, ConsensusParameter>,
}

impl ConsensusParameterSet {
    pub fn new<I>(network: Network, parameters: I) -> Self
    where
        I: IntoIterator<Item = ConsensusParameter>,
    {
        Self {
            network,
            parameters: parameters.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: ParameterId) -> Result<&ConsensusParameter, ParameterError> {
        self.parameters.get(&id).ok_or(ParameterError::Missing(id))
    }

    pub fn value(&self, id: ParameterId) -> Result<i64, ParameterError> {
        self.get(id).map(|p| p.value)
    }

    /// Length of a voting cycle in blocks. Always strictly positive.
    pub fn cycle_length(&self) -> Result<u64, ParameterError> {
        let value = self.value(ParameterId::VotingCycleLength)?;
        if value <= 0 {
            return Err(ParameterError::Invalid {
                id: ParameterId::VotingCycleLength,
                value,
            });
        }
        Ok(value as u64)
    }

    pub fn max_voting_cycles(&self, subject_type: SubjectType) -> Result<u64, ParameterError> {
        let id = ParameterId::max_voting_cycles_for(subject_type);
        let value = self.value(id)?;
        u64::try_from(value).map_err(|_| ParameterError::Invalid { id, value })
    }

    /// Startup validation: every parameter the governance engine depends on
    /// must be present and in range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.cycle_length()?;
        for subject_type in SubjectType::ALL {
            self.max_voting_cycles(subject_type)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsensusParameter> {
        self.parameters.values()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
