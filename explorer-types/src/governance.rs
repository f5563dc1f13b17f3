//! Governance subjects (proposals, payment requests, consultation answers)
//! and the tri-state vote classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consensus::ConsensusParameterSet;
use crate::error::ParameterError;
use crate::Hash;

/// The kinds of item a vote can be cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Proposal,
    PaymentRequest,
    ConsultationAnswer,
}

impl SubjectType {
    pub const ALL: [SubjectType; 3] = [
        SubjectType::Proposal,
        SubjectType::PaymentRequest,
        SubjectType::ConsultationAnswer,
    ];

    /// Stable single byte tag used in store keys.
    pub fn tag(&self) -> u8 {
        match self {
            SubjectType::Proposal => 1,
            SubjectType::PaymentRequest => 2,
            SubjectType::ConsultationAnswer => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Proposal => "proposal",
            SubjectType::PaymentRequest => "payment_request",
            SubjectType::ConsultationAnswer => "consultation_answer",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposal" => Ok(SubjectType::Proposal),
            "payment_request" | "payment-request" => Ok(SubjectType::PaymentRequest),
            "consultation_answer" | "consultation-answer" => Ok(SubjectType::ConsultationAnswer),
            other => Err(format!("Unknown subject type: {}", other)),
        }
    }
}

/// A classified vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl VoteChoice {
    /// The one mapping from the raw code the indexer records to a vote.
    ///
    /// `1` is yes, `0` is no, `-1` is abstain. Anything else (including the
    /// `-2` "remove vote" marker) is not a countable vote.
    pub fn from_code(code: i8) -> Option<VoteChoice> {
        match code {
            1 => Some(VoteChoice::Yes),
            0 => Some(VoteChoice::No),
            -1 => Some(VoteChoice::Abstain),
            _ => None,
        }
    }

    pub fn code(&self) -> i8 {
        match self {
            VoteChoice::Yes => 1,
            VoteChoice::No => 0,
            VoteChoice::Abstain => -1,
        }
    }
}

/// Lifecycle state of a governance subject as indexed from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
    Paid,
    PendingFunds,
    AcceptedWaitingEndOfVoting,
    RejectedWaitingEndOfVoting,
    ExpiredWaitingEndOfVoting,
}

impl SubjectStatus {
    /// Whether votes cast at the chain tip still count for this subject.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            SubjectStatus::Pending
                | SubjectStatus::AcceptedWaitingEndOfVoting
                | SubjectStatus::RejectedWaitingEndOfVoting
                | SubjectStatus::ExpiredWaitingEndOfVoting
        )
    }
}

/// The capability the voting-cycle generator and trend projector need from
/// a governance item.
pub trait GovernanceSubject {
    fn subject_type(&self) -> SubjectType;

    fn hash(&self) -> Hash;

    /// Height of the block the subject was created in.
    fn height(&self) -> u64;

    fn status(&self) -> SubjectStatus;

    /// Height at which the status last changed, once it has.
    fn state_height(&self) -> Option<u64>;

    fn max_voting_cycles(&self, parameters: &ConsensusParameterSet) -> Result<u64, ParameterError> {
        parameters.max_voting_cycles(self.subject_type())
    }

    fn is_open(&self) -> bool {
        self.status().is_open()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub hash: Hash,
    pub height: u64,
    pub status: SubjectStatus,
    pub state_height: Option<u64>,
    pub requested_amount: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub hash: Hash,
    pub proposal_hash: Hash,
    pub height: u64,
    pub status: SubjectStatus,
    pub state_height: Option<u64>,
    pub requested_amount: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationAnswer {
    pub hash: Hash,
    pub consultation_hash: Hash,
    pub height: u64,
    pub status: SubjectStatus,
    pub state_height: Option<u64>,
    pub answer: String,
}

macro_rules! impl_subject {
    ($ty:ty, $kind:expr) => {
        impl GovernanceSubject for $ty {
            fn subject_type(&self) -> SubjectType {
                $kind
            }

            fn hash(&self) -> Hash {
                self.hash
            }

            fn height(&self) -> u64 {
                self.height
            }

            fn status(&self) -> SubjectStatus {
                self.status
            }

            fn state_height(&self) -> Option<u64> {
                self.state_height
            }
        }
    };
}

impl_subject!(Proposal, SubjectType::Proposal);
impl_subject!(PaymentRequest, SubjectType::PaymentRequest);
impl_subject!(ConsultationAnswer, SubjectType::ConsultationAnswer);

/// Any governance subject, as stored and returned by the subject source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRecord {
    Proposal(Proposal),
    PaymentRequest(PaymentRequest),
    ConsultationAnswer(ConsultationAnswer),
}

impl SubjectRecord {
    fn inner(&self) -> &dyn GovernanceSubject {
        match self {
            SubjectRecord::Proposal(p) => p,
            SubjectRecord::PaymentRequest(p) => p,
            SubjectRecord::ConsultationAnswer(a) => a,
        }
    }
}

impl GovernanceSubject for SubjectRecord {
    fn subject_type(&self) -> SubjectType {
        self.inner().subject_type()
    }

    fn hash(&self) -> Hash {
        self.inner().hash()
    }

    fn height(&self) -> u64 {
        self.inner().height()
    }

    fn status(&self) -> SubjectStatus {
        self.inner().status()
    }

    fn state_height(&self) -> Option<u64> {
        self.inner().state_height()
    }
}

impl From<Proposal> for SubjectRecord {
    fn from(p: Proposal) -> Self {
        SubjectRecord::Proposal(p)
    }
}

impl From<PaymentRequest> for SubjectRecord {
    fn from(p: PaymentRequest) -> Self {
        SubjectRecord::PaymentRequest(p)
    }
}

impl From<ConsultationAnswer> for SubjectRecord {
    fn from(a: ConsultationAnswer) -> Self {
        SubjectRecord::ConsultationAnswer(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{ConsensusParameter, ParameterId};
    use crate::Network;

    // Canonical polarity. Changing this silently would flip published tallies.
    #[test]
    fn test_vote_code_polarity_is_pinned() {
        assert_eq!(VoteChoice::from_code(1), Some(VoteChoice::Yes));
        assert_eq!(VoteChoice::from_code(0), Some(VoteChoice::No));
        assert_eq!(VoteChoice::from_code(-1), Some(VoteChoice::Abstain));
        assert_eq!(VoteChoice::from_code(-2), None);
        assert_eq!(VoteChoice::from_code(2), None);
        for choice in [VoteChoice::Yes, VoteChoice::No, VoteChoice::Abstain] {
            assert_eq!(VoteChoice::from_code(choice.code()), Some(choice));
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(SubjectStatus::Pending.is_open());
        assert!(SubjectStatus::AcceptedWaitingEndOfVoting.is_open());
        assert!(!SubjectStatus::Accepted.is_open());
        assert!(!SubjectStatus::Expired.is_open());
        assert!(!SubjectStatus::Paid.is_open());
    }

    #[test]
    fn test_subject_record_delegates_to_inner() {
        let params = ConsensusParameterSet::new(
            Network::Mainnet,
            vec![ConsensusParameter { id: ParameterId::PaymentRequestMaxVotingCycles, value: 8 }],
        );
        let record = SubjectRecord::from(PaymentRequest {
            hash: Hash([2; 32]),
            proposal_hash: Hash([1; 32]),
            height: 5000,
            status: SubjectStatus::Accepted,
            state_height: Some(9000),
            requested_amount: 10,
            description: "milestone 1".to_string(),
        });

        assert_eq!(record.subject_type(), SubjectType::PaymentRequest);
        assert_eq!(record.height(), 5000);
        assert_eq!(record.state_height(), Some(9000));
        assert!(!record.is_open());
        assert_eq!(record.max_voting_cycles(&params).unwrap(), 8);
    }

    #[test]
    fn test_subject_type_parsing() {
        assert_eq!("payment-request".parse::<SubjectType>().unwrap(), SubjectType::PaymentRequest);
        assert_eq!("consultation_answer".parse::<SubjectType>().unwrap(), SubjectType::ConsultationAnswer);
        assert!("consultation".parse::<SubjectType>().is_err());
    }
}
