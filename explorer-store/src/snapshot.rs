//! JSON snapshot of indexed chain data, loaded into the store at startup.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use explorer_governance::StoreResult;
use explorer_types::{
    BlockRef, ConsensusParameter, ConsensusParameterSet, ConsultationAnswer, Hash, Network,
    PaymentRequest, Proposal, StoreError, SubjectRecord, SubjectType, VoteChoice,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::store::SledStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVote {
    pub subject_type: SubjectType,
    pub subject_hash: Hash,
    pub height: u64,
    pub voter: String,
    /// 1 yes, 0 no, -1 abstain
    pub vote: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedCount {
    pub cycle_index: u64,
    pub count: u64,
}

/// One network's worth of indexed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub network: Network,
    #[serde(default)]
    pub parameters: Vec<ConsensusParameter>,
    #[serde(default)]
    pub blocks: Vec<BlockRef>,
    /// Defaults to the highest block in `blocks`.
    #[serde(default)]
    pub best_block: Option<u64>,
    #[serde(default)]
    pub votes: Vec<SnapshotVote>,
    #[serde(default)]
    pub excluded: Vec<ExcludedCount>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(default)]
    pub payment_requests: Vec<PaymentRequest>,
    #[serde(default)]
    pub consultation_answers: Vec<ConsultationAnswer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub blocks: usize,
    pub votes: usize,
    pub subjects: usize,
}

impl Snapshot {
    pub fn from_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            StoreError::Database(format!("cannot open {}: {}", path.as_ref().display(), e))
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn subjects(&self) -> impl Iterator<Item = SubjectRecord> + '_ {
        let proposals = self.proposals.iter().cloned().map(SubjectRecord::from);
        let requests = self.payment_requests.iter().cloned().map(SubjectRecord::from);
        let answers = self.consultation_answers.iter().cloned().map(SubjectRecord::from);
        proposals.chain(requests).chain(answers)
    }
}

impl SledStore {
    /// Write every record of `snapshot` into the store. Vote codes are
    /// checked before anything is written.
    pub fn import(&self, snapshot: &Snapshot) -> StoreResult<ImportSummary> {
        let network = snapshot.network;

        if let Some(bad) = snapshot.votes.iter().find(|v| VoteChoice::from_code(v.vote).is_none()) {
            return Err(StoreError::Malformed(format!(
                "vote code {} from {} at height {}",
                bad.vote, bad.voter, bad.height
            )));
        }

        if !snapshot.parameters.is_empty() {
            let parameters = ConsensusParameterSet::new(network, snapshot.parameters.iter().copied());
            self.put_parameters(&parameters)?;
        }

        for block in &snapshot.blocks {
            self.put_block(network, *block)?;
        }
        let best = snapshot
            .best_block
            .or_else(|| snapshot.blocks.iter().map(|b| b.height).max());
        if let Some(height) = best {
            let block = snapshot
                .blocks
                .iter()
                .find(|b| b.height == height)
                .copied()
                .ok_or_else(|| StoreError::NotFound(format!("best block {} in snapshot", height)))?;
            self.set_best_block(network, block)?;
        }

        for vote in &snapshot.votes {
            self.put_vote_code(
                network,
                vote.subject_type,
                &vote.subject_hash,
                vote.height,
                &vote.voter,
                vote.vote,
            )?;
        }
        for excluded in &snapshot.excluded {
            self.put_excluded(network, excluded.cycle_index, excluded.count)?;
        }

        let mut subjects = 0;
        for subject in snapshot.subjects() {
            self.put_subject(network, &subject)?;
            subjects += 1;
        }
        self.flush()?;

        let summary = ImportSummary {
            blocks: snapshot.blocks.len(),
            votes: snapshot.votes.len(),
            subjects,
        };
        info!(
            "Imported {} snapshot: {} blocks, {} votes, {} subjects",
            network, summary.blocks, summary.votes, summary.subjects
        );
        Ok(summary)
    }
}
