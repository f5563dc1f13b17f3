//! Per-network entry point tying the parameter set, chain heights, window
//! generation, tallying and trend projection together.

use std::sync::Arc;

use explorer_types::{
    BlockCycleInfo, ConsensusParameterSet, GovernanceSubject, Hash, Network, SubjectRecord,
    SubjectType, VoteTally, VoteTrend, VotingCycle,
};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::block_cycle::BlockCycleCalculator;
use crate::error::Result;
use crate::source::{ChainSource, Sources, SubjectSource};
use crate::tally::{TallyConfig, VoteTallyAggregator};
use crate::trend::TrendProjector;
use crate::voting_cycle::VotingCycleGenerator;

/// Governance engine for one network. Constructed explicitly from that
/// network's consensus parameters; holds no mutable state.
#[derive(Clone)]
pub struct GovernanceEngine {
    network: Network,
    parameters: Arc<ConsensusParameterSet>,
    chain: Arc<dyn ChainSource>,
    subjects: Arc<dyn SubjectSource>,
    calculator: BlockCycleCalculator,
    generator: VotingCycleGenerator,
    aggregator: VoteTallyAggregator,
    projector: TrendProjector,
}

impl GovernanceEngine {
    /// Build an engine from an already loaded parameter set. Fails with a
    /// configuration error if the set is incomplete.
    pub fn new(parameters: ConsensusParameterSet, sources: Sources, config: TallyConfig) -> Result<Self> {
        parameters.validate()?;
        let network = parameters.network;
        let cycle_length = parameters.cycle_length()?;
        let calculator = BlockCycleCalculator::new(cycle_length)?;
        let aggregator = VoteTallyAggregator::new(network, sources.votes.clone(), calculator, config);

        Ok(Self {
            network,
            parameters: Arc::new(parameters),
            chain: sources.chain,
            subjects: sources.subjects,
            calculator,
            generator: VotingCycleGenerator::new(cycle_length)?,
            projector: TrendProjector::new(aggregator.clone()),
            aggregator,
        })
    }

    /// Fetch and validate the network's parameters, then build the engine.
    pub async fn connect(network: Network, sources: Sources, config: TallyConfig) -> Result<Self> {
        let parameters = sources.parameters.parameters(network).await?;
        let engine = Self::new(parameters, sources, config)?;
        info!(
            "Governance engine ready for {} (cycle length {})",
            network,
            engine.calculator.cycle_length()
        );
        Ok(engine)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn parameters(&self) -> &ConsensusParameterSet {
        &self.parameters
    }

    pub fn cycle_length(&self) -> u64 {
        self.calculator.cycle_length()
    }

    pub fn block_cycle(&self, height: u64) -> BlockCycleInfo {
        self.calculator.compute(height)
    }

    pub async fn block_cycle_at_tip(&self) -> Result<BlockCycleInfo> {
        let best = self.chain.best_block(self.network).await?;
        Ok(self.calculator.compute(best.height))
    }

    pub async fn subject(&self, subject_type: SubjectType, hash: Hash) -> Result<SubjectRecord> {
        Ok(self.subjects.subject(self.network, subject_type, hash).await?)
    }

    /// Windows the subject has lived through, clipped at the chain tip.
    pub async fn voting_cycles<S>(&self, subject: &S) -> Result<Vec<VotingCycle>>
    where
        S: GovernanceSubject + Sync + ?Sized,
    {
        // The anchor block must be indexed; a missing one is a not-found.
        self.chain.block_by_height(self.network, subject.height()).await?;
        let best = self.chain.best_block(self.network).await?;
        self.generator.for_subject(subject, &self.parameters, best.height)
    }

    pub async fn votes(
        &self,
        subject_type: SubjectType,
        hash: Hash,
        cancel: &CancellationToken,
    ) -> Result<Vec<VoteTally>> {
        let subject = self.subject(subject_type, hash).await?;
        let windows = self.voting_cycles(&subject).await?;
        self.aggregator.tally(subject_type, hash, &windows, cancel).await
    }

    pub async fn trend(
        &self,
        subject_type: SubjectType,
        hash: Hash,
        cancel: &CancellationToken,
    ) -> Result<Vec<VoteTrend>> {
        let subject = self.subject(subject_type, hash).await?;
        let reference_height = self.reference_height(&subject).await?;
        self.projector
            .project(subject_type, hash, reference_height, self.cycle_length(), cancel)
            .await
    }

    pub async fn excluded_votes(&self, cycle_index: u64) -> Result<u64> {
        self.aggregator.excluded_votes(cycle_index).await
    }

    /// Open subjects trend up to the chain tip; closed ones stay frozen at
    /// the height their state changed.
    async fn reference_height<S>(&self, subject: &S) -> Result<u64>
    where
        S: GovernanceSubject + Sync + ?Sized,
    {
        if !subject.is_open() {
            if let Some(height) = subject.state_height() {
                return Ok(height);
            }
            warn!(
                "{} {} is {:?} without a state change height, using chain tip",
                subject.subject_type(),
                subject.hash(),
                subject.status()
            );
        }
        Ok(self.chain.best_block(self.network).await?.height)
    }
}
