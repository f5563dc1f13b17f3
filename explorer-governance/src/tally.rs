//! Per-window vote tallying over the indexed vote events.
//!
//! A window's per-voter aggregation is split into partitions whenever the
//! number of distinct voters could exceed what the store returns in a single
//! group-by. Partitions are disjoint, so the window total is a plain sum of
//! partition results. Partition queries and windows are fanned out
//! concurrently with a bounded number of queries in flight; the first failure
//! aborts the whole tally.

use std::future::Future;
use std::sync::Arc;

use explorer_types::{Hash, Network, SubjectType, VoteTally, VoterTally, VotingCycle};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::block_cycle::BlockCycleCalculator;
use crate::error::{GovernanceError, Result};
use crate::source::{VoteEventSource, VoteQuery};

/// Maximum distinct voters the store aggregates per query.
pub const PARTITION_CEILING: u64 = 10_000;

/// Default number of concurrent store queries per fan-out.
pub const MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    pub partition_ceiling: u64,
    pub max_in_flight: usize,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            partition_ceiling: PARTITION_CEILING,
            max_in_flight: MAX_IN_FLIGHT,
        }
    }
}

#[derive(Clone)]
pub struct VoteTallyAggregator {
    network: Network,
    source: Arc<dyn VoteEventSource>,
    calculator: BlockCycleCalculator,
    config: TallyConfig,
}

impl VoteTallyAggregator {
    pub fn new(
        network: Network,
        source: Arc<dyn VoteEventSource>,
        calculator: BlockCycleCalculator,
        config: TallyConfig,
    ) -> Self {
        Self {
            network,
            source,
            calculator,
            config,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// `ceil(window size / ceiling)`, never less than one.
    pub fn partitions_for(&self, window: &VotingCycle) -> u32 {
        let ceiling = self.config.partition_ceiling.max(1);
        let partitions = window.size().div_ceil(ceiling).max(1);
        u32::try_from(partitions).unwrap_or(u32::MAX)
    }

    /// Tally every window, in window order. Nothing is returned unless every
    /// window succeeded.
    pub async fn tally(
        &self,
        subject_type: SubjectType,
        subject_hash: Hash,
        windows: &[VotingCycle],
        cancel: &CancellationToken,
    ) -> Result<Vec<VoteTally>> {
        let work = stream::iter(windows.to_vec())
            .map(|window| self.owned_tally_window(subject_type, subject_hash, window))
            .buffered(self.config.max_in_flight.max(1))
            .try_collect::<Vec<_>>();

        let tallies = with_cancellation(cancel, work).await?;

        info!(
            "Tallied {} windows for {} {} on {}",
            tallies.len(),
            subject_type,
            subject_hash,
            self.network
        );
        Ok(tallies)
    }

    /// Votes and exclusion count for a single window.
    pub async fn tally_window(
        &self,
        subject_type: SubjectType,
        subject_hash: Hash,
        window: &VotingCycle,
    ) -> Result<VoteTally> {
        // Exclusions are numbered by the chain's own cycles, not by window.
        let cycle_index = self.calculator.cycle_index(window.start);

        let (votes, excluded) = futures::try_join!(
            self.votes_in_window(subject_type, subject_hash, window),
            self.excluded_votes(cycle_index),
        )?;

        debug!(
            "Window {} [{}, {}]: yes={} no={} abstain={} excluded={} (cycle {})",
            window.index,
            window.start,
            window.end,
            votes.yes,
            votes.no,
            votes.abstain,
            excluded,
            cycle_index
        );
        Ok(VoteTally::new(window, votes, excluded))
    }

    fn owned_tally_window(
        &self,
        subject_type: SubjectType,
        subject_hash: Hash,
        window: VotingCycle,
    ) -> BoxFuture<'static, Result<VoteTally>> {
        let aggregator = self.clone();
        async move { aggregator.tally_window(subject_type, subject_hash, &window).await }.boxed()
    }

    pub async fn excluded_votes(&self, cycle_index: u64) -> Result<u64> {
        Ok(self.source.excluded_votes(self.network, cycle_index).await?)
    }

    async fn votes_in_window(
        &self,
        subject_type: SubjectType,
        subject_hash: Hash,
        window: &VotingCycle,
    ) -> Result<VoterTally> {
        let partitions = self.partitions_for(window);
        if partitions > 1 {
            debug!(
                "Splitting window {} ({} blocks) into {} partitions",
                window.index,
                window.size(),
                partitions
            );
        }

        let network = self.network;
        let source = Arc::clone(&self.source);
        let (from_height, to_height) = (window.start, window.end);

        stream::iter(0..partitions)
            .map(move |partition| {
                let query = VoteQuery {
                    network,
                    subject_type,
                    subject_hash,
                    from_height,
                    to_height,
                    partition,
                    partitions,
                };
                partition_tally(Arc::clone(&source), query)
            })
            .buffer_unordered(self.config.max_in_flight.max(1))
            .try_fold(VoterTally::default(), |total, partial| future::ready(Ok(total + partial)))
            .await
    }
}

/// One partition's voters, summed.
fn partition_tally(source: Arc<dyn VoteEventSource>, query: VoteQuery) -> BoxFuture<'static, Result<VoterTally>> {
    async move {
        let voters = source.voter_tallies(&query).await?;
        Ok(voters.into_values().sum::<VoterTally>())
    }
    .boxed()
}

/// Run `work` unless `cancel` fires first, in which case the in-flight
/// queries are dropped.
pub(crate) async fn with_cancellation<F, T>(cancel: &CancellationToken, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GovernanceError::Cancelled),
        result = work => result,
    }
}
