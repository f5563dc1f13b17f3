//! Smoothed voting trend over the last cycle-length span before a reference
//! height.
//!
//! The span is cut into ten equal sub-windows (remainder blocks are dropped).
//! Each sub-window is tallied like a regular window and its counts are scaled
//! back up by ten to read as full-cycle percentages. Exclusions are counted
//! per chain cycle, so they are compared against the full cycle length.

use explorer_types::{Hash, PercentageCounts, SubjectType, VoteCounts, VoteTrend, VotingCycle};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::error::{GovernanceError, Result};
use crate::tally::VoteTallyAggregator;
use crate::voting_cycle::VotingCycleGenerator;

/// Sub-windows per trend.
pub const TREND_SEGMENTS: u64 = 10;

#[derive(Clone)]
pub struct TrendProjector {
    aggregator: VoteTallyAggregator,
}

impl TrendProjector {
    pub fn new(aggregator: VoteTallyAggregator) -> Self {
        Self { aggregator }
    }

    /// Ten sub-windows of `cycle_length / 10` blocks, the last one ending at
    /// `reference_height`. On a chain shorter than the span they start at
    /// genesis instead.
    pub fn sub_windows(reference_height: u64, cycle_length: u64) -> Result<Vec<VotingCycle>> {
        let size = cycle_length / TREND_SEGMENTS;
        if size == 0 {
            return Err(GovernanceError::Configuration(format!(
                "cycle length {} is too short to split into {} trend segments",
                cycle_length, TREND_SEGMENTS
            )));
        }
        let span = size * TREND_SEGMENTS;
        let anchor = (reference_height + 1).saturating_sub(span);
        Ok(VotingCycleGenerator::new(size)?.generate(anchor, TREND_SEGMENTS, 0))
    }

    pub async fn project(
        &self,
        subject_type: SubjectType,
        subject_hash: Hash,
        reference_height: u64,
        cycle_length: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<VoteTrend>> {
        let windows = Self::sub_windows(reference_height, cycle_length)?;
        let tallies = self
            .aggregator
            .tally(subject_type, subject_hash, &windows, cancel)
            .await?;

        let trends = tallies
            .iter()
            .map(|tally| {
                let raw = VoteCounts {
                    yes: tally.yes,
                    no: tally.no,
                    abstain: tally.abstain,
                    excluded: tally.excluded,
                };
                VoteTrend {
                    window: tally.window(),
                    raw,
                    trend: normalize(&raw, cycle_length),
                }
            })
            .collect();

        debug!(
            "Projected trend for {} {} ending at height {}",
            subject_type, subject_hash, reference_height
        );
        Ok(trends)
    }
}

/// Convert one sub-window's counts into full-cycle percentages.
///
/// `raw.excluded` is the exclusion count of the whole chain cycle.
/// `yes/no/abstain% = round(x * 10 / (cycle_length - excluded) * 100)` and
/// `excluded% = round(excluded / cycle_length * 100)`. An exhausted capacity
/// yields 0%.
pub fn normalize(raw: &VoteCounts, cycle_length: u64) -> PercentageCounts {
    let segments = TREND_SEGMENTS as u128;
    let capacity = (cycle_length as u128).saturating_sub(raw.excluded as u128);

    let share = |count: u64| -> u64 {
        if capacity == 0 {
            return 0;
        }
        percent(count as u128 * segments, capacity)
    };

    PercentageCounts {
        yes: share(raw.yes),
        no: share(raw.no),
        abstain: share(raw.abstain),
        excluded: if cycle_length == 0 {
            0
        } else {
            percent(raw.excluded as u128, cycle_length as u128)
        },
    }
}

/// `numerator / denominator * 100`, rounded half up and capped at 100.
fn percent(numerator: u128, denominator: u128) -> u64 {
    let value = (numerator * 200 + denominator) / (denominator * 2);
    if value > 100 {
        warn!(
            "Trend share {}/{} exceeds the window capacity, capping at 100%",
            numerator, denominator
        );
        return 100;
    }
    value as u64
}
