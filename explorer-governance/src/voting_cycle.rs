//! Generation of the voting-cycle windows a governance subject lives through.

use explorer_types::{ConsensusParameterSet, GovernanceSubject, VotingCycle};
use log::debug;

use crate::error::{GovernanceError, Result};

/// Windows shown around a subject's voting life: one before it enters
/// voting and one after it expires.
pub const BUFFER_CYCLES: u64 = 2;

/// Number of windows to generate for a subject type's max-voting-cycles.
pub fn segments_for(max_voting_cycles: u64) -> u64 {
    max_voting_cycles.saturating_add(BUFFER_CYCLES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingCycleGenerator {
    cycle_length: u64,
}

impl VotingCycleGenerator {
    pub fn new(cycle_length: u64) -> Result<Self> {
        if cycle_length == 0 {
            return Err(GovernanceError::Configuration(
                "cannot generate windows with a zero cycle length".to_string(),
            ));
        }
        Ok(Self { cycle_length })
    }

    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    /// Contiguous windows of `cycle_length` blocks starting at `anchor`.
    ///
    /// At most `segments` windows are produced. When `max_start` is non-zero,
    /// generation stops before the first window starting above it; zero means
    /// unbounded.
    pub fn generate(&self, anchor: u64, segments: u64, max_start: u64) -> Vec<VotingCycle> {
        // `segments` comes from stored parameters; only clipping bounds it.
        let mut windows = Vec::with_capacity(segments.min(64) as usize);
        let mut start = anchor;

        for index in 0..segments {
            if max_start != 0 && start > max_start {
                debug!(
                    "Clipped voting cycles at window {} (start {} > max {})",
                    index, start, max_start
                );
                break;
            }
            let end = start + self.cycle_length - 1;
            windows.push(VotingCycle { index, start, end });
            start = end + 1;
        }

        windows
    }

    /// Windows for a subject, bounded by the chain tip at `max_start`.
    pub fn for_subject<S>(
        &self,
        subject: &S,
        parameters: &ConsensusParameterSet,
        max_start: u64,
    ) -> Result<Vec<VotingCycle>>
    where
        S: GovernanceSubject + ?Sized,
    {
        let segments = segments_for(subject.max_voting_cycles(parameters)?);
        Ok(self.generate(subject.height(), segments, max_start))
    }
}
