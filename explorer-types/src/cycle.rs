//! Voting-cycle windows and the tallies computed over them.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::governance::VoteChoice;

/// Position of a height within the chain's fixed-length voting cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCycleInfo {
    /// 1-based absolute cycle number.
    pub cycle_index: u64,
    pub cycle_length: u64,
    pub first_block_of_cycle: u64,
    pub current_height: u64,
    pub blocks_remaining: u64,
}

/// A contiguous, inclusive range of heights over which one round of voting
/// is tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingCycle {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl VotingCycle {
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, height: u64) -> bool {
        self.start <= height && height <= self.end
    }
}

/// Yes/no/abstain counts for a single voter inside a height range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterTally {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
}

impl VoterTally {
    pub fn record(&mut self, choice: VoteChoice) {
        match choice {
            VoteChoice::Yes => self.yes += 1,
            VoteChoice::No => self.no += 1,
            VoteChoice::Abstain => self.abstain += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.yes + self.no + self.abstain
    }
}

impl Add for VoterTally {
    type Output = VoterTally;

    fn add(self, other: VoterTally) -> VoterTally {
        VoterTally {
            yes: self.yes + other.yes,
            no: self.no + other.no,
            abstain: self.abstain + other.abstain,
        }
    }
}

impl AddAssign for VoterTally {
    fn add_assign(&mut self, other: VoterTally) {
        *self = *self + other;
    }
}

impl std::iter::Sum for VoterTally {
    fn sum<I: Iterator<Item = VoterTally>>(iter: I) -> Self {
        iter.fold(VoterTally::default(), Add::add)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub excluded: u64,
}

/// Vote totals for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub window_index: u64,
    pub start: u64,
    pub end: u64,
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub excluded: u64,
}

impl VoteTally {
    pub fn new(window: &VotingCycle, votes: VoterTally, excluded: u64) -> Self {
        Self {
            window_index: window.index,
            start: window.start,
            end: window.end,
            yes: votes.yes,
            no: votes.no,
            abstain: votes.abstain,
            excluded,
        }
    }

    pub fn window(&self) -> VotingCycle {
        VotingCycle {
            index: self.window_index,
            start: self.start,
            end: self.end,
        }
    }

    pub fn counts(&self) -> VoteCounts {
        VoteCounts {
            yes: self.yes,
            no: self.no,
            abstain: self.abstain,
            excluded: self.excluded,
        }
    }
}

/// Integer percentages, each within 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageCounts {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub excluded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTrend {
    pub window: VotingCycle,
    pub raw: VoteCounts,
    pub trend: PercentageCounts,
}
