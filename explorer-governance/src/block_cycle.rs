//! Mapping of chain heights onto fixed-length voting cycles.

use explorer_types::{BlockCycleInfo, ConsensusParameterSet};

use crate::error::{GovernanceError, Result};

/// Derives cycle position for heights on a chain with a fixed cycle length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCycleCalculator {
    cycle_length: u64,
}

impl BlockCycleCalculator {
    pub fn new(cycle_length: u64) -> Result<Self> {
        if cycle_length == 0 {
            return Err(GovernanceError::Configuration(
                "voting cycle length must be greater than zero".to_string(),
            ));
        }
        Ok(Self { cycle_length })
    }

    pub fn from_parameters(parameters: &ConsensusParameterSet) -> Result<Self> {
        Self::new(parameters.cycle_length()?)
    }

    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    /// Cycle position of `height`. `current_height` is the absolute height,
    /// not the offset into the cycle.
    pub fn compute(&self, height: u64) -> BlockCycleInfo {
        let completed = height / self.cycle_length;
        let first_block_of_cycle = completed * self.cycle_length;

        BlockCycleInfo {
            cycle_index: completed + 1,
            cycle_length: self.cycle_length,
            first_block_of_cycle,
            current_height: height,
            blocks_remaining: first_block_of_cycle + self.cycle_length - height - 1,
        }
    }

    /// 1-based absolute cycle containing `height`.
    pub fn cycle_index(&self, height: u64) -> u64 {
        height / self.cycle_length + 1
    }
}

/// One-shot form of [`BlockCycleCalculator::compute`].
pub fn compute_cycle(height: u64, cycle_length: u64) -> Result<BlockCycleInfo> {
    Ok(BlockCycleCalculator::new(cycle_length)?.compute(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mainnet_cycle_example() {
        let info = compute_cycle(40321, 20160).unwrap();
        assert_eq!(info.cycle_index, 3);
        assert_eq!(info.first_block_of_cycle, 40320);
        assert_eq!(info.cycle_length, 20160);
    }

    // Pins the absolute-height reading of current_height and the matching
    // blocks_remaining formula.
    #[test]
    fn test_current_height_is_absolute() {
        let info = compute_cycle(40321, 20160).unwrap();
        assert_eq!(info.current_height, 40321);
        assert_eq!(info.blocks_remaining, 20158);
    }

    #[test]
    fn test_cycle_boundaries() {
        let first = compute_cycle(0, 100).unwrap();
        assert_eq!(first.cycle_index, 1);
        assert_eq!(first.first_block_of_cycle, 0);
        assert_eq!(first.blocks_remaining, 99);

        let last = compute_cycle(99, 100).unwrap();
        assert_eq!(last.cycle_index, 1);
        assert_eq!(last.blocks_remaining, 0);

        let next = compute_cycle(100, 100).unwrap();
        assert_eq!(next.cycle_index, 2);
        assert_eq!(next.first_block_of_cycle, 100);
        assert_eq!(next.blocks_remaining, 99);
    }

    #[test]
    fn test_zero_cycle_length_is_configuration_error() {
        assert!(matches!(compute_cycle(10, 0), Err(GovernanceError::Configuration(_))));
    }

    proptest! {
        #[test]
        fn prop_height_lies_within_its_cycle(height in 0u64..1_000_000_000, length in 1u64..100_000) {
            let info = compute_cycle(height, length).unwrap();
            prop_assert!(info.first_block_of_cycle <= height);
            prop_assert!(height < info.first_block_of_cycle + length);
            prop_assert_eq!(info.first_block_of_cycle + length - 1, height + info.blocks_remaining);
            prop_assert_eq!(info.cycle_index, info.first_block_of_cycle / length + 1);
        }
    }
}
