//! Key layout for the sled trees.
//!
//! All integers are big-endian so that lexicographic key order matches
//! numeric order and height ranges can be scanned directly.

use explorer_types::{Hash, Network, StoreError, SubjectType};

/// `network \0`
pub fn network_prefix(network: Network) -> Vec<u8> {
    let mut key = network.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

pub fn block_key(network: Network, height: u64) -> Vec<u8> {
    let mut key = network_prefix(network);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

pub fn best_block_key(network: Network) -> Vec<u8> {
    let mut key = b"best\0".to_vec();
    key.extend_from_slice(network.as_str().as_bytes());
    key
}

pub fn excluded_key(network: Network, cycle_index: u64) -> Vec<u8> {
    let mut key = network_prefix(network);
    key.extend_from_slice(&cycle_index.to_be_bytes());
    key
}

/// `network \0 | type tag | hash`, shared by subjects and their votes.
pub fn subject_key(network: Network, subject_type: SubjectType, hash: &Hash) -> Vec<u8> {
    let mut key = network_prefix(network);
    key.push(subject_type.tag());
    key.extend_from_slice(hash.as_bytes());
    key
}

/// `subject key | height | voter`
pub fn vote_key(
    network: Network,
    subject_type: SubjectType,
    hash: &Hash,
    height: u64,
    voter: &str,
) -> Vec<u8> {
    let mut key = vote_range_start(network, subject_type, hash, height);
    key.extend_from_slice(voter.as_bytes());
    key
}

pub fn vote_range_start(network: Network, subject_type: SubjectType, hash: &Hash, height: u64) -> Vec<u8> {
    let mut key = subject_key(network, subject_type, hash);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Split the tail of a vote key (after the subject prefix) into height and
/// voter.
pub fn split_vote_key(tail: &[u8]) -> Result<(u64, String), StoreError> {
    if tail.len() < 8 {
        return Err(StoreError::Malformed(format!(
            "vote key tail of {} bytes",
            tail.len()
        )));
    }
    let (height, voter) = tail.split_at(8);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(height);
    let voter = std::str::from_utf8(voter)
        .map_err(|e| StoreError::Malformed(format!("voter address: {}", e)))?;
    Ok((u64::from_be_bytes(buf), voter.to_string()))
}

/// Stable bucket for a voter: the first eight bytes of its blake3 digest,
/// modulo the partition count.
pub fn voter_partition(voter: &str, partitions: u32) -> u32 {
    let digest = blake3::hash(voter.as_bytes());
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[..8]);
    (u64::from_be_bytes(buf) % partitions.max(1) as u64) as u32
}
