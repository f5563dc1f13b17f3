//! Sled-based implementation of the governance source traits

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use explorer_governance::{
    ChainSource, ConsensusParameterSource, StoreResult, SubjectSource, VoteEventSource, VoteQuery,
    VoterTallies, PARTITION_CEILING,
};
use explorer_types::{
    BlockRef, ConsensusParameter, ConsensusParameterSet, GovernanceSubject, Hash, Network,
    StoreError, SubjectRecord, SubjectType, VoteChoice,
};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::Db;

use crate::keys;

const TREE_PARAMETERS: &str = "parameters";
const TREE_BLOCKS: &str = "blocks";
const TREE_METADATA: &str = "metadata";
const TREE_VOTES: &str = "votes";
const TREE_EXCLUDED: &str = "excluded_votes";
const TREE_SUBJECTS: &str = "subjects";

/// Voters hash unevenly into partitions; the cap must clear the engine's
/// per-partition ceiling by this factor.
pub const BUCKET_HEADROOM: u64 = 2;

/// Default cap on distinct voters returned by one aggregation.
pub const MAX_BUCKETS: usize = (PARTITION_CEILING * BUCKET_HEADROOM) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Distinct voters a single vote query may return before it is rejected.
    pub max_buckets: usize,
    pub query_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_buckets: MAX_BUCKETS,
            query_timeout_ms: 30_000,
        }
    }
}

impl StoreConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Whether queries split at `partition_ceiling` voters per partition
    /// stay under `max_buckets` with room for uneven buckets.
    pub fn fits_partition_ceiling(&self, partition_ceiling: u64) -> bool {
        self.max_buckets as u64 >= partition_ceiling.saturating_mul(BUCKET_HEADROOM)
    }
}

/// Indexed chain data kept in sled trees.
///
/// # Fields
/// * `parameters` - Consensus parameter set per network
/// * `blocks` - Block references by height
/// * `metadata` - Best block per network
/// * `votes` - Vote events keyed by subject, height and voter
/// * `excluded` - Excluded vote count per absolute cycle
/// * `subjects` - Proposals, payment requests and consultation answers
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    parameters: sled::Tree,
    blocks: sled::Tree,
    metadata: sled::Tree,
    votes: sled::Tree,
    excluded: sled::Tree,
    subjects: sled::Tree,
    config: StoreConfig,
}

impl SledStore {
    /// Opens (or creates) the store at `path`.
    ///
    /// # Errors
    /// Returns `StoreError::Database` if the database cannot be opened
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> StoreResult<Self> {
        let db = sled::open(path.as_ref()).map_err(database)?;
        info!("Opened explorer store at {}", path.as_ref().display());
        Self::from_db(db, config)
    }

    /// An in-memory store that is discarded on drop.
    pub fn temporary(config: StoreConfig) -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open().map_err(database)?;
        Self::from_db(db, config)
    }

    fn from_db(db: Db, config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            parameters: db.open_tree(TREE_PARAMETERS).map_err(database)?,
            blocks: db.open_tree(TREE_BLOCKS).map_err(database)?,
            metadata: db.open_tree(TREE_METADATA).map_err(database)?,
            votes: db.open_tree(TREE_VOTES).map_err(database)?,
            excluded: db.open_tree(TREE_EXCLUDED).map_err(database)?,
            subjects: db.open_tree(TREE_SUBJECTS).map_err(database)?,
            db,
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush().map_err(database)?;
        Ok(())
    }

    pub fn put_parameters(&self, parameters: &ConsensusParameterSet) -> StoreResult<()> {
        let values: Vec<ConsensusParameter> = parameters.iter().copied().collect();
        insert_into_tree(
            &self.parameters,
            parameters.network.as_str().as_bytes(),
            &values,
        )
    }

    pub fn put_block(&self, network: Network, block: BlockRef) -> StoreResult<()> {
        insert_into_tree(&self.blocks, &keys::block_key(network, block.height), &block)
    }

    /// Record `block` as the network's tip. The block itself is indexed too.
    pub fn set_best_block(&self, network: Network, block: BlockRef) -> StoreResult<()> {
        self.put_block(network, block)?;
        insert_into_tree(&self.metadata, &keys::best_block_key(network), &block)
    }

    pub fn put_vote(
        &self,
        network: Network,
        subject_type: SubjectType,
        hash: &Hash,
        height: u64,
        voter: &str,
        choice: VoteChoice,
    ) -> StoreResult<()> {
        self.put_vote_code(network, subject_type, hash, height, voter, choice.code())
    }

    /// Stores a raw vote code as indexed. Unknown codes are rejected on read.
    pub(crate) fn put_vote_code(
        &self,
        network: Network,
        subject_type: SubjectType,
        hash: &Hash,
        height: u64,
        voter: &str,
        code: i8,
    ) -> StoreResult<()> {
        let key = keys::vote_key(network, subject_type, hash, height, voter);
        insert_into_tree(&self.votes, &key, &code)
    }

    pub fn put_excluded(&self, network: Network, cycle_index: u64, count: u64) -> StoreResult<()> {
        insert_into_tree(&self.excluded, &keys::excluded_key(network, cycle_index), &count)
    }

    pub fn put_subject(&self, network: Network, subject: &SubjectRecord) -> StoreResult<()> {
        let key = keys::subject_key(network, subject.subject_type(), &subject.hash());
        insert_into_tree(&self.subjects, &key, subject)
    }

    fn load_parameters(&self, network: Network) -> StoreResult<ConsensusParameterSet> {
        let values: Vec<ConsensusParameter> =
            get_from_tree(&self.parameters, network.as_str().as_bytes())?
                .ok_or_else(|| StoreError::NotFound(format!("consensus parameters for {}", network)))?;
        Ok(ConsensusParameterSet::new(network, values))
    }

    fn load_block(&self, network: Network, height: u64) -> StoreResult<BlockRef> {
        get_from_tree(&self.blocks, &keys::block_key(network, height))?
            .ok_or_else(|| StoreError::NotFound(format!("block at height {}", height)))
    }

    fn load_best_block(&self, network: Network) -> StoreResult<BlockRef> {
        get_from_tree(&self.metadata, &keys::best_block_key(network))?
            .ok_or_else(|| StoreError::NotFound(format!("best block for {}", network)))
    }

    fn load_excluded(&self, network: Network, cycle_index: u64) -> StoreResult<u64> {
        Ok(get_from_tree(&self.excluded, &keys::excluded_key(network, cycle_index))?.unwrap_or(0))
    }

    fn load_subject(
        &self,
        network: Network,
        subject_type: SubjectType,
        hash: &Hash,
    ) -> StoreResult<SubjectRecord> {
        get_from_tree(&self.subjects, &keys::subject_key(network, subject_type, hash))?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", subject_type, hash)))
    }

    /// Per-voter aggregation of one partition of a height range.
    fn scan_voters(&self, query: &VoteQuery) -> StoreResult<VoterTallies> {
        let prefix = keys::subject_key(query.network, query.subject_type, &query.subject_hash);
        let start = keys::vote_range_start(
            query.network,
            query.subject_type,
            &query.subject_hash,
            query.from_height,
        );
        let limit = self.config.max_buckets;
        let mut voters = VoterTallies::new();

        for item in self.votes.range(start..) {
            let (key, value) = item.map_err(database)?;
            if !key.starts_with(&prefix) {
                break;
            }
            let (height, voter) = keys::split_vote_key(&key[prefix.len()..])?;
            if height > query.to_height {
                break;
            }
            if keys::voter_partition(&voter, query.partitions) != query.partition {
                continue;
            }

            let code: i8 = decode(&value)?;
            let choice = VoteChoice::from_code(code).ok_or_else(|| {
                StoreError::Malformed(format!("vote code {} from {} at height {}", code, voter, height))
            })?;
            voters.entry(voter).or_default().record(choice);

            if voters.len() > limit {
                return Err(StoreError::TooManyBuckets {
                    buckets: voters.len(),
                    limit,
                });
            }
        }

        debug!(
            "Scanned [{}, {}] partition {}/{}: {} voters",
            query.from_height,
            query.to_height,
            query.partition,
            query.partitions,
            voters.len()
        );
        Ok(voters)
    }

    /// Run a read on the blocking pool, bounded by the query timeout.
    async fn blocking<T, F>(&self, read: F) -> StoreResult<T>
    where
        F: FnOnce(&SledStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        let task = tokio::task::spawn_blocking(move || read(&store));
        match tokio::time::timeout(self.config.query_timeout(), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => Err(StoreError::Database(format!("store task failed: {}", err))),
            Err(_) => {
                warn!(
                    "Store query exceeded {} ms",
                    self.config.query_timeout_ms
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl ConsensusParameterSource for SledStore {
    async fn parameters(&self, network: Network) -> StoreResult<ConsensusParameterSet> {
        self.blocking(move |store| store.load_parameters(network)).await
    }
}

#[async_trait]
impl ChainSource for SledStore {
    async fn block_by_height(&self, network: Network, height: u64) -> StoreResult<BlockRef> {
        self.blocking(move |store| store.load_block(network, height)).await
    }

    async fn best_block(&self, network: Network) -> StoreResult<BlockRef> {
        self.blocking(move |store| store.load_best_block(network)).await
    }
}

#[async_trait]
impl VoteEventSource for SledStore {
    async fn voter_tallies(&self, query: &VoteQuery) -> StoreResult<VoterTallies> {
        let query = query.clone();
        self.blocking(move |store| store.scan_voters(&query)).await
    }

    async fn excluded_votes(&self, network: Network, cycle_index: u64) -> StoreResult<u64> {
        self.blocking(move |store| store.load_excluded(network, cycle_index)).await
    }
}

#[async_trait]
impl SubjectSource for SledStore {
    async fn subject(
        &self,
        network: Network,
        subject_type: SubjectType,
        hash: Hash,
    ) -> StoreResult<SubjectRecord> {
        self.blocking(move |store| store.load_subject(network, subject_type, &hash)).await
    }
}

fn database(err: sled::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn insert_into_tree<T: Serialize + ?Sized>(tree: &sled::Tree, key: &[u8], value: &T) -> StoreResult<()> {
    tree.insert(key, encode(value)?).map_err(database)?;
    Ok(())
}

fn get_from_tree<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> StoreResult<Option<T>> {
    match tree.get(key).map_err(database)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}
