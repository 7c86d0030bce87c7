// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Block-format normalization. The node has produced two wire families
//! over its history: the original `0.1a` schema and the current schema
//! shared by the `0.3`/`0.4`/`0.5` point revisions. Both normalize into
//! one in-memory [`Block`] with microsecond timestamps.

use crate::transaction::{
    GenesisDocument, RawTransaction, Transaction, TransactionError,
};
use icx_types::{
    codec::{self, CodecError},
    H256,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const GENESIS_BLOCK_INDEX: u64 = 0;

const LEGACY_VERSION: &str = "0.1a";
const CURRENT_VERSIONS: [&str; 3] = ["0.3", "0.4", "0.5"];

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("unsupported block version {0:?}")]
    UnsupportedVersion(String),
    #[error("malformed block: {0}")]
    Malformed(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// A format-normalized block. Owns its decoded transactions; handed to
/// the storage layer as an immutable value.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub index: u64,
    pub hash: H256,
    /// Absent only for the genesis block.
    pub parent_hash: Option<H256>,
    /// Microseconds, in both format families.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    /// Format-specific fields preserved for downstream consumers.
    pub metadata: Map<String, Value>,
}

impl Block {
    /// Normalizes a raw block by its version tag. Unrecognized tags yield
    /// [`BlockError::UnsupportedVersion`] and no partial result.
    pub fn from_json(raw: &Value) -> Result<Block, BlockError> {
        let version =
            raw.get("version").and_then(Value::as_str).unwrap_or_default();
        if version == LEGACY_VERSION {
            LegacyBlock::parse(raw)
        } else if CURRENT_VERSIONS.contains(&version) {
            CurrentBlock::parse(raw)
        } else {
            Err(BlockError::UnsupportedVersion(version.into()))
        }
    }

    pub fn is_genesis(&self) -> bool { self.index == GENESIS_BLOCK_INDEX }
}

/// The original block schema: decimal heights, snake_case fields,
/// microsecond timestamps as JSON numbers, hashes without a `0x` prefix.
#[derive(Debug, Deserialize)]
struct LegacyBlock {
    version: String,
    height: u64,
    #[serde(rename = "time_stamp", deserialize_with = "codec::de_i64_flex")]
    time_stamp: i64,
    #[serde(rename = "block_hash")]
    block_hash: String,
    #[serde(rename = "prev_block_hash", default)]
    prev_block_hash: Option<String>,
    #[serde(rename = "peer_id", default)]
    peer_id: Value,
    #[serde(default)]
    signature: Value,
    #[serde(rename = "next_leader", default)]
    next_leader: Value,
    #[serde(rename = "merkle_tree_root_hash", default)]
    merkle_tree_root_hash: Value,
    #[serde(rename = "confirmed_transaction_list", default)]
    transactions: Vec<Value>,
}

impl LegacyBlock {
    fn parse(raw: &Value) -> Result<Block, BlockError> {
        let blk: LegacyBlock = serde_json::from_value(raw.clone())
            .map_err(|e| BlockError::Malformed(e.to_string()))?;

        let mut metadata = Map::new();
        metadata.insert("version".into(), Value::String(blk.version.clone()));
        metadata.insert("peer_id".into(), blk.peer_id.clone());
        metadata.insert("signature".into(), blk.signature.clone());
        metadata.insert("next_leader".into(), blk.next_leader.clone());
        metadata.insert(
            "merkle_tree_root_hash".into(),
            blk.merkle_tree_root_hash.clone(),
        );

        let (parent_hash, transactions) =
            if blk.height == GENESIS_BLOCK_INDEX {
                (None, genesis_transactions(&blk.transactions)?)
            } else {
                let parent = blk.prev_block_hash.as_deref().ok_or_else(
                    || BlockError::Malformed("missing prev_block_hash".into()),
                )?;
                (
                    Some(codec::h256_from_hex(parent)?),
                    decode_transactions(&blk.transactions)?,
                )
            };

        Ok(Block {
            index: blk.height,
            hash: codec::h256_from_hex(&blk.block_hash)?,
            parent_hash,
            timestamp: blk.time_stamp,
            transactions,
            metadata,
        })
    }
}

/// The current block schema, shared by the `0.3`, `0.4` and `0.5`
/// revisions: hex heights and microsecond hex timestamps.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentBlock {
    version: String,
    height: String,
    timestamp: String,
    hash: String,
    #[serde(default)]
    prev_hash: Option<String>,
    #[serde(default)]
    transactions_hash: Value,
    #[serde(default)]
    state_hash: Value,
    #[serde(default)]
    receipts_hash: Value,
    #[serde(default)]
    reps_hash: Value,
    #[serde(default)]
    next_reps_hash: Value,
    #[serde(default)]
    leader_votes_hash: Value,
    #[serde(default)]
    prev_votes_hash: Value,
    #[serde(default)]
    logs_bloom: Value,
    #[serde(default)]
    leader_votes: Value,
    #[serde(default)]
    prev_votes: Value,
    #[serde(default)]
    leader: Value,
    #[serde(default)]
    signature: Value,
    #[serde(default)]
    next_leader: Value,
    #[serde(rename = "confirmed_transaction_list", default)]
    transactions: Vec<Value>,
}

impl CurrentBlock {
    fn parse(raw: &Value) -> Result<Block, BlockError> {
        let blk: CurrentBlock = serde_json::from_value(raw.clone())
            .map_err(|e| BlockError::Malformed(e.to_string()))?;
        let index = codec::u64_from_hex(&blk.height)?;

        let mut metadata = Map::new();
        metadata.insert("version".into(), Value::String(blk.version.clone()));
        metadata
            .insert("transactionsHash".into(), blk.transactions_hash.clone());
        metadata.insert("stateHash".into(), blk.state_hash.clone());
        metadata.insert("receiptsHash".into(), blk.receipts_hash.clone());
        metadata.insert("repsHash".into(), blk.reps_hash.clone());
        metadata.insert("nextRepsHash".into(), blk.next_reps_hash.clone());
        metadata
            .insert("leaderVotesHash".into(), blk.leader_votes_hash.clone());
        metadata.insert("prevVotesHash".into(), blk.prev_votes_hash.clone());
        metadata.insert("logsBloom".into(), blk.logs_bloom.clone());
        metadata.insert("leaderVotes".into(), blk.leader_votes.clone());
        metadata.insert("prevVotes".into(), blk.prev_votes.clone());
        metadata.insert("leader".into(), blk.leader.clone());
        metadata.insert("signature".into(), blk.signature.clone());
        metadata.insert("nextLeader".into(), blk.next_leader.clone());

        let (parent_hash, transactions) = if index == GENESIS_BLOCK_INDEX {
            (None, genesis_transactions(&blk.transactions)?)
        } else {
            let parent = blk.prev_hash.as_deref().ok_or_else(|| {
                BlockError::Malformed("missing prevHash".into())
            })?;
            (
                Some(codec::h256_from_hex(parent)?),
                decode_transactions(&blk.transactions)?,
            )
        };

        Ok(Block {
            index,
            hash: codec::h256_from_hex(&blk.hash)?,
            parent_hash,
            timestamp: codec::i64_from_hex(&blk.timestamp)?,
            transactions,
            metadata,
        })
    }
}

fn decode_transactions(
    raws: &[Value],
) -> Result<Vec<Transaction>, BlockError> {
    raws.iter()
        .map(|raw| Ok(RawTransaction::from_json(raw)?.decode()?))
        .collect()
}

/// Block zero embeds pre-fund documents instead of ordinary transactions.
fn genesis_transactions(
    raws: &[Value],
) -> Result<Vec<Transaction>, BlockError> {
    raws.iter()
        .map(|raw| {
            let document: GenesisDocument =
                serde_json::from_value(raw.clone())
                    .map_err(|e| BlockError::Malformed(e.to_string()))?;
            Ok(Transaction::genesis(document))
        })
        .collect()
}
