// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{ops, LedgerError};
use icx_types::H256;
use primitives::{Block, Operation, TxResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// A normalized block with synthesized operations embedded, ready for the
/// storage layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerBlock {
    pub index: u64,
    pub hash: H256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<H256>,
    /// Microseconds.
    pub timestamp: i64,
    pub transactions: Vec<LedgerTransaction>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub hash: H256,
    pub operations: Vec<Operation>,
    pub metadata: Map<String, Value>,
}

/// Embeds per-transaction operations into a normalized block. `results`
/// must align positionally with the block's transactions; rows that carry
/// no result (the genesis document) pass `None`.
pub fn assemble(
    block: Block, results: &[Option<TxResult>],
) -> Result<LedgerBlock, LedgerError> {
    if results.len() != block.transactions.len() {
        return Err(LedgerError::ReceiptCountMismatch {
            expected: block.transactions.len(),
            got: results.len(),
        });
    }

    let mut transactions = Vec::with_capacity(block.transactions.len());
    for (tx, result) in block.transactions.into_iter().zip(results) {
        let operations = ops::operations(&tx, result.as_ref())?;
        transactions.push(LedgerTransaction {
            hash: tx.hash,
            operations,
            metadata: tx.metadata,
        });
    }

    Ok(LedgerBlock {
        index: block.index,
        hash: block.hash,
        parent_hash: block.parent_hash,
        timestamp: block.timestamp,
        transactions,
        metadata: block.metadata,
    })
}
