// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Fetch client for the node's JSON-RPC endpoint: blocks, transactions,
//! batched execution results, step pricing, and submission. Fetching is
//! async and retried; all parsing is delegated to the pure translation
//! crates.

pub mod jsonrpc;
pub mod retry;

use crate::jsonrpc::{JsonRpcClient, RpcError, RpcRequest};
use icx_ledger::{assemble, LedgerBlock, LedgerError};
use icx_types::{
    codec::{self, CodecError},
    Address, H256, U256, SYSTEM_SCORE,
};
use log::debug;
use primitives::{
    Block, BlockError, RawTransaction, RawTxResult, ReceiptError,
    Transaction, TransactionError, TxResult, UnsignedTransaction,
};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Full endpoint, e.g. `http://localhost:9000/api/v3`.
    pub endpoint: String,
    /// Receipts fetched per batch round trip.
    pub batch_size: usize,
    /// Round-trip attempts before a transport error is terminal.
    pub max_attempts: usize,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Config {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Config {
            endpoint: endpoint.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Latest,
    Height(u64),
    Hash(H256),
}

pub struct Client {
    rpc: JsonRpcClient,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let rpc =
            JsonRpcClient::new(config.endpoint.clone(), config.timeout)?;
        Ok(Client { rpc, config })
    }

    /// Fetches and normalizes one block, without receipts.
    pub async fn block(&self, id: &BlockId) -> Result<Block, ClientError> {
        let (method, params) = block_request(id);
        let raw = self.call(method, params).await?;
        Ok(Block::from_json(&raw)?)
    }

    /// The full translation path: fetch, normalize, batch-fetch receipts
    /// in transaction order, synthesize operations, embed them back.
    pub async fn block_with_operations(
        &self, id: &BlockId,
    ) -> Result<LedgerBlock, ClientError> {
        let block = self.block(id).await?;
        debug!(
            "assembling block #{} with {} transactions",
            block.index,
            block.transactions.len()
        );
        let results = self.receipts_for(&block).await?;
        Ok(assemble(block, &results)?)
    }

    /// Batched receipt fetch, `batch_size` per round trip, concurrent
    /// across batches. Results are re-aligned to transaction order by
    /// request id; rows without receipts (the genesis document) stay
    /// `None`.
    pub async fn receipts_for(
        &self, block: &Block,
    ) -> Result<Vec<Option<TxResult>>, ClientError> {
        let mut results: Vec<Option<TxResult>> =
            vec![None; block.transactions.len()];

        let pending: Vec<(usize, RpcRequest)> = block
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.requires_receipt())
            .map(|(position, tx)| {
                let params = json!({ "txHash": format!("{:#x}", tx.hash) });
                (
                    position,
                    RpcRequest::new(
                        "icx_getTransactionResult",
                        Some(params),
                        self.rpc.next_id(),
                    ),
                )
            })
            .collect();

        let batches = pending
            .chunks(self.config.batch_size.max(1))
            .map(|chunk| async move {
                let requests: Vec<RpcRequest> =
                    chunk.iter().map(|(_, request)| request.clone()).collect();
                let values = retry::with_retry(
                    self.config.max_attempts,
                    self.config.retry_delay,
                    "icx_getTransactionResult",
                    || self.rpc.request_batch(&requests),
                )
                .await?;
                Ok::<_, ClientError>((chunk, values))
            });

        for (chunk, values) in
            futures::future::try_join_all(batches).await?
        {
            for ((position, _), value) in chunk.iter().zip(values) {
                let raw: RawTxResult = serde_json::from_value(value)?;
                results[*position] = Some(raw.decode()?);
            }
        }
        Ok(results)
    }

    pub async fn transaction(
        &self, hash: H256,
    ) -> Result<Transaction, ClientError> {
        let params = json!({ "txHash": format!("{:#x}", hash) });
        let raw = self
            .call("icx_getTransactionByHash", Some(params))
            .await?;
        Ok(RawTransaction::from_json(&raw)?.decode()?)
    }

    pub async fn transaction_result(
        &self, hash: H256,
    ) -> Result<TxResult, ClientError> {
        let params = json!({ "txHash": format!("{:#x}", hash) });
        let raw = self
            .call("icx_getTransactionResult", Some(params))
            .await?;
        let raw: RawTxResult = serde_json::from_value(raw)?;
        Ok(raw.decode()?)
    }

    pub async fn balance(
        &self, address: &Address, height: Option<u64>,
    ) -> Result<U256, ClientError> {
        let mut params = json!({ "address": address });
        if let Some(height) = height {
            params["height"] = json!(format!("{:#x}", height));
        }
        let result = self.call("icx_getBalance", Some(params)).await?;
        hex_result(&result)
    }

    /// Submits a serialized signed transaction; the node answers with the
    /// transaction hash.
    pub async fn send_transaction(
        &self, signed_tx: &str,
    ) -> Result<H256, ClientError> {
        let params: Value = serde_json::from_str(signed_tx)?;
        let result = self.call("icx_sendTransaction", Some(params)).await?;
        let text = result.as_str().ok_or_else(|| {
            ClientError::UnexpectedResponse(format!(
                "expected a transaction hash, got {}",
                result
            ))
        })?;
        Ok(codec::h256_from_hex(text)?)
    }

    pub async fn estimate_step(
        &self, tx: &UnsignedTransaction,
    ) -> Result<U256, ClientError> {
        let params = serde_json::to_value(tx)?;
        let result = self.call("debug_estimateStep", Some(params)).await?;
        hex_result(&result)
    }

    pub async fn step_price(&self) -> Result<U256, ClientError> {
        let result = self
            .call("icx_call", Some(system_call("getStepPrice")))
            .await?;
        hex_result(&result)
    }

    pub async fn default_step_cost(&self) -> Result<U256, ClientError> {
        let result = self
            .call("icx_call", Some(system_call("getStepCosts")))
            .await?;
        let default = result.get("default").ok_or_else(|| {
            ClientError::UnexpectedResponse(
                "step cost table without a default entry".into(),
            )
        })?;
        hex_result(default)
    }

    async fn call(
        &self, method: &str, params: Option<Value>,
    ) -> Result<Value, ClientError> {
        retry::with_retry(
            self.config.max_attempts,
            self.config.retry_delay,
            method,
            || self.rpc.request(method, params.clone()),
        )
        .await
    }
}

fn block_request(id: &BlockId) -> (&'static str, Option<Value>) {
    match id {
        BlockId::Latest => ("icx_getLastBlock", None),
        BlockId::Height(height) => (
            "icx_getBlockByHeight",
            Some(json!({ "height": format!("{:#x}", height) })),
        ),
        BlockId::Hash(hash) => (
            "icx_getBlockByHash",
            Some(json!({ "hash": format!("{:#x}", hash) })),
        ),
    }
}

/// A read-only `icx_call` against the system score.
fn system_call(method: &str) -> Value {
    json!({
        "to": SYSTEM_SCORE.to_string(),
        "dataType": "call",
        "data": { "method": method },
    })
}

fn hex_result(value: &Value) -> Result<U256, ClientError> {
    let text = value.as_str().ok_or_else(|| {
        ClientError::UnexpectedResponse(format!(
            "expected a hex quantity, got {}",
            value
        ))
    })?;
    Ok(codec::u256_from_hex(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_request_parameters() {
        assert_eq!(block_request(&BlockId::Latest).0, "icx_getLastBlock");

        let (method, params) = block_request(&BlockId::Height(0x2edf00a));
        assert_eq!(method, "icx_getBlockByHeight");
        assert_eq!(params.unwrap(), json!({ "height": "0x2edf00a" }));

        let hash =
            "0xd04dd925a23e83add6e9a18d6e501c75cd3f4f2cbba9ed95b252e92cd3cbd3ca";
        let (method, params) =
            block_request(&BlockId::Hash(hash[2..].parse().unwrap()));
        assert_eq!(method, "icx_getBlockByHash");
        assert_eq!(params.unwrap(), json!({ "hash": hash }));
    }

    #[test]
    fn config_defaults() {
        let config = Config::new("http://localhost:9000/api/v3");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn system_call_shape() {
        assert_eq!(
            system_call("getStepPrice"),
            json!({
                "to": "cx0000000000000000000000000000000000000000",
                "dataType": "call",
                "data": { "method": "getStepPrice" },
            })
        );
    }
}
