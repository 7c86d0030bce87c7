// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Minimal JSON-RPC 2.0 client over HTTP: single and batch POST. Batch
//! responses are matched back to their requests by id before use, so a
//! server that reorders a batch cannot reorder receipts.

use crate::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use thiserror::Error;

const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: &str, params: Option<Value>, id: u64) -> Self {
        RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(
        endpoint: String, timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(JsonRpcClient {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn request(
        &self, method: &str, params: Option<Value>,
    ) -> Result<Value, ClientError> {
        let request = RpcRequest::new(method, params, self.next_id());
        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        unwrap_response(response)
    }

    /// Sends a batch in one round trip. The returned values follow the
    /// order of `requests`; any missing or errored entry fails the whole
    /// batch so it can be retried in full.
    pub async fn request_batch(
        &self, requests: &[RpcRequest],
    ) -> Result<Vec<Value>, ClientError> {
        let responses: Vec<RpcResponse> = self
            .http
            .post(&self.endpoint)
            .json(&requests)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match_batch(requests, responses)
    }
}

fn unwrap_response(response: RpcResponse) -> Result<Value, ClientError> {
    if let Some(error) = response.error {
        return Err(ClientError::Rpc(error));
    }
    response.result.ok_or_else(|| {
        ClientError::UnexpectedResponse("response without result".into())
    })
}

/// Restores request order by response id.
pub fn match_batch(
    requests: &[RpcRequest], responses: Vec<RpcResponse>,
) -> Result<Vec<Value>, ClientError> {
    if responses.len() != requests.len() {
        return Err(ClientError::UnexpectedResponse(format!(
            "batch of {} answered with {} entries",
            requests.len(),
            responses.len()
        )));
    }
    let mut by_id: HashMap<u64, RpcResponse> = responses
        .into_iter()
        .filter_map(|response| response.id.map(|id| (id, response)))
        .collect();
    requests
        .iter()
        .map(|request| {
            let response = by_id.remove(&request.id).ok_or_else(|| {
                ClientError::UnexpectedResponse(format!(
                    "batch response is missing id {}",
                    request.id
                ))
            })?;
            unwrap_response(response)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(id: u64, result: Value) -> RpcResponse {
        RpcResponse {
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    #[test]
    fn batch_results_follow_request_order() {
        let requests = vec![
            RpcRequest::new("icx_getTransactionResult", None, 7),
            RpcRequest::new("icx_getTransactionResult", None, 8),
        ];
        // Server answered in reverse.
        let responses = vec![response(8, json!("b")), response(7, json!("a"))];
        let values = match_batch(&requests, responses).unwrap();
        assert_eq!(values, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn one_errored_entry_fails_the_whole_batch() {
        let requests = vec![
            RpcRequest::new("icx_getTransactionResult", None, 1),
            RpcRequest::new("icx_getTransactionResult", None, 2),
        ];
        let responses = vec![
            response(1, json!("a")),
            RpcResponse {
                result: None,
                error: Some(RpcError {
                    code: -31004,
                    message: "not found".into(),
                }),
                id: Some(2),
            },
        ];
        assert!(matches!(
            match_batch(&requests, responses),
            Err(ClientError::Rpc(_))
        ));
    }

    #[test]
    fn short_batch_is_rejected() {
        let requests = vec![
            RpcRequest::new("icx_getTransactionResult", None, 1),
            RpcRequest::new("icx_getTransactionResult", None, 2),
        ];
        assert!(matches!(
            match_batch(&requests, vec![response(1, json!("a"))]),
            Err(ClientError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn request_serialization() {
        let request = RpcRequest::new(
            "icx_getBlockByHeight",
            Some(json!({ "height": "0x2a" })),
            3,
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "icx_getBlockByHeight",
                "params": { "height": "0x2a" },
                "id": 3,
            })
        );
    }
}
