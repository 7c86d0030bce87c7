// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Transaction execution results as reported by the node, and the decoded
//! form consumed once by the operation synthesizer.

use icx_types::{
    codec::{self, CodecError},
    U256,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("malformed receipt: missing {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure,
}

impl ExecutionStatus {
    pub fn is_successful(&self) -> bool { *self == ExecutionStatus::Success }
}

/// A structured note emitted during execution. `indexed[0]` carries the
/// event signature; remaining operands sit at fixed positions in
/// `indexed` / `data` depending on the signature.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventLog {
    #[serde(rename = "scoreAddress")]
    pub score_address: String,
    #[serde(default)]
    pub indexed: Vec<Option<String>>,
    #[serde(default)]
    pub data: Vec<Option<String>>,
}

impl EventLog {
    pub fn signature(&self) -> Option<&str> {
        self.indexed.first().and_then(|s| s.as_deref())
    }
}

/// The wire form of `icx_getTransactionResult`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTxResult {
    pub status: Option<String>,
    pub step_used: Option<String>,
    pub step_price: Option<String>,
    pub cumulative_step_used: Option<String>,
    #[serde(rename = "stepUsedDetails")]
    pub step_details: Option<BTreeMap<String, String>>,
    pub event_logs: Option<Vec<EventLog>>,
    pub logs_bloom: Option<Value>,
    pub failure: Option<Value>,
    pub tx_hash: Option<String>,
    pub tx_index: Option<String>,
    pub block_height: Option<String>,
    pub block_hash: Option<String>,
    pub to: Option<String>,
    pub score_address: Option<String>,
}

impl RawTxResult {
    /// Decodes the wire result. `status` is mandatory; step counters
    /// default to zero when the node omits them (base rows).
    pub fn decode(self) -> Result<TxResult, ReceiptError> {
        let status = match self.status.as_deref() {
            None => return Err(ReceiptError::Missing("status")),
            Some("0x1") => ExecutionStatus::Success,
            Some(_) => ExecutionStatus::Failure,
        };
        let step_used = match &self.step_used {
            Some(text) => codec::u256_from_hex(text)?,
            None => U256::zero(),
        };
        let step_price = match &self.step_price {
            Some(text) => codec::u256_from_hex(text)?,
            None => U256::zero(),
        };
        let mut step_details = BTreeMap::new();
        for (account, text) in self.step_details.unwrap_or_default() {
            step_details.insert(account, codec::u256_from_hex(&text)?);
        }
        Ok(TxResult {
            status,
            step_used,
            step_price,
            step_details,
            event_logs: self.event_logs.unwrap_or_default(),
        })
    }
}

/// A decoded execution result. Consumed once per transaction by the
/// operation synthesizer; not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct TxResult {
    pub status: ExecutionStatus,
    pub step_used: U256,
    pub step_price: U256,
    /// Per-account step consumption, present only for sponsored calls.
    pub step_details: BTreeMap<String, U256>,
    pub event_logs: Vec<EventLog>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<TxResult, ReceiptError> {
        serde_json::from_value::<RawTxResult>(value).unwrap().decode()
    }

    #[test]
    fn decode_success_result() {
        let result = decode(json!({
            "status": "0x1",
            "stepUsed": "0x5",
            "stepPrice": "0xa",
            "cumulativeStepUsed": "0x5",
            "txHash": "0x375540830d475a73b704cf8dee9cd9f7390d21153ae1014975c5a8c53d097aa7",
        }))
        .unwrap();
        assert!(result.status.is_successful());
        assert_eq!(result.step_used, 5.into());
        assert_eq!(result.step_price, 10.into());
        assert!(result.event_logs.is_empty());
    }

    #[test]
    fn status_is_mandatory() {
        assert_eq!(
            decode(json!({ "stepUsed": "0x5" })),
            Err(ReceiptError::Missing("status"))
        );
    }

    #[test]
    fn non_one_status_is_failure() {
        let result = decode(json!({
            "status": "0x0",
            "failure": { "code": "0x7d64", "message": "Out of step" },
        }))
        .unwrap();
        assert_eq!(result.status, ExecutionStatus::Failure);
    }

    #[test]
    fn step_details_are_decoded() {
        let result = decode(json!({
            "status": "0x1",
            "stepUsed": "0x19",
            "stepPrice": "0x2",
            "stepUsedDetails": {
                "hxbe258ceb872e08851f1f59694dac2558708ece11": "0xa",
                "cx502c47463314f01e84b1b203c315180c89c0f425": "0xf",
            },
        }))
        .unwrap();
        assert_eq!(
            result.step_details
                ["hxbe258ceb872e08851f1f59694dac2558708ece11"],
            10.into()
        );
    }
}
