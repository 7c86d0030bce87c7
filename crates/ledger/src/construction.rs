// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Outbound construction: turns a transfer intent (a balanced operation
//! pair) into an unsigned transaction plus its signing payload, attaches
//! and verifies signatures, and re-derives intent from serialized
//! payloads. Hashing always runs through the one canonical serializer in
//! `primitives`.

use crate::ops::{credit, debit};
use icx_types::{Address, H256, U256};
use icxkey::Signature;
use primitives::{
    OpStatus, OpType, Operation, SignedTransaction, TransactionError,
    UnsignedTransaction, ICX,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("unable to parse intent: {0}")]
    UnclearIntent(String),
    #[error("malformed transaction payload: {0}")]
    MalformedPayload(String),
    #[error("recovered signer does not match the declared sender")]
    SignatureMismatch,
}

/// Fee and network metadata for construction, resolved upstream (step
/// estimation, network id) and passed in so payloads hash reproducibly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionMeta {
    pub step_limit: U256,
    /// Microseconds since the epoch.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
}

/// The two halves handed back to the signer: the digest to sign and the
/// serialized unsigned transaction to combine with the signature later.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedPayload {
    pub signing_hash: H256,
    pub transaction: String,
}

/// Builds an unsigned transfer from an operation-based intent.
pub fn build_unsigned(
    operations: &[Operation], meta: &ConstructionMeta,
) -> Result<UnsignedPayload, ConstructionError> {
    let (from, to, value) = transfer_intent(operations)?;
    let timestamp = u64::try_from(meta.timestamp).map_err(|_| {
        ConstructionError::UnclearIntent("negative timestamp".into())
    })?;
    let unsigned = UnsignedTransaction {
        version: 3.into(),
        from,
        to,
        value: Some(value),
        step_limit: meta.step_limit,
        timestamp: timestamp.into(),
        nid: meta.nid,
        nonce: meta.nonce,
        data_type: None,
        data: None,
    };
    let transaction = serde_json::to_string(&unsigned)
        .map_err(|e| ConstructionError::MalformedPayload(e.to_string()))?;
    Ok(UnsignedPayload {
        signing_hash: unsigned.hash(),
        transaction,
    })
}

/// Attaches a detached signature to a serialized unsigned transaction,
/// rejecting signatures that do not recover to the declared sender.
pub fn combine(
    unsigned_tx: &str, signature: Signature,
) -> Result<String, ConstructionError> {
    let unsigned: UnsignedTransaction = serde_json::from_str(unsigned_tx)
        .map_err(|e| ConstructionError::MalformedPayload(e.to_string()))?;
    let signed = SignedTransaction::new(unsigned, signature);
    match signed.verify_signature() {
        Ok(()) => serde_json::to_string(&signed)
            .map_err(|e| ConstructionError::MalformedPayload(e.to_string())),
        Err(TransactionError::SignatureMismatch) => {
            Err(ConstructionError::SignatureMismatch)
        }
        Err(e) => Err(ConstructionError::MalformedPayload(e.to_string())),
    }
}

/// Re-derives the intent pair from a serialized transaction. Signed
/// payloads also report the accounts that signed.
pub fn parse(
    transaction: &str, signed: bool,
) -> Result<(Vec<Operation>, Vec<Address>), ConstructionError> {
    let unsigned: UnsignedTransaction = if signed {
        let tx: SignedTransaction = serde_json::from_str(transaction)
            .map_err(|e| {
                ConstructionError::MalformedPayload(e.to_string())
            })?;
        tx.unsigned
    } else {
        serde_json::from_str(transaction).map_err(|e| {
            ConstructionError::MalformedPayload(e.to_string())
        })?
    };

    let value = unsigned.value.unwrap_or_default();
    let mut operations = vec![
        debit(0, OpType::Transfer, unsigned.from, value, OpStatus::Success),
        credit(1, OpType::Transfer, unsigned.to, value, OpStatus::Success)
            .related_to(0),
    ];
    for op in &mut operations {
        op.status = None;
    }

    let signers = if signed { vec![unsigned.from] } else { vec![] };
    Ok((operations, signers))
}

/// The canonical hash of a serialized (signed) transaction.
pub fn transaction_hash(
    signed_tx: &str,
) -> Result<H256, ConstructionError> {
    let signed: SignedTransaction = serde_json::from_str(signed_tx)
        .map_err(|e| ConstructionError::MalformedPayload(e.to_string()))?;
    Ok(signed.unsigned.hash())
}

/// Matches the intent: exactly one debit and one credit, both plain
/// transfers of the native currency with equal magnitude.
fn transfer_intent(
    operations: &[Operation],
) -> Result<(Address, Address, U256), ConstructionError> {
    if operations.len() != 2 {
        return Err(ConstructionError::UnclearIntent(format!(
            "expected a transfer pair, got {} operations",
            operations.len()
        )));
    }

    let mut debit_side = None;
    let mut credit_side = None;
    for op in operations {
        if op.op_type != OpType::Transfer {
            return Err(ConstructionError::UnclearIntent(format!(
                "unexpected {} operation",
                op.op_type
            )));
        }
        let account = op.account.ok_or_else(|| {
            ConstructionError::UnclearIntent("operation without account".into())
        })?;
        let amount = op.amount.as_ref().ok_or_else(|| {
            ConstructionError::UnclearIntent("operation without amount".into())
        })?;
        if amount.currency != *ICX {
            return Err(ConstructionError::UnclearIntent(format!(
                "unsupported currency {}",
                amount.currency.symbol
            )));
        }
        let (negative, magnitude) = amount.signed().ok_or_else(|| {
            ConstructionError::UnclearIntent(format!(
                "unparseable amount {:?}",
                amount.value
            ))
        })?;
        let side = if negative {
            &mut debit_side
        } else {
            &mut credit_side
        };
        if side.replace((account, magnitude)).is_some() {
            return Err(ConstructionError::UnclearIntent(
                "duplicate operation side".into(),
            ));
        }
    }

    match (debit_side, credit_side) {
        (Some((from, sent)), Some((to, received))) if sent == received => {
            Ok((from, to, sent))
        }
        (Some(_), Some(_)) => Err(ConstructionError::UnclearIntent(
            "debit and credit magnitudes differ".into(),
        )),
        _ => Err(ConstructionError::UnclearIntent(
            "missing debit or credit side".into(),
        )),
    }
}
