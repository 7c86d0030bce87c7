// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Per-transaction operation synthesis. Index assignment is fixed:
//! principal debit/credit first, then the fee pair, then event-derived
//! operations, contiguous from zero.

use crate::{events, fee::FeeCharge, LedgerError};
use icx_types::{Address, SYSTEM_SCORE, TREASURY, U256};
use primitives::{
    Amount, ExecutionStatus, OpStatus, OpType, Operation, Transaction,
    TransactionError, TransactionKind, TxResult, TxVersion,
};
use serde_json::{Map, Value};

/// Synthesizes the ordered operation list for one transaction. Non-genesis
/// rows need their execution result; a missing result is
/// [`LedgerError::ReceiptUnavailable`], never a partial, unbalanced list.
pub fn operations(
    tx: &Transaction, result: Option<&TxResult>,
) -> Result<Vec<Operation>, LedgerError> {
    if tx.kind == TransactionKind::Genesis {
        let document = tx
            .genesis
            .as_ref()
            .ok_or(TransactionError::Missing("genesis document"))?;
        return Ok(genesis_operations(document));
    }

    let result = result.ok_or(LedgerError::ReceiptUnavailable)?;
    let status = op_status(result.status);

    if tx.kind == TransactionKind::Base {
        let mut ops = vec![Operation {
            index: 0,
            related: vec![],
            op_type: OpType::Base,
            status: Some(status),
            account: None,
            amount: None,
            metadata: None,
        }];
        append_event_operations(&mut ops, result, &SYSTEM_SCORE, status)?;
        return Ok(ops);
    }

    let from = tx.from.ok_or(TransactionError::Missing("from"))?;
    let to = tx.to.ok_or(TransactionError::Missing("to"))?;
    let value = tx.value.unwrap_or_default();
    let principal = principal_op_type(tx.kind, &to);

    let mut ops = vec![
        debit(0, principal, from, value, status),
        credit(1, principal, to, value, status).related_to(0),
    ];

    // The fee is charged even when the call itself fails, so the fee pair
    // always reads SUCCESS. This mirrors the source ledger's accounting
    // and must not be "fixed" here.
    let charge = match tx.version {
        TxVersion::Stepped => FeeCharge::compute(&from, result),
        TxVersion::Legacy => legacy_charge(tx),
    };
    if let Some(charge) = charge {
        let index = ops.len() as i64;
        ops.push(debit(
            index,
            OpType::Fee,
            from,
            charge.payer_share,
            OpStatus::Success,
        ));
        ops.push(
            credit(
                index + 1,
                OpType::Fee,
                *TREASURY,
                charge.total,
                OpStatus::Success,
            )
            .related_to(index),
        );
    }

    append_event_operations(&mut ops, result, &from, status)?;
    Ok(ops)
}

/// Genesis pre-fund rows: one credit per account with no debit
/// counterpart (the zero-sum rule is intentionally relaxed for block
/// zero), closed by a metadata-only message operation.
fn genesis_operations(
    document: &primitives::GenesisDocument,
) -> Vec<Operation> {
    let mut ops: Vec<Operation> = document
        .accounts
        .iter()
        .enumerate()
        .map(|(position, account)| {
            let mut metadata = Map::new();
            metadata
                .insert("name".into(), Value::String(account.name.clone()));
            Operation {
                index: position as i64,
                related: vec![],
                op_type: OpType::Genesis,
                status: Some(OpStatus::Success),
                account: Some(account.address),
                amount: Some(Amount::icx_credit(account.balance)),
                metadata: Some(metadata),
            }
        })
        .collect();

    let mut metadata = Map::new();
    metadata
        .insert("message".into(), Value::String(document.message.clone()));
    ops.push(Operation {
        index: ops.len() as i64,
        related: vec![],
        op_type: OpType::Message,
        status: Some(OpStatus::Success),
        account: None,
        amount: None,
        metadata: Some(metadata),
    });
    ops
}

fn append_event_operations(
    ops: &mut Vec<Operation>, result: &TxResult, claimant: &Address,
    status: OpStatus,
) -> Result<(), LedgerError> {
    for log in &result.event_logs {
        let derived =
            events::operations(log, claimant, ops.len() as i64, status)?;
        ops.extend(derived);
    }
    Ok(())
}

/// Legacy transactions declared a flat `fee`; there was no metering to
/// reconcile against.
fn legacy_charge(tx: &Transaction) -> Option<FeeCharge> {
    let fee = tx.limit.unwrap_or_default();
    if fee.is_zero() {
        return None;
    }
    Some(FeeCharge {
        total: fee,
        payer_share: fee,
    })
}

/// Transfers addressed to a contract read as calls; other kinds map
/// directly onto their operation type.
fn principal_op_type(kind: TransactionKind, to: &Address) -> OpType {
    match kind {
        TransactionKind::Deploy => OpType::Deploy,
        TransactionKind::Call => OpType::Call,
        TransactionKind::Message => OpType::Message,
        TransactionKind::Deposit => OpType::Deposit,
        TransactionKind::Transfer if to.is_contract() => OpType::Call,
        TransactionKind::Transfer => OpType::Transfer,
        // Handled before principal synthesis.
        TransactionKind::Base | TransactionKind::Genesis => OpType::Transfer,
    }
}

fn op_status(status: ExecutionStatus) -> OpStatus {
    match status {
        ExecutionStatus::Success => OpStatus::Success,
        ExecutionStatus::Failure => OpStatus::Failure,
    }
}

pub(crate) fn debit(
    index: i64, op_type: OpType, account: Address, value: U256,
    status: OpStatus,
) -> Operation {
    Operation {
        index,
        related: vec![],
        op_type,
        status: Some(status),
        account: Some(account),
        amount: Some(Amount::icx_debit(value)),
        metadata: None,
    }
}

pub(crate) fn credit(
    index: i64, op_type: OpType, account: Address, value: U256,
    status: OpStatus,
) -> Operation {
    Operation {
        index,
        related: vec![],
        op_type,
        status: Some(status),
        account: Some(account),
        amount: Some(Amount::icx_credit(value)),
        metadata: None,
    }
}
