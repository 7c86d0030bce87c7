// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Operation synthesis: turns decoded transactions and their execution
//! results into ordered, balanced operation lists, and constructs /
//! verifies outgoing transactions from an operation-based intent.

pub mod block;
pub mod construction;
pub mod events;
pub mod fee;
pub mod ops;

use icx_types::codec::CodecError;
use primitives::TransactionError;
use thiserror::Error;

pub use crate::{
    block::{assemble, LedgerBlock, LedgerTransaction},
    construction::{
        build_unsigned, combine, parse, transaction_hash, ConstructionError,
        ConstructionMeta, UnsignedPayload,
    },
    fee::FeeCharge,
    ops::operations,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The execution result is missing or unusable; balanced operations
    /// cannot be fabricated without it.
    #[error("transaction receipt unavailable")]
    ReceiptUnavailable,
    #[error("receipt count mismatch: {expected} transactions, {got} results")]
    ReceiptCountMismatch { expected: usize, got: usize },
    #[error("malformed event log: {0}")]
    MalformedEvent(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
