// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

pub mod block;
pub mod operation;
pub mod receipt;
pub mod transaction;

pub use crate::{
    block::{Block, BlockError},
    operation::{
        Amount, Currency, OpStatus, OpType, Operation, ICX, OPERATION_STATUSES,
        OPERATION_TYPES,
    },
    receipt::{EventLog, ExecutionStatus, RawTxResult, ReceiptError, TxResult},
    transaction::{
        GenesisAccount, GenesisDocument, RawTransaction, SignedTransaction,
        Transaction, TransactionError, TransactionKind, TxVersion,
        UnsignedTransaction, GENESIS_TX_HASH,
    },
};
