// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The chain-agnostic operation model consumed by the balance-accounting
//! layer: typed debits and credits with causal links inside a transaction.

use icx_types::{
    codec::{u256_to_dec, u256_to_neg_dec},
    Address, U256,
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

lazy_static! {
    /// The native currency: 18-decimal ICX.
    pub static ref ICX: Currency = Currency {
        symbol: "ICX".into(),
        decimals: 18,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
}

/// A signed, canonical-decimal amount in a given currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: Currency,
}

impl Amount {
    pub fn icx_credit(value: U256) -> Self {
        Amount {
            value: u256_to_dec(value),
            currency: ICX.clone(),
        }
    }

    pub fn icx_debit(value: U256) -> Self {
        Amount {
            value: u256_to_neg_dec(value),
            currency: ICX.clone(),
        }
    }

    /// Splits the canonical-decimal value into sign and magnitude.
    pub fn signed(&self) -> Option<(bool, U256)> {
        let (negative, digits) = match self.value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.value.as_str()),
        };
        U256::from_dec_str(digits).ok().map(|v| (negative, v))
    }
}

/// The fixed operation vocabulary. Serialized names are part of the
/// persisted ledger and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    #[serde(rename = "GENESIS")]
    Genesis,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "FEE")]
    Fee,
    #[serde(rename = "ISSUE")]
    Issue,
    #[serde(rename = "BURN")]
    Burn,
    #[serde(rename = "LOST")]
    Lost,
    #[serde(rename = "FS_DEPOSIT")]
    FsDeposit,
    #[serde(rename = "FS_WITHDRAW")]
    FsWithdraw,
    #[serde(rename = "FS_FEE")]
    FsFee,
    #[serde(rename = "STAKE")]
    Stake,
    #[serde(rename = "UNSTAKE")]
    Unstake,
    #[serde(rename = "CLAIM")]
    Claim,
    #[serde(rename = "GHOST")]
    Ghost,
    #[serde(rename = "REWARD")]
    Reward,
    #[serde(rename = "REG_PREP")]
    RegPRep,
    #[serde(rename = "MESSAGE")]
    Message,
    #[serde(rename = "BASE")]
    Base,
    #[serde(rename = "WITHDRAWN")]
    Withdrawn,
    #[serde(rename = "ICXTRANSFER")]
    IcxTransfer,
    #[serde(rename = "DEPLOY")]
    Deploy,
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "DEPOSIT")]
    Deposit,
}

impl OpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Genesis => "GENESIS",
            OpType::Transfer => "TRANSFER",
            OpType::Fee => "FEE",
            OpType::Issue => "ISSUE",
            OpType::Burn => "BURN",
            OpType::Lost => "LOST",
            OpType::FsDeposit => "FS_DEPOSIT",
            OpType::FsWithdraw => "FS_WITHDRAW",
            OpType::FsFee => "FS_FEE",
            OpType::Stake => "STAKE",
            OpType::Unstake => "UNSTAKE",
            OpType::Claim => "CLAIM",
            OpType::Ghost => "GHOST",
            OpType::Reward => "REWARD",
            OpType::RegPRep => "REG_PREP",
            OpType::Message => "MESSAGE",
            OpType::Base => "BASE",
            OpType::Withdrawn => "WITHDRAWN",
            OpType::IcxTransfer => "ICXTRANSFER",
            OpType::Deploy => "DEPLOY",
            OpType::Call => "CALL",
            OpType::Deposit => "DEPOSIT",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAIL")]
    Failure,
}

impl OpStatus {
    pub fn is_successful(&self) -> bool { *self == OpStatus::Success }
}

/// Every operation type the translation layer can emit, for consumers that
/// enumerate the vocabulary up front.
pub const OPERATION_TYPES: [OpType; 22] = [
    OpType::Genesis,
    OpType::Transfer,
    OpType::Fee,
    OpType::Issue,
    OpType::Burn,
    OpType::Lost,
    OpType::FsDeposit,
    OpType::FsWithdraw,
    OpType::FsFee,
    OpType::Stake,
    OpType::Unstake,
    OpType::Claim,
    OpType::Ghost,
    OpType::Reward,
    OpType::RegPRep,
    OpType::Message,
    OpType::Base,
    OpType::Withdrawn,
    OpType::IcxTransfer,
    OpType::Deploy,
    OpType::Call,
    OpType::Deposit,
];

pub const OPERATION_STATUSES: [OpStatus; 2] =
    [OpStatus::Success, OpStatus::Failure];

/// One typed ledger entry. Indices are zero-based and contiguous within a
/// transaction; `related` points at earlier indices of the same
/// transaction that this entry balances against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub index: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<i64>,
    #[serde(rename = "type")]
    pub op_type: OpType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OpStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Operation {
    pub fn is_monetary(&self) -> bool { self.amount.is_some() }

    /// Links this operation to an earlier one in the same transaction.
    pub fn related_to(mut self, index: i64) -> Self {
        self.related.push(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_sign_split() {
        let credit = Amount::icx_credit(100u64.into());
        assert_eq!(credit.signed(), Some((false, 100u64.into())));

        let debit = Amount::icx_debit(100u64.into());
        assert_eq!(debit.signed(), Some((true, 100u64.into())));

        // Zero is never signed.
        assert_eq!(Amount::icx_debit(U256::zero()).value, "0");
    }

    #[test]
    fn op_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&OpType::IcxTransfer).unwrap(),
            "\"ICXTRANSFER\""
        );
        assert_eq!(OpType::RegPRep.as_str(), "REG_PREP");
        assert_eq!(OPERATION_TYPES.len(), 22);
    }
}
