// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Decodes the fixed catalogue of monetary event signatures into
//! additional balanced operations. The catalogue is deliberately
//! non-exhaustive: signatures outside it are skipped, never an error,
//! so unknown future event types pass through harmlessly.

use crate::{
    ops::{credit, debit},
    LedgerError,
};
use icx_types::{codec, Address, SYSTEM_SCORE, TREASURY, U256};
use log::trace;
use primitives::{EventLog, OpStatus, OpType, Operation};

const ICX_TRANSFER_SIG: &str = "ICXTransfer(Address,Address,int)";
const ISSUE_SIG: &str = "ICXIssued(int,int,int,int)";
const CLAIM_SIG: &str = "IScoreClaimed(int,int)";
const CLAIM_V2_SIG: &str = "IScoreClaimedV2(Address,int,int)";
const BURN_SIG: &str = "ICXBurned";
const BURN_V1_SIG: &str = "ICXBurned(int)";
const BURN_V2_SIG: &str = "ICXBurnedV2(Address,int,int)";
const DEPOSIT_WITHDRAWN_SIG: &str = "DepositWithdrawn(bytes,Address,int,int)";

/// Synthesizes the operations implied by one event log, starting at
/// operation index `start`. `claimant` is the account reward claims pay
/// out to: the transaction sender, or the system score account for rows
/// without one.
pub fn operations(
    log: &EventLog, claimant: &Address, start: i64, status: OpStatus,
) -> Result<Vec<Operation>, LedgerError> {
    let signature = match log.signature() {
        Some(signature) => signature,
        None => return Ok(vec![]),
    };
    match signature {
        ICX_TRANSFER_SIG => {
            let from = address_operand(log, Operand::Indexed(1))?;
            let to = address_operand(log, Operand::Indexed(2))?;
            let value = amount_operand(log, Operand::Indexed(3))?;
            Ok(vec![
                debit(start, OpType::IcxTransfer, from, value, status),
                credit(start + 1, OpType::IcxTransfer, to, value, status)
                    .related_to(start),
            ])
        }
        ISSUE_SIG => {
            let value = amount_operand(log, Operand::Data(2))?;
            Ok(vec![credit(start, OpType::Issue, *TREASURY, value, status)])
        }
        CLAIM_SIG | CLAIM_V2_SIG => {
            let value = amount_operand(log, Operand::Data(1))?;
            Ok(vec![
                debit(start, OpType::Claim, *TREASURY, value, status),
                credit(start + 1, OpType::Claim, *claimant, value, status)
                    .related_to(start),
            ])
        }
        BURN_SIG | BURN_V1_SIG | BURN_V2_SIG => {
            let value = amount_operand(log, Operand::Data(0))?;
            Ok(vec![debit(
                start,
                OpType::Burn,
                *SYSTEM_SCORE,
                value,
                status,
            )])
        }
        DEPOSIT_WITHDRAWN_SIG => {
            let to = address_operand(log, Operand::Indexed(2))?;
            let value = amount_operand(log, Operand::Data(0))?;
            Ok(vec![credit(start, OpType::Withdrawn, to, value, status)])
        }
        other => {
            trace!("skipping unrecognized event signature {:?}", other);
            Ok(vec![])
        }
    }
}

#[derive(Clone, Copy)]
enum Operand {
    Indexed(usize),
    Data(usize),
}

fn operand<'a>(
    log: &'a EventLog, operand: Operand,
) -> Result<&'a str, LedgerError> {
    let (fields, position) = match operand {
        Operand::Indexed(position) => (&log.indexed, position),
        Operand::Data(position) => (&log.data, position),
    };
    fields
        .get(position)
        .and_then(|field| field.as_deref())
        .ok_or_else(|| {
            LedgerError::MalformedEvent(format!(
                "{} is missing operand {}",
                log.signature().unwrap_or("<unsigned>"),
                position,
            ))
        })
}

fn amount_operand(
    log: &EventLog, position: Operand,
) -> Result<U256, LedgerError> {
    Ok(codec::u256_from_hex(operand(log, position)?)?)
}

fn address_operand(
    log: &EventLog, position: Operand,
) -> Result<Address, LedgerError> {
    operand(log, position)?
        .parse()
        .map_err(|e| LedgerError::MalformedEvent(format!("{}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::EventLog;

    fn event(indexed: Vec<&str>, data: Vec<&str>) -> EventLog {
        EventLog {
            score_address: "cx0000000000000000000000000000000000000000".into(),
            indexed: indexed.into_iter().map(|s| Some(s.into())).collect(),
            data: data.into_iter().map(|s| Some(s.into())).collect(),
        }
    }

    #[test]
    fn unknown_signatures_are_skipped() {
        let log = event(vec!["Transfer(Address,Address,int,bytes)"], vec![]);
        let claimant = *SYSTEM_SCORE;
        assert!(operations(&log, &claimant, 4, OpStatus::Success)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn transfer_event_is_two_sided() {
        let log = event(
            vec![
                ICX_TRANSFER_SIG,
                "hxbe258ceb872e08851f1f59694dac2558708ece11",
                "hx5bfdb090f43a808005ffc27c25b213145e80b7cd",
                "0x1e",
            ],
            vec![],
        );
        let claimant = *SYSTEM_SCORE;
        let ops =
            operations(&log, &claimant, 4, OpStatus::Success).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].index, 4);
        assert_eq!(ops[1].index, 5);
        assert_eq!(ops[1].related, vec![4]);
        assert_eq!(ops[0].amount.as_ref().unwrap().value, "-30");
        assert_eq!(ops[1].amount.as_ref().unwrap().value, "30");
    }

    #[test]
    fn burn_variants_debit_the_system_score() {
        for signature in [BURN_SIG, BURN_V1_SIG, BURN_V2_SIG] {
            let log = event(vec![signature], vec!["0x64"]);
            let claimant = *SYSTEM_SCORE;
            let ops =
                operations(&log, &claimant, 1, OpStatus::Success).unwrap();
            assert_eq!(ops.len(), 1);
            assert_eq!(ops[0].op_type, OpType::Burn);
            assert_eq!(ops[0].account, Some(*SYSTEM_SCORE));
            assert_eq!(ops[0].amount.as_ref().unwrap().value, "-100");
        }
    }

    #[test]
    fn recognized_signature_with_bad_operand_is_an_error() {
        let log = event(vec![ISSUE_SIG], vec!["0x1", "0x2"]);
        let claimant = *SYSTEM_SCORE;
        assert!(matches!(
            operations(&log, &claimant, 1, OpStatus::Success),
            Err(LedgerError::MalformedEvent(_))
        ));
    }
}
