// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use icx_types::{Address, U256};
use primitives::TxResult;

/// The fee actually charged for a stepped transaction, as opposed to the
/// declared step limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCharge {
    /// Amount credited to the treasury: `step_used × step_price`.
    pub total: U256,
    /// Amount debited from the requesting account. Smaller than `total`
    /// when a deposit sponsor covers part of the consumption.
    pub payer_share: U256,
}

impl FeeCharge {
    /// Computes the charge from the execution result. Zero consumption
    /// yields `None`: no fee operations at all, never zero-amount ledger
    /// entries.
    pub fn compute(payer: &Address, result: &TxResult) -> Option<FeeCharge> {
        if result.step_used.is_zero() {
            return None;
        }
        let total = result.step_used * result.step_price;
        let payer_steps = if result.step_details.is_empty() {
            result.step_used
        } else {
            // Sponsored call: the payer owes only its own entry of the
            // breakdown, absent entirely when fully covered.
            result
                .step_details
                .get(&payer.to_string())
                .copied()
                .unwrap_or_default()
        };
        Some(FeeCharge {
            total,
            payer_share: payer_steps * result.step_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FeeCharge;
    use primitives::{ExecutionStatus, TxResult};
    use std::collections::BTreeMap;

    fn result(step_used: u64, step_price: u64) -> TxResult {
        TxResult {
            status: ExecutionStatus::Success,
            step_used: step_used.into(),
            step_price: step_price.into(),
            step_details: BTreeMap::new(),
            event_logs: vec![],
        }
    }

    #[test]
    fn sender_bears_the_full_cost_without_a_breakdown() {
        let payer =
            "hxbe258ceb872e08851f1f59694dac2558708ece11".parse().unwrap();
        let charge = FeeCharge::compute(&payer, &result(5, 10)).unwrap();
        assert_eq!(charge.total, 50.into());
        assert_eq!(charge.payer_share, 50.into());
    }

    #[test]
    fn zero_consumption_charges_nothing() {
        let payer =
            "hxbe258ceb872e08851f1f59694dac2558708ece11".parse().unwrap();
        // Price alone must not manufacture a fee.
        assert_eq!(FeeCharge::compute(&payer, &result(0, 12_500_000)), None);
    }

    #[test]
    fn breakdown_apportions_the_payer_share() {
        let payer: icx_types::Address =
            "hxbe258ceb872e08851f1f59694dac2558708ece11".parse().unwrap();
        let mut res = result(25, 2);
        res.step_details.insert(payer.to_string(), 10u64.into());
        res.step_details.insert(
            "cx502c47463314f01e84b1b203c315180c89c0f425".into(),
            15u64.into(),
        );
        let charge = FeeCharge::compute(&payer, &res).unwrap();
        assert_eq!(charge.total, 50.into());
        assert_eq!(charge.payer_share, 20.into());
    }

    #[test]
    fn fully_sponsored_call_debits_nothing_from_the_sender() {
        let payer: icx_types::Address =
            "hxbe258ceb872e08851f1f59694dac2558708ece11".parse().unwrap();
        let mut res = result(25, 2);
        res.step_details.insert(
            "cx502c47463314f01e84b1b203c315180c89c0f425".into(),
            25u64.into(),
        );
        let charge = FeeCharge::compute(&payer, &res).unwrap();
        assert_eq!(charge.total, 50.into());
        assert_eq!(charge.payer_share, 0.into());
    }
}
