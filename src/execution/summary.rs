// Summary - Bilan figé d'une transaction finalisée
use super::result::InternalTransaction;
use super::gas::GasCost;
use crate::types::{Address, Balance, Gas, Hash, LogInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Gas and fee figures settled at finalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionExecutionSummary {
    pub tx_hash: Hash,
    pub value: Balance,
    pub gas_price: Balance,
    pub gas_limit: Gas,
    /// Gas consumed by the run, before refunds
    pub gas_used: Gas,
    /// Gas left unspent, before refunds
    pub gas_leftover: Gas,
    pub gas_refund: Gas,
    pub logs: Vec<LogInfo>,
    pub deleted_accounts: BTreeSet<Address>,
    pub internal_transactions: Vec<InternalTransaction>,
    pub result: Vec<u8>,
    pub failed: bool,
}

impl TransactionExecutionSummary {
    /// Valeur du gas restant rendue à l'émetteur
    pub fn leftover(&self) -> Balance {
        GasCost::to_balance(self.gas_leftover, self.gas_price)
    }

    /// Valeur du refund rendue à l'émetteur
    pub fn refund(&self) -> Balance {
        GasCost::to_balance(self.gas_refund, self.gas_price)
    }

    /// Fee kept by the collector: the gas neither left over nor refunded
    pub fn fee(&self) -> Balance {
        let charged = self
            .gas_limit
            .saturating_sub(self.gas_leftover.saturating_add(self.gas_refund));
        GasCost::to_balance(charged, self.gas_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(gas_leftover: Gas, gas_refund: Gas) -> TransactionExecutionSummary {
        TransactionExecutionSummary {
            tx_hash: Hash::ZERO,
            value: 0,
            gas_price: 3,
            gas_limit: 100_000,
            gas_used: 100_000 - gas_leftover,
            gas_leftover,
            gas_refund,
            logs: vec![],
            deleted_accounts: BTreeSet::new(),
            internal_transactions: vec![],
            result: vec![],
            failed: false,
        }
    }

    #[test]
    fn test_fee_plus_refunds_equal_prepaid_gas() {
        let s = summary(40_000, 24_000);
        assert_eq!(s.leftover(), 120_000);
        assert_eq!(s.refund(), 72_000);
        assert_eq!(s.fee(), 3 * 36_000);
        assert_eq!(s.fee() + s.leftover() + s.refund(), 3 * 100_000);
    }

    #[test]
    fn test_fee_never_negative() {
        let s = summary(100_000, 50_000);
        assert_eq!(s.fee(), 0);
    }
}
