// Result - Accumulateur du résultat d'exécution d'un programme
use super::gas::{GasCost, GasError};
use crate::storage::StateError;
use crate::types::{Address, Balance, DataWord, Gas, Hash, LogInfo, Uint24};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Exception carried by an execution result
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("Out of gas: '{cause}' needs {needed}, remaining {remaining}")]
    OutOfGas {
        cause: String,
        needed: Gas,
        remaining: Gas,
    },

    #[error("Not enough gas for '{cause}': needed {needed}, remaining {remaining}")]
    NotEnoughSpendingGas {
        cause: String,
        needed: Gas,
        remaining: Gas,
    },

    #[error("Maximum contract size allowed {max} but actual {size}")]
    ContractTooLarge { max: usize, size: usize },

    #[error("Invalid gas: {0}")]
    InvalidGas(#[from] GasError),

    #[error("Precompiled contract failure: {0}")]
    Precompiled(String),

    #[error("Value transfer failed: {0}")]
    Transfer(#[from] StateError),

    #[error("Runtime failure: {0}")]
    Runtime(String),
}

/// Call made by a contract during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTransaction {
    pub parent_hash: Hash,
    pub deep: u32,
    pub index: u32,
    pub sender: Address,
    pub receiver: Option<Address>,
    pub value: Balance,
    pub data: Vec<u8>,
    pub note: String,
    pub rejected: bool,
}

impl InternalTransaction {
    pub fn reject(&mut self) {
        self.rejected = true;
    }
}

/// Accumulated outcome of a program run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramResult {
    gas_used: Gas,
    h_return: Vec<u8>,
    exception: Option<VmError>,
    revert: bool,
    logs: Vec<LogInfo>,
    delete_accounts: BTreeSet<Address>,
    internal_transactions: Vec<InternalTransaction>,
    future_refund: Gas,
    code_changes: BTreeMap<Address, Vec<u8>>,
    /// Rent table: key of each newly created trie node and its length
    new_trie_nodes: BTreeMap<DataWord, Uint24>,
}

impl ProgramResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spend_gas(&mut self, gas: Gas) {
        self.gas_used = GasCost::add(self.gas_used, gas);
    }

    pub fn gas_used(&self) -> Gas {
        self.gas_used
    }

    pub fn set_h_return(&mut self, data: Vec<u8>) {
        self.h_return = data;
    }

    pub fn h_return(&self) -> &[u8] {
        &self.h_return
    }

    pub fn set_exception(&mut self, exception: VmError) {
        self.exception = Some(exception);
    }

    pub fn exception(&self) -> Option<&VmError> {
        self.exception.as_ref()
    }

    pub fn set_revert(&mut self) {
        self.revert = true;
    }

    pub fn is_revert(&self) -> bool {
        self.revert
    }

    pub fn add_log(&mut self, log: LogInfo) {
        self.logs.push(log);
    }

    pub fn logs(&self) -> &[LogInfo] {
        &self.logs
    }

    /// Logs not flagged as rejected by a nested rollback
    pub fn accepted_logs(&self) -> Vec<LogInfo> {
        self.logs.iter().filter(|log| !log.rejected).cloned().collect()
    }

    pub fn add_delete_account(&mut self, address: Address) {
        self.delete_accounts.insert(address);
    }

    pub fn delete_accounts(&self) -> &BTreeSet<Address> {
        &self.delete_accounts
    }

    pub fn add_internal_transaction(&mut self, tx: InternalTransaction) {
        self.internal_transactions.push(tx);
    }

    pub fn internal_transactions(&self) -> &[InternalTransaction] {
        &self.internal_transactions
    }

    pub fn add_future_refund(&mut self, gas: Gas) {
        self.future_refund = GasCost::add(self.future_refund, gas);
    }

    pub fn future_refund(&self) -> Gas {
        self.future_refund
    }

    pub fn reset_future_refund(&mut self) {
        self.future_refund = 0;
    }

    /// Code written by a nested contract creation, persisted at finalization
    pub fn add_code_change(&mut self, address: Address, code: Vec<u8>) {
        self.code_changes.insert(address, code);
    }

    pub fn code_changes(&self) -> &BTreeMap<Address, Vec<u8>> {
        &self.code_changes
    }

    pub fn add_new_trie_node(&mut self, key: DataWord, length: Uint24) {
        self.new_trie_nodes.insert(key, length);
    }

    pub fn new_trie_nodes(&self) -> &BTreeMap<DataWord, Uint24> {
        &self.new_trie_nodes
    }

    /// Drops every effect that must not survive a failed run
    pub fn clear_fields_on_exception(&mut self) {
        self.delete_accounts.clear();
        self.logs.clear();
        self.code_changes.clear();
        self.reset_future_refund();
        for tx in &mut self.internal_transactions {
            tx.reject();
        }
    }
}
