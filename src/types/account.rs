// Account - État d'un compte (externe ou contrat)
use super::primitives::{Balance, Hash, Nonce};
use serde::{Deserialize, Serialize};

/// Marker stored as the storage root of a freshly set up contract
pub const EMPTY_STORAGE_ROOT: Hash = Hash::ZERO;

/// Serialized length of the storage-root node value
pub const STORAGE_ROOT_VALUE_LEN: usize = 1;

/// État d'un compte dans le ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Nonce pour prévenir replay
    pub nonce: Nonce,

    /// Balance libre
    pub balance: Balance,

    /// Contract code, absent for externally owned accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Vec<u8>>,

    /// Storage root marker, set once the account is set up as a contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<Hash>,

    /// Whether the account has been set up as a contract
    #[serde(default)]
    pub is_contract: bool,
}

impl AccountState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: Balance) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Code, treating an absent code as empty
    pub fn code_or_empty(&self) -> &[u8] {
        self.code.as_deref().unwrap_or(&[])
    }

    /// Length of the account node value as stored in the trie.
    ///
    /// Code lives in its own node, so only nonce, balance and the contract
    /// flag are counted.
    pub fn node_value_len(&self) -> usize {
        bincode::serialized_size(&(self.nonce, self.balance, self.is_contract))
            .map(|n| n as usize)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_empty() {
        let account = AccountState::new();
        assert_eq!(account.balance, 0);
        assert_eq!(account.nonce, 0);
        assert!(account.code.is_none());
        assert!(!account.is_contract);
        assert!(account.code_or_empty().is_empty());
    }

    #[test]
    fn test_node_value_len_ignores_code() {
        let mut account = AccountState::with_balance(10);
        let len = account.node_value_len();
        assert!(len > 0);
        account.code = Some(vec![1; 100]);
        assert_eq!(account.node_value_len(), len);
    }
}
