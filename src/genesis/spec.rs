// Spécification du genesis - comptes initiaux de l'état d'exécution
use super::config::{ConfigError, DEFAULT_BLOCK_GAS_LIMIT};
use crate::storage::{OverlayState, StateView};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Fixed genesis timestamp for a deterministic genesis hash
/// 2025-01-01 00:00:00 UTC
const GENESIS_TIMESTAMP: u64 = 1735689600;

/// Spécification du genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSpec {
    /// Timestamp du genesis
    pub timestamp: Timestamp,

    /// Gas limit of the genesis block, inherited by its children
    pub gas_limit: Gas,

    /// Beneficiary of the genesis block
    #[serde(default)]
    pub coinbase: Address,

    /// Comptes initiaux
    #[serde(default)]
    pub accounts: BTreeMap<Address, GenesisAccount>,
}

/// Compte dans le genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub balance: Balance,

    #[serde(default)]
    pub nonce: Nonce,

    /// Hex-encoded contract code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl GenesisAccount {
    pub fn with_balance(balance: Balance) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }
}

impl GenesisSpec {
    /// Genesis vide
    pub fn empty() -> Self {
        Self {
            timestamp: GENESIS_TIMESTAMP,
            gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            coinbase: Address::ZERO,
            accounts: BTreeMap::new(),
        }
    }

    /// Genesis avec un compte financé
    pub fn with_account(address: Address, balance: Balance) -> Self {
        let mut spec = Self::empty();
        spec.accounts.insert(address, GenesisAccount::with_balance(balance));
        spec
    }

    /// Charge depuis un fichier JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for GenesisSpec {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder pour le bloc genesis
pub struct GenesisBuilder {
    spec: GenesisSpec,
}

impl GenesisBuilder {
    pub fn new(spec: GenesisSpec) -> Self {
        Self { spec }
    }

    /// Construit le bloc genesis et l'état initial
    pub fn build(self) -> Result<(ExecutionBlock, OverlayState), ConfigError> {
        let mut state = OverlayState::new();

        for (address, genesis) in &self.spec.accounts {
            let code = match &genesis.code {
                Some(code) => hex::decode(code.trim_start_matches("0x")).map_err(|e| {
                    ConfigError::InvalidHex {
                        field: format!("accounts.{}.code", address),
                        reason: e.to_string(),
                    }
                })?,
                None => Vec::new(),
            };

            let mut account = AccountState::with_balance(genesis.balance);
            account.nonce = genesis.nonce;
            state.put_account(*address, account);

            if !code.is_empty() {
                state.setup_contract(address);
                state.save_code(address, code);
            }
        }

        let block = ExecutionBlock {
            number: 0,
            parent_hash: Hash::ZERO,
            coinbase: self.spec.coinbase,
            timestamp: self.spec.timestamp,
            gas_limit: self.spec.gas_limit,
        };

        Ok((block, state))
    }
}
