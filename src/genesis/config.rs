// Configuration de la chaîne - paramètres d'exécution
use crate::execution::activation::{ActivationConfig, ActivationsForBlock, ConsensusRule};
use crate::execution::gas::transaction_cost;
use crate::execution::precompiled::FEE_COLLECTOR_ADDR;
use crate::execution::signature_cache::DEFAULT_SIGNATURE_CACHE_SIZE;
use crate::execution::vm::VmConfig;
use crate::types::{Address, Gas, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Taille maximale du code d'un contrat (24 KiB)
pub const MAX_CONTRACT_SIZE: usize = 0x6000;

/// Longueur maximale d'une adresse destinataire
pub const MAX_ADDRESS_BYTE_LENGTH: usize = 20;

pub const DEFAULT_BLOCK_GAS_LIMIT: Gas = 6_800_000;

/// Configuration de la chaîne
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Nom de la chaîne
    pub chain_name: String,

    /// ID de la chaîne signé dans les transactions (0 = toutes chaînes)
    pub chain_id: u8,

    /// Limites d'exécution
    pub execution: ExecutionConfig,

    /// Appels de setup gratuits
    pub setup_calls: SetupCallPolicy,

    /// Hauteurs d'activation des règles de consensus
    pub activations: ActivationConfig,

    /// Options de l'interpréteur
    #[serde(default)]
    pub vm: VmConfig,
}

/// Limites d'exécution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub max_contract_size: usize,
    pub max_address_byte_length: usize,

    /// Fees go to `fee_collector` instead of the block coinbase
    pub fee_to_protocol_account: bool,
    pub fee_collector: Address,

    pub signature_cache_size: usize,
}

/// Calls to `target` from an authorised sender are free until
/// `ConsensusRule::PaidSetupCalls` activates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupCallPolicy {
    pub target: Option<Address>,
    pub authorized_senders: Vec<Address>,
}

impl SetupCallPolicy {
    pub fn is_free(&self, tx: &Transaction, activations: &ActivationsForBlock) -> bool {
        if activations.is_active(ConsensusRule::PaidSetupCalls) {
            return false;
        }
        match (self.target, tx.receive_address()) {
            (Some(target), Some(receiver)) if target == receiver => {
                self.authorized_senders.contains(&tx.sender())
            }
            _ => false,
        }
    }
}

impl ChainConfig {
    /// Configuration du réseau principal
    pub fn mainnet() -> Self {
        Self {
            chain_name: "KratOs".to_string(),
            chain_id: 33,
            execution: ExecutionConfig {
                max_contract_size: MAX_CONTRACT_SIZE,
                max_address_byte_length: MAX_ADDRESS_BYTE_LENGTH,
                fee_to_protocol_account: true,
                fee_collector: FEE_COLLECTOR_ADDR,
                signature_cache_size: DEFAULT_SIGNATURE_CACHE_SIZE,
            },
            setup_calls: SetupCallPolicy::default(),
            activations: ActivationConfig::all_active(),
            vm: VmConfig::default(),
        }
    }

    /// Réseau local: fees au coinbase, aucune règle activée
    pub fn devnet() -> Self {
        let mut config = Self::mainnet();
        config.chain_name = "KratOs-dev".to_string();
        config.chain_id = 34;
        config.execution.fee_to_protocol_account = false;
        config.activations = ActivationConfig::legacy();
        config
    }

    /// Coût intrinsèque de `tx` sous les règles du bloc
    pub fn transaction_cost(&self, tx: &Transaction, activations: &ActivationsForBlock) -> Gas {
        transaction_cost(tx, self.setup_calls.is_free(tx, activations))
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

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Erreurs de configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erreur d'E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON invalide: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex invalide pour {field}: {reason}")]
    InvalidHex { field: String, reason: String },

    #[error("Clé secrète invalide: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnsignedTransaction;
    use ed25519_dalek::SigningKey;
    use tempfile::tempdir;

    #[test]
    fn test_mainnet_config() {
        let config = ChainConfig::mainnet();
        assert_eq!(config.chain_name, "KratOs");
        assert_eq!(config.execution.max_contract_size, 24_576);
        assert_eq!(config.execution.max_address_byte_length, 20);
        assert!(config.execution.fee_to_protocol_account);
        assert_eq!(config, ChainConfig::default());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let config = ChainConfig::devnet();
        config.to_file(&path).unwrap();
        assert_eq!(ChainConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = ChainConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_free_setup_call_until_rule_activates() {
        let key = SigningKey::from_bytes(&[5u8; 32]);
        let target = Address::from_low_u64(0x0100_0006);
        let tx = UnsignedTransaction {
            gas_limit: 50_000,
            receiver: target.as_bytes().to_vec(),
            ..Default::default()
        }
        .sign(&key);

        let mut config = ChainConfig::devnet();
        config.setup_calls = SetupCallPolicy {
            target: Some(target),
            authorized_senders: vec![tx.sender()],
        };
        config.activations = ActivationConfig::legacy().with(ConsensusRule::PaidSetupCalls, 10);

        assert_eq!(config.transaction_cost(&tx, &config.activations.for_block(9)), 0);
        assert_eq!(config.transaction_cost(&tx, &config.activations.for_block(10)), 21_000);

        config.setup_calls.authorized_senders.clear();
        assert_eq!(config.transaction_cost(&tx, &config.activations.for_block(9)), 21_000);
    }
}
