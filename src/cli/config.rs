// CLI Configuration - Scénarios JSON et conversion des arguments
// Principle: Clear mapping between user input and internal configuration

use crate::cli::{CallCmd, RunnerError};
use crate::execution::CallRequest;
use crate::genesis::{ChainConfig, GenesisSpec};
use crate::types::{Address, Balance, Gas, Nonce, Timestamp, UnsignedTransaction};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Seconds between two scenario blocks when not specified
pub const DEFAULT_BLOCK_INTERVAL: Timestamp = 6;

/// Scenario executed by `kratos-exec run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Chain configuration, main network when absent
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub genesis: GenesisSpec,

    #[serde(default)]
    pub blocks: Vec<ScenarioBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioBlock {
    /// Overrides the genesis coinbase
    #[serde(default)]
    pub coinbase: Option<Address>,

    /// Seconds after the parent block
    #[serde(default)]
    pub interval: Option<Timestamp>,

    #[serde(default)]
    pub transactions: Vec<ScenarioTransaction>,
}

/// Transaction signed with `secret_key` when the scenario is loaded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioTransaction {
    /// Hex Ed25519 secret key
    pub secret_key: String,

    /// Next sender nonce when absent
    #[serde(default)]
    pub nonce: Option<Nonce>,

    /// Contract creation when absent
    #[serde(default)]
    pub to: Option<Address>,

    #[serde(default)]
    pub value: Balance,

    #[serde(default)]
    pub gas_price: Balance,

    pub gas_limit: Gas,

    #[serde(default)]
    pub rent_gas_limit: Gas,

    /// Hex payload
    #[serde(default)]
    pub data: String,
}

impl Scenario {
    /// Charge depuis un fichier JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RunnerError::Io(format!("Failed to read {}: {}", path.as_ref().display(), e)))?;
        serde_json::from_str(&content).map_err(|e| RunnerError::Config(format!("Invalid scenario: {}", e)))
    }
}

impl ScenarioTransaction {
    pub fn signing_key(&self) -> Result<SigningKey, RunnerError> {
        parse_secret_key(&self.secret_key)
    }

    /// Unsigned transaction using `nonce` unless the scenario fixes one
    pub fn to_unsigned(&self, nonce: Nonce, chain_id: u8) -> Result<UnsignedTransaction, RunnerError> {
        Ok(UnsignedTransaction {
            nonce: self.nonce.unwrap_or(nonce),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            rent_gas_limit: self.rent_gas_limit,
            receiver: self.to.map(|a| a.as_bytes().to_vec()).unwrap_or_default(),
            value: self.value,
            data: parse_hex("data", &self.data)?,
            chain_id,
        })
    }
}

/// Parses an Ed25519 secret key, either raw hex or the JSON written by
/// `kratos-exec key generate`
pub fn parse_secret_key(content: &str) -> Result<SigningKey, RunnerError> {
    let content = content.trim();
    let hex_str = match serde_json::from_str::<serde_json::Value>(content) {
        Ok(json) => json
            .get("secretKey")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| RunnerError::Key("Key file missing 'secretKey' field".to_string()))?,
        Err(_) => content.to_string(),
    };

    let key_bytes = parse_hex("secret key", &hex_str).map_err(|e| RunnerError::Key(e.to_string()))?;
    let bytes: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
        RunnerError::Key(format!(
            "Invalid key length: {} bytes (expected 32)",
            key_bytes.len()
        ))
    })?;
    Ok(SigningKey::from_bytes(&bytes))
}

/// Hex string with optional `0x` prefix
pub fn parse_hex(field: &str, value: &str) -> Result<Vec<u8>, RunnerError> {
    let value = value.trim();
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| RunnerError::InvalidArgument(format!("Invalid hex in {}: {}", field, e)))
}

pub fn parse_address(field: &str, value: &str) -> Result<Address, RunnerError> {
    Address::from_hex(value).map_err(|e| RunnerError::InvalidArgument(format!("Invalid address in {}: {}", field, e)))
}

impl CallCmd {
    /// Local call described by the command line
    pub fn to_request(&self) -> Result<CallRequest, RunnerError> {
        Ok(CallRequest {
            from: parse_address("--from", &self.from)?,
            to: self.to.as_deref().map(|to| parse_address("--to", to)).transpose()?,
            value: self.value,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: parse_hex("--data", &self.data)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn test_parse_secret_key_hex_and_json() {
        let from_hex = parse_secret_key(SECRET).unwrap();
        let json = format!("{{\"scheme\":\"ed25519\",\"secretKey\":\"{}\"}}", SECRET);
        let from_json = parse_secret_key(&json).unwrap();
        assert_eq!(from_hex.to_bytes(), from_json.to_bytes());
        assert_eq!(from_hex.to_bytes(), [1u8; 32]);
    }

    #[test]
    fn test_parse_secret_key_errors() {
        assert!(matches!(parse_secret_key("0x0102"), Err(RunnerError::Key(_))));
        assert!(matches!(parse_secret_key("{\"publicKey\":\"0x00\"}"), Err(RunnerError::Key(_))));
        assert!(matches!(parse_secret_key("not hex"), Err(RunnerError::Key(_))));
    }

    #[test]
    fn test_scenario_defaults() {
        let scenario: Scenario = serde_json::from_str(
            r#"{ "blocks": [ { "transactions": [ { "secret_key": "01", "gas_limit": 21000 } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(scenario.chain, ChainConfig::mainnet());
        assert_eq!(scenario.blocks.len(), 1);

        let tx = &scenario.blocks[0].transactions[0];
        let unsigned = tx.to_unsigned(7, 33).unwrap();
        assert_eq!(unsigned.nonce, 7);
        assert!(unsigned.receiver.is_empty());
        assert!(unsigned.data.is_empty());
    }

    #[test]
    fn test_scenario_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(&path, r#"{ "genesis": { "timestamp": 1, "gas_limit": 100000 } }"#).unwrap();
        let scenario = Scenario::from_file(&path).unwrap();
        assert_eq!(scenario.genesis.gas_limit, 100_000);
        assert!(scenario.blocks.is_empty());

        assert!(matches!(
            Scenario::from_file(dir.path().join("missing.json")),
            Err(RunnerError::Io(_))
        ));
    }
}
