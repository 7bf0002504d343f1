// Runner - Exécution des commandes du binaire
// Principle: Build the in-memory chain, run it, report as JSON

use crate::cli::config::{parse_secret_key, Scenario, ScenarioBlock, DEFAULT_BLOCK_INTERVAL};
use crate::execution::{
    BlockExecutor, BlockResult, CallRequest, ExecutionContext, MemoryTraceProcessor, PassiveInterpreter,
    ReversibleTransactionExecutor, TransactionTrace,
};
use crate::genesis::{ConfigError, GenesisBuilder};
use crate::storage::{BlockStore, MemoryBlockStore, MemoryReceiptStore, OverlayState, ReceiptStore, StateView};
use crate::types::*;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Genesis error: {0}")]
    Genesis(#[from] ConfigError),

    #[error("Key error: {0}")]
    Key(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output of `kratos-exec run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub chain: String,
    pub blocks: Vec<BlockResult>,
    /// Final state
    pub accounts: BTreeMap<Address, AccountState>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traces: BTreeMap<Hash, TransactionTrace>,
}

/// Output of `kratos-exec call`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    pub return_data: String,
    pub gas_used: Gas,
    pub reverted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Executes every block of the scenario on top of its genesis
pub fn run_scenario(scenario: &Scenario, with_traces: bool) -> Result<ScenarioReport, RunnerError> {
    let (genesis, mut state) = GenesisBuilder::new(scenario.genesis.clone()).build()?;
    info!("⛓️  Chain: {} (id {})", scenario.chain.chain_name, scenario.chain.chain_id);
    info!("🔗 Genesis: {:?}", genesis.hash());

    let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    block_store.save_block(&genesis);
    let receipt_store: Arc<dyn ReceiptStore> = Arc::new(MemoryReceiptStore::new());

    let mut executor = BlockExecutor::new(
        scenario.chain.clone(),
        block_store,
        receipt_store,
        Arc::new(PassiveInterpreter),
    );
    let mut processor = MemoryTraceProcessor::new();

    let mut parent = genesis;
    let mut blocks = Vec::with_capacity(scenario.blocks.len());

    for scenario_block in &scenario.blocks {
        let interval = scenario_block.interval.unwrap_or(DEFAULT_BLOCK_INTERVAL);
        let mut header = parent.child(parent.timestamp.saturating_add(interval));
        if let Some(coinbase) = scenario_block.coinbase {
            header.coinbase = coinbase;
        }

        let transactions = sign_transactions(scenario_block, &state, scenario.chain.chain_id)?;
        debug!("Block #{} carries {} transactions", header.number, transactions.len());
        let block = Block::new(header.clone(), transactions);

        let result = if with_traces {
            executor.execute_block_traced(&block, &mut state, &mut processor)
        } else {
            executor.execute_block(&block, &mut state)
        };
        blocks.push(result);
        parent = header;
    }

    Ok(ScenarioReport {
        chain: scenario.chain.chain_name.clone(),
        blocks,
        accounts: state.accounts(),
        traces: processor.into_traces(),
    })
}

/// Signs the block's transactions, assigning consecutive nonces per sender
fn sign_transactions(
    scenario_block: &ScenarioBlock,
    state: &OverlayState,
    chain_id: u8,
) -> Result<Vec<Transaction>, RunnerError> {
    let mut next_nonces: BTreeMap<Address, Nonce> = BTreeMap::new();
    let mut transactions = Vec::with_capacity(scenario_block.transactions.len());

    for scenario_tx in &scenario_block.transactions {
        let key = scenario_tx.signing_key()?;
        let sender = address_of_public_key(&key.verifying_key().to_bytes());
        let next = next_nonces
            .entry(sender)
            .or_insert_with(|| state.get_nonce(&sender));

        let unsigned = scenario_tx.to_unsigned(*next, chain_id)?;
        *next = unsigned.nonce.saturating_add(1);
        transactions.push(unsigned.sign(&key));
    }
    Ok(transactions)
}

/// Runs `request` as a local call on the block following the genesis
pub fn call_scenario(scenario: &Scenario, request: &CallRequest) -> Result<CallReport, RunnerError> {
    let (genesis, state) = GenesisBuilder::new(scenario.genesis.clone()).build()?;
    let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    block_store.save_block(&genesis);

    let header = genesis.child(genesis.timestamp.saturating_add(DEFAULT_BLOCK_INTERVAL));
    let ctx = ExecutionContext::new(
        scenario.chain.clone(),
        header,
        block_store,
        Arc::new(MemoryReceiptStore::new()),
        Arc::new(PassiveInterpreter),
    );

    let executor = ReversibleTransactionExecutor::new(ctx, &state);
    let outcome = executor.execute_transaction(request);

    Ok(CallReport {
        return_data: format!("0x{}", hex::encode(outcome.return_data())),
        gas_used: outcome.result.gas_used(),
        reverted: outcome.result.is_revert(),
        revert_reason: outcome.revert_reason(),
        error: (!outcome.execution_error.is_empty()).then(|| outcome.execution_error.clone()),
    })
}

/// Generates an Ed25519 keypair and its account address
pub fn generate_key(format: &str) -> Result<String, RunnerError> {
    let signing_key = SigningKey::generate(&mut OsRng);
    render_key(&signing_key, format)
}

/// Public key and address of an existing secret key (hex or key file)
pub fn inspect_key(key: &str) -> Result<String, RunnerError> {
    let content = if Path::new(key).is_file() {
        std::fs::read_to_string(key).map_err(|e| RunnerError::Key(format!("Failed to read key file: {}", e)))?
    } else {
        key.to_string()
    };
    let signing_key = parse_secret_key(&content)?;
    render_key(&signing_key, "hex")
}

fn render_key(signing_key: &SigningKey, format: &str) -> Result<String, RunnerError> {
    let public_key = signing_key.verifying_key().to_bytes();
    let secret_hex = hex::encode(signing_key.to_bytes());
    let public_hex = hex::encode(public_key);
    let address = address_of_public_key(&public_key);

    match format {
        "json" => {
            let json = serde_json::json!({
                "scheme": "ed25519",
                "secretKey": format!("0x{}", secret_hex),
                "publicKey": format!("0x{}", public_hex),
                "address": address.to_string(),
            });
            Ok(serde_json::to_string_pretty(&json)?)
        }
        "hex" => Ok(format!(
            "Secret Key: 0x{}\nPublic Key: 0x{}\nAddress:    {}",
            secret_hex, public_hex, address
        )),
        _ => Err(RunnerError::InvalidArgument(format!("Unknown format: {}", format))),
    }
}

/// Writes to `output`, or stdout when absent
pub fn write_output(output: Option<&Path>, content: &str) -> Result<(), RunnerError> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| RunnerError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            info!("Output saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
