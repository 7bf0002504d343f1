// Precompiled - Contrats natifs liés à des adresses fixes
use super::activation::{ActivationsForBlock, ConsensusRule};
use super::gas::GasCost;
use super::trace::ProgramSubtrace;
use crate::storage::{BlockStore, ReceiptStore};
use crate::types::{Address, BlockNumber, ExecutionBlock, Gas, Hash, Transaction};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Reserved addresses
// =============================================================================

pub const BLAKE3_ADDR: Address = Address::from_low_u64(0x02);
pub const IDENTITY_ADDR: Address = Address::from_low_u64(0x04);
pub const BLOCK_HASH_ADDR: Address = Address::from_low_u64(0x0100_0004);

/// Protocol account collecting fees when fee collection is enabled
pub const FEE_COLLECTOR_ADDR: Address = Address::from_low_u64(0x0100_0008);

/// Ce que voit un contrat natif avant son exécution
pub struct PrecompiledEnv<'a> {
    pub tx: &'a Transaction,
    pub block: &'a ExecutionBlock,
    pub block_store: &'a Arc<dyn BlockStore>,
    pub receipt_store: &'a Arc<dyn ReceiptStore>,
}

/// Built-in contract
pub trait PrecompiledContract {
    /// Called once before `required_gas` and `execute`
    fn init(&mut self, _env: &PrecompiledEnv<'_>) {}

    fn required_gas(&self, data: &[u8]) -> Gas;

    fn execute(&mut self, data: &[u8]) -> Result<Vec<u8>, PrecompiledError>;

    /// Calls made during the last `execute`
    fn subtraces(&self) -> Vec<ProgramSubtrace> {
        Vec::new()
    }
}

fn words(len: usize) -> Gas {
    (len as Gas).div_ceil(32)
}

// =============================================================================
// Built-ins
// =============================================================================

/// Returns its input
#[derive(Debug, Default)]
pub struct Identity;

impl PrecompiledContract for Identity {
    fn required_gas(&self, data: &[u8]) -> Gas {
        GasCost::add(15, GasCost::multiply(3, words(data.len())))
    }

    fn execute(&mut self, data: &[u8]) -> Result<Vec<u8>, PrecompiledError> {
        Ok(data.to_vec())
    }
}

/// Blake3 digest of its input
#[derive(Debug, Default)]
pub struct Blake3Digest;

impl PrecompiledContract for Blake3Digest {
    fn required_gas(&self, data: &[u8]) -> Gas {
        GasCost::add(60, GasCost::multiply(12, words(data.len())))
    }

    fn execute(&mut self, data: &[u8]) -> Result<Vec<u8>, PrecompiledError> {
        Ok(Hash::hash(data).as_bytes().to_vec())
    }
}

/// Hash of an ancestor block, queried by 32-byte big-endian number
#[derive(Default)]
pub struct BlockHash {
    current_block: BlockNumber,
    block_store: Option<Arc<dyn BlockStore>>,
}

impl BlockHash {
    pub const GAS: Gas = 800;
}

impl PrecompiledContract for BlockHash {
    fn init(&mut self, env: &PrecompiledEnv<'_>) {
        self.current_block = env.block.number;
        self.block_store = Some(Arc::clone(env.block_store));
    }

    fn required_gas(&self, _data: &[u8]) -> Gas {
        Self::GAS
    }

    fn execute(&mut self, data: &[u8]) -> Result<Vec<u8>, PrecompiledError> {
        if data.len() > 32 {
            return Err(PrecompiledError::InvalidInput(format!(
                "block number must fit in 32 bytes, got {}",
                data.len()
            )));
        }
        let mut word = [0u8; 32];
        word[32 - data.len()..].copy_from_slice(data);
        if word[..24].iter().any(|b| *b != 0) {
            return Err(PrecompiledError::InvalidInput("block number overflows u64".into()));
        }
        let mut number = [0u8; 8];
        number.copy_from_slice(&word[24..]);
        let number = u64::from_be_bytes(number);

        if number >= self.current_block {
            return Err(PrecompiledError::NotAnAncestor {
                requested: number,
                current: self.current_block,
            });
        }
        let store = self.block_store.as_ref().ok_or(PrecompiledError::NotInitialized)?;
        store
            .block_hash(number)
            .map(|hash| hash.as_bytes().to_vec())
            .ok_or(PrecompiledError::BlockNotFound(number))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockHash")
            .field("current_block", &self.current_block)
            .field("initialized", &self.block_store.is_some())
            .finish()
    }
}

// =============================================================================
// Registry
// =============================================================================

pub type PrecompiledFactory = Arc<dyn Fn() -> Box<dyn PrecompiledContract> + Send + Sync>;

/// Wraps a constructor into a registry factory
pub fn factory<F>(build: F) -> PrecompiledFactory
where
    F: Fn() -> Box<dyn PrecompiledContract> + Send + Sync + 'static,
{
    Arc::new(build)
}

#[derive(Clone)]
struct Entry {
    factory: PrecompiledFactory,
    /// Rule that must be active for the address to resolve
    rule: Option<ConsensusRule>,
}

/// Address → built-in contract lookup
#[derive(Clone, Default)]
pub struct PrecompiledContracts {
    entries: BTreeMap<Address, Entry>,
}

impl PrecompiledContracts {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in contracts
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(IDENTITY_ADDR, None, factory(|| Box::new(Identity)));
        registry.register(BLAKE3_ADDR, None, factory(|| Box::new(Blake3Digest)));
        registry.register(
            BLOCK_HASH_ADDR,
            Some(ConsensusRule::BlockHashPrecompile),
            factory(|| Box::new(BlockHash::default())),
        );
        registry
    }

    pub fn register(&mut self, address: Address, rule: Option<ConsensusRule>, factory: PrecompiledFactory) {
        self.entries.insert(address, Entry { factory, rule });
    }

    /// Fresh contract instance for `address`, if one is active at this block
    pub fn get_contract_for_address(
        &self,
        activations: &ActivationsForBlock,
        address: &Address,
    ) -> Option<Box<dyn PrecompiledContract>> {
        let entry = self.entries.get(address)?;
        match entry.rule {
            Some(rule) if !activations.is_active(rule) => None,
            _ => Some((entry.factory)()),
        }
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.entries.keys()
    }
}

impl fmt::Debug for PrecompiledContracts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Erreurs des contrats natifs
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PrecompiledError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Block {requested} is not an ancestor of block {current}")]
    NotAnAncestor { requested: BlockNumber, current: BlockNumber },

    #[error("Block {0} not found")]
    BlockNotFound(BlockNumber),

    #[error("Contract used before init")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::activation::ActivationConfig;
    use crate::storage::{MemoryBlockStore, MemoryReceiptStore};
    use crate::types::UnsignedTransaction;
    use ed25519_dalek::SigningKey;

    #[test]
    fn test_identity_and_digest_pricing() {
        assert_eq!(Identity.required_gas(&[]), 15);
        assert_eq!(Identity.required_gas(&[0; 33]), 15 + 6);
        assert_eq!(Blake3Digest.required_gas(&[0; 32]), 72);
        assert_eq!(Identity.execute(b"abc").unwrap(), b"abc".to_vec());
        assert_eq!(
            Blake3Digest.execute(b"abc").unwrap(),
            Hash::hash(b"abc").as_bytes().to_vec()
        );
    }

    #[test]
    fn test_rule_gated_lookup() {
        let registry = PrecompiledContracts::with_builtins();
        let legacy = ActivationConfig::legacy().for_block(1);
        let current = ActivationConfig::all_active().for_block(1);

        assert!(registry.get_contract_for_address(&legacy, &IDENTITY_ADDR).is_some());
        assert!(registry.get_contract_for_address(&legacy, &BLOCK_HASH_ADDR).is_none());
        assert!(registry.get_contract_for_address(&current, &BLOCK_HASH_ADDR).is_some());
        assert!(registry.get_contract_for_address(&current, &FEE_COLLECTOR_ADDR).is_none());
        assert_eq!(registry.addresses().count(), 3);
    }

    #[test]
    fn test_block_hash_reads_ancestors_only() {
        let genesis = ExecutionBlock {
            number: 0,
            parent_hash: Hash::ZERO,
            coinbase: Address::ZERO,
            timestamp: 0,
            gas_limit: 1_000_000,
        };
        let current = genesis.child(10);
        let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
        block_store.save_block(&genesis);
        let receipt_store: Arc<dyn ReceiptStore> = Arc::new(MemoryReceiptStore::new());
        let tx = UnsignedTransaction::default().sign(&SigningKey::from_bytes(&[2u8; 32]));

        let mut contract = BlockHash::default();
        assert_eq!(contract.execute(&[]), Err(PrecompiledError::NotAnAncestor { requested: 0, current: 0 }));

        contract.init(&PrecompiledEnv {
            tx: &tx,
            block: &current,
            block_store: &block_store,
            receipt_store: &receipt_store,
        });
        assert_eq!(contract.execute(&[0]).unwrap(), genesis.hash().as_bytes().to_vec());
        assert!(matches!(contract.execute(&[1]), Err(PrecompiledError::NotAnAncestor { .. })));
        assert!(matches!(contract.execute(&[0; 33]), Err(PrecompiledError::InvalidInput(_))));
    }
}
