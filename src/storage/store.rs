// Store - Blocs et receipts déjà produits (en mémoire)
use crate::types::{BlockNumber, ExecutionBlock, Hash, TransactionReceipt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read access to the canonical chain
pub trait BlockStore: Send + Sync {
    fn block_hash(&self, number: BlockNumber) -> Option<Hash>;

    fn save_block(&self, header: &ExecutionBlock);

    fn best_block_number(&self) -> Option<BlockNumber>;
}

/// Receipt of an included transaction with its position in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub block_hash: Hash,
    pub tx_index: usize,
    pub receipt: TransactionReceipt,
}

pub trait ReceiptStore: Send + Sync {
    fn add(&self, block_hash: Hash, tx_index: usize, receipt: TransactionReceipt);

    fn get(&self, tx_hash: &Hash) -> Option<TransactionInfo>;

    fn count(&self) -> usize;
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Block hashes indexed by number
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    hashes: RwLock<BTreeMap<BlockNumber, Hash>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryBlockStore {
    fn block_hash(&self, number: BlockNumber) -> Option<Hash> {
        read(&self.hashes).get(&number).copied()
    }

    fn save_block(&self, header: &ExecutionBlock) {
        write(&self.hashes).insert(header.number, header.hash());
    }

    fn best_block_number(&self) -> Option<BlockNumber> {
        read(&self.hashes).keys().next_back().copied()
    }
}

/// Receipts indexed by transaction hash
#[derive(Debug, Default)]
pub struct MemoryReceiptStore {
    receipts: RwLock<HashMap<Hash, TransactionInfo>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn add(&self, block_hash: Hash, tx_index: usize, receipt: TransactionReceipt) {
        let info = TransactionInfo {
            block_hash,
            tx_index,
            receipt,
        };
        write(&self.receipts).insert(info.receipt.tx_hash, info);
    }

    fn get(&self, tx_hash: &Hash) -> Option<TransactionInfo> {
        read(&self.receipts).get(tx_hash).cloned()
    }

    fn count(&self) -> usize {
        read(&self.receipts).len()
    }
}
