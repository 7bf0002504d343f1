// Signature cache - Émetteurs déjà récupérés, indexés par hash de transaction
use crate::types::{Address, Hash, Transaction};
use lru::LruCache;
use std::num::NonZeroUsize;

pub const DEFAULT_SIGNATURE_CACHE_SIZE: usize = 10_000;

/// Bounded cache of recovered senders, owned by the block-processing context
pub struct SignatureCache {
    senders: LruCache<Hash, Address>,
}

impl SignatureCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            senders: LruCache::new(capacity),
        }
    }

    /// Sender of `tx`, recovered and cached on a miss
    pub fn get_sender(&mut self, tx: &Transaction) -> Address {
        let hash = tx.hash();
        if let Some(sender) = self.senders.get(&hash) {
            return *sender;
        }
        let sender = tx.sender();
        self.senders.put(hash, sender);
        sender
    }

    pub fn store_sender(&mut self, tx: &Transaction) {
        self.senders.put(tx.hash(), tx.sender());
    }

    pub fn contains(&self, tx_hash: &Hash) -> bool {
        self.senders.contains(tx_hash)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Default for SignatureCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURE_CACHE_SIZE)
    }
}
