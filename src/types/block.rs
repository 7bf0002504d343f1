// Block - Contexte d'exécution d'un bloc
use super::merkle::OrderedMerkleTree;
use super::primitives::{Address, BlockNumber, Gas, Hash, Timestamp};
use super::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// En-tête du bloc en cours d'exécution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBlock {
    /// Numéro de bloc (hauteur)
    pub number: BlockNumber,

    /// Hash du bloc parent
    pub parent_hash: Hash,

    /// Block proposer, receives fees unless they go to the protocol account
    pub coinbase: Address,

    /// Timestamp du bloc
    pub timestamp: Timestamp,

    /// Limite de gas du bloc
    pub gas_limit: Gas,
}

impl ExecutionBlock {
    /// Hash de l'en-tête
    pub fn hash(&self) -> Hash {
        match bincode::serialize(self) {
            Ok(bytes) => Hash::hash(&bytes),
            Err(_) => Hash::hash_tagged(
                b"block:",
                &[&self.number.to_be_bytes(), self.parent_hash.as_bytes()],
            ),
        }
    }

    /// Header of the next block, chained to this one
    pub fn child(&self, timestamp: Timestamp) -> Self {
        Self {
            number: self.number + 1,
            parent_hash: self.hash(),
            coinbase: self.coinbase,
            timestamp,
            gas_limit: self.gas_limit,
        }
    }
}

/// Bloc complet: en-tête et transactions ordonnées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: ExecutionBlock,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: ExecutionBlock, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> BlockNumber {
        self.header.number
    }

    /// Racine Merkle des hashes de transactions
    pub fn transactions_root(&self) -> Hash {
        OrderedMerkleTree::new(self.transactions.iter().map(|tx| *tx.hash().as_bytes())).root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ExecutionBlock {
        ExecutionBlock {
            number: 7,
            parent_hash: Hash::hash(b"parent"),
            coinbase: Address::from_low_u64(0xC0FFEE),
            timestamp: 1_700_000_000,
            gas_limit: 6_800_000,
        }
    }

    #[test]
    fn test_child_links_to_parent() {
        let parent = header();
        let child = parent.child(parent.timestamp + 10);
        assert_eq!(child.number, 8);
        assert_eq!(child.parent_hash, parent.hash());
        assert_ne!(child.hash(), parent.hash());
    }

    #[test]
    fn test_empty_block_has_zero_tx_root() {
        let block = Block::new(header(), vec![]);
        assert_eq!(block.transactions_root(), Hash::ZERO);
        assert_eq!(block.number(), 7);
    }
}
