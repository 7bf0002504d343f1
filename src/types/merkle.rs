// Merkle - Racines de transactions et de receipts
use super::primitives::Hash;
use rs_merkle::{Hasher, MerkleTree};

/// Blake3-based hasher for Merkle trees (consistent with the rest of KratOs)
#[derive(Clone)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    type Hash = [u8; 32];

    fn hash(data: &[u8]) -> Self::Hash {
        blake3::hash(data).into()
    }
}

/// Ordered Merkle tree over serialized leaves
pub struct OrderedMerkleTree {
    tree: MerkleTree<Blake3Hasher>,
    len: usize,
}

impl OrderedMerkleTree {
    pub fn new<I, L>(leaves: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let leaf_hashes: Vec<[u8; 32]> = leaves
            .into_iter()
            .map(|leaf| Blake3Hasher::hash(leaf.as_ref()))
            .collect();
        let len = leaf_hashes.len();
        let tree = MerkleTree::<Blake3Hasher>::from_leaves(&leaf_hashes);
        Self { tree, len }
    }

    /// Racine Merkle, `Hash::ZERO` pour un arbre vide
    pub fn root(&self) -> Hash {
        match self.tree.root() {
            Some(root) => Hash::from_bytes(root),
            None => Hash::ZERO,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
