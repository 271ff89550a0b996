//! Binary Merkle tree with batch inclusion proofs.
//!
//! Leaves are arbitrary byte strings hashed as `hash(0x00 || leaf)`; every
//! internal node is `hash(0x01 || left || right)`. A batch proof carries, for each
//! opened position, only the authentication nodes the verifier cannot derive
//! from the other opened positions.

use std::collections::{HashMap, HashSet};

use crate::hash::{Digest, HashAlgorithm};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a Merkle tree without leaves")]
    EmptyTree,
    #[error("leaf count {0} is not a power of two")]
    NotPowerOfTwo(usize),
    #[error("cannot prove an empty set of positions")]
    EmptyBatch,
    #[error("position {position} is outside of a tree with {leaf_count} leaves")]
    PositionOutOfRange { position: usize, leaf_count: usize },
}

/// Inclusion proof for a batch of leaf positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMerkleProof {
    /// Leaf values, in the order the positions were requested.
    pub values: Vec<Vec<u8>>,
    /// Authentication nodes contributed by each requested position.
    pub nodes: Vec<Vec<Digest>>,
    /// Number of levels between the leaves and the root.
    pub depth: u8,
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    leaves: Vec<Vec<u8>>,
    /// `levels[0]` holds leaf hashes, the last level holds the root alone.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Vec<u8>>, hash: HashAlgorithm) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        if !leaves.len().is_power_of_two() {
            return Err(MerkleError::NotPowerOfTwo(leaves.len()));
        }

        let mut current_level: Vec<Digest> = leaves.iter().map(|leaf| hash.hash_leaf(leaf)).collect();
        let mut levels = Vec::new();
        while current_level.len() > 1 {
            let next_level = current_level
                .chunks_exact(2)
                .map(|pair| hash.hash_node(&pair[0], &pair[1]))
                .collect();
            levels.push(current_level);
            current_level = next_level;
        }
        levels.push(current_level);

        Ok(MerkleTree { leaves, levels })
    }

    pub fn root(&self) -> &Digest {
        &self.levels[self.levels.len() - 1][0]
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.leaves
    }

    /// Opens the leaves at `positions`. Positions may repeat; each repetition
    /// carries its own copy of the leaf value.
    pub fn prove_batch(&self, positions: &[usize]) -> Result<BatchMerkleProof, MerkleError> {
        if positions.is_empty() {
            return Err(MerkleError::EmptyBatch);
        }
        let leaf_count = self.leaves.len();
        if let Some(&position) = positions.iter().find(|&&p| p >= leaf_count) {
            return Err(MerkleError::PositionOutOfRange {
                position,
                leaf_count,
            });
        }

        let values = positions.iter().map(|&p| self.leaves[p].clone()).collect();
        let mut nodes = vec![Vec::new(); positions.len()];

        for (level, level_nodes) in self.levels[..self.depth()].iter().enumerate() {
            let known: HashSet<usize> = positions.iter().map(|&p| p >> level).collect();
            let mut claimed = HashSet::new();
            for (i, &position) in positions.iter().enumerate() {
                let index = position >> level;
                if !claimed.insert(index) {
                    continue;
                }
                let sibling = index ^ 1;
                if !known.contains(&sibling) {
                    nodes[i].push(level_nodes[sibling]);
                }
            }
        }

        Ok(BatchMerkleProof {
            values,
            nodes,
            depth: self.depth() as u8,
        })
    }
}

/// Checks that `proof` opens `positions` of the tree of `leaf_count` leaves
/// committed to by `root`. The depth claimed by the proof must match the
/// committed leaf count.
pub fn verify_batch(
    root: &Digest,
    leaf_count: usize,
    positions: &[usize],
    proof: &BatchMerkleProof,
    hash: HashAlgorithm,
) -> bool {
    if positions.is_empty()
        || positions.len() != proof.values.len()
        || positions.len() != proof.nodes.len()
        || !leaf_count.is_power_of_two()
    {
        return false;
    }
    let depth = proof.depth as usize;
    if depth != leaf_count.trailing_zeros() as usize {
        return false;
    }
    if positions.iter().any(|&p| p >= leaf_count) {
        return false;
    }

    let mut current: HashMap<usize, Digest> = HashMap::with_capacity(positions.len());
    for (&position, value) in positions.iter().zip(&proof.values) {
        let leaf_hash = hash.hash_leaf(value);
        if let Some(previous) = current.insert(position, leaf_hash) {
            if previous != leaf_hash {
                return false;
            }
        }
    }

    let mut cursors = vec![0usize; positions.len()];
    for level in 0..depth {
        let mut next = HashMap::with_capacity(current.len());
        let mut claimed = HashSet::new();
        for (i, &position) in positions.iter().enumerate() {
            let index = position >> level;
            if !claimed.insert(index) {
                continue;
            }
            let Some(node) = current.get(&index) else {
                return false;
            };
            let sibling = match current.get(&(index ^ 1)) {
                Some(sibling) => *sibling,
                None => match proof.nodes[i].get(cursors[i]) {
                    Some(sibling) => {
                        cursors[i] += 1;
                        *sibling
                    }
                    None => return false,
                },
            };
            let parent = if index % 2 == 0 {
                hash.hash_node(node, &sibling)
            } else {
                hash.hash_node(&sibling, node)
            };
            next.insert(index >> 1, parent);
        }
        current = next;
    }

    // every supplied node must have been consumed
    if cursors
        .iter()
        .zip(&proof.nodes)
        .any(|(&used, column)| used != column.len())
    {
        return false;
    }

    current.get(&0) == Some(root)
}
