//! Hash functions used for commitments and Fiat-Shamir derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Size in bytes of every digest produced by a supported [`HashAlgorithm`].
pub const DIGEST_SIZE: usize = 32;

/// Fixed-size hash output.
pub type Digest = [u8; DIGEST_SIZE];

/// Hash algorithms a STARK can be configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

/// Prefix of every Merkle leaf hash.
const LEAF_DOMAIN: u8 = 0x00;
/// Prefix of every internal Merkle node hash.
const NODE_DOMAIN: u8 = 0x01;

impl HashAlgorithm {
    /// Hashes a single byte string.
    pub fn digest(&self, data: &[u8]) -> Digest {
        self.hash_parts(&[data])
    }

    /// Hash of a Merkle leaf. Leaves and internal nodes live in separate
    /// domains, so an internal node can never be opened as a leaf.
    pub fn hash_leaf(&self, leaf: &[u8]) -> Digest {
        self.hash_parts(&[&[LEAF_DOMAIN], leaf])
    }

    /// Hash of an internal Merkle node with children `left` and `right`.
    pub fn hash_node(&self, left: &Digest, right: &Digest) -> Digest {
        self.hash_parts(&[&[NODE_DOMAIN], left, right])
    }

    pub fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    /// Hashes the concatenation of `parts` without allocating it.
    fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        match self {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                for &part in parts {
                    hasher.update(part);
                }
                hasher.finalize().into()
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                for &part in parts {
                    hasher.update(part);
                }
                *hasher.finalize().as_bytes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_and_node_hashes_are_separated() {
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
            let left = [1u8; 32];
            let right = [2u8; 32];
            let mut joined = left.to_vec();
            joined.extend_from_slice(&right);
            // a 64-byte leaf equal to two concatenated children
            assert_ne!(hash.hash_node(&left, &right), hash.hash_leaf(&joined));
            assert_ne!(hash.hash_leaf(&joined), hash.digest(&joined));

            let mut prefixed = vec![0x01];
            prefixed.extend_from_slice(&joined);
            assert_eq!(hash.hash_node(&left, &right), hash.digest(&prefixed));
        }
    }

    #[test]
    fn algorithms_disagree() {
        let data = b"starkweave";
        assert_ne!(
            HashAlgorithm::Sha256.digest(data),
            HashAlgorithm::Blake3.digest(data)
        );
    }

    #[test]
    fn sha256_known_vector() {
        // sha256("abc")
        let expected: Digest = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
            0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
            0xf2, 0x00, 0x15, 0xad,
        ];
        assert_eq!(HashAlgorithm::Sha256.digest(b"abc"), expected);
    }
}
