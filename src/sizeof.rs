//! Exact serialized size of a proof, computed from its shape.
//!
//! The rules mirror the wire format in [`crate::ser`]: arrays carry a one
//! byte length prefix, matrices a one byte column count and one byte per
//! column, and Merkle proofs a trailing depth byte.

use crate::error::{Result, StarkError};
use crate::merkle::BatchMerkleProof;
use crate::proof::StarkProof;

pub const MAX_ARRAY_LENGTH: usize = 256;
/// Matrix columns must be strictly shorter than this.
pub const MAX_MATRIX_COLUMN_LENGTH: usize = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdProofSize {
    /// Linear combination root and its Merkle proof.
    pub lc_proof: usize,
    /// One entry per FRI component followed by the remainder.
    pub levels: Vec<usize>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofSize {
    /// Trace root and its Merkle proof.
    pub ev_proof: usize,
    pub ld_proof: LdProofSize,
    pub total: usize,
}

pub fn size_of(proof: &StarkProof, hash_digest_size: usize) -> Result<ProofSize> {
    let ev_proof = hash_digest_size + size_of_merkle_proof(&proof.ev_proof)?;

    let lc_proof = hash_digest_size + size_of_merkle_proof(&proof.lc_proof)?;
    let mut ld_total = 1 + lc_proof; // component count
    let mut levels = Vec::with_capacity(proof.ld_proof.components.len() + 1);
    for component in &proof.ld_proof.components {
        let level = hash_digest_size
            + size_of_merkle_proof(&component.column_proof)?
            + size_of_merkle_proof(&component.poly_proof)?;
        ld_total += level;
        levels.push(level);
    }
    let remainder = size_of_array(&proof.ld_proof.remainder)?;
    ld_total += remainder;
    levels.push(remainder);

    Ok(ProofSize {
        ev_proof,
        ld_proof: LdProofSize {
            lc_proof,
            levels,
            total: ld_total,
        },
        total: ev_proof + ld_total,
    })
}

pub fn size_of_merkle_proof(proof: &BatchMerkleProof) -> Result<usize> {
    Ok(size_of_array(&proof.values)? + size_of_matrix(&proof.nodes)? + 1)
}

pub fn size_of_array<T: AsRef<[u8]>>(array: &[T]) -> Result<usize> {
    if array.is_empty() {
        return Err(StarkError::EmptyArray);
    }
    if array.len() > MAX_ARRAY_LENGTH {
        return Err(StarkError::ArrayTooLong {
            len: array.len(),
            max: MAX_ARRAY_LENGTH,
        });
    }
    Ok(1 + array.iter().map(|e| e.as_ref().len()).sum::<usize>())
}

pub fn size_of_matrix<T: AsRef<[u8]>>(matrix: &[Vec<T>]) -> Result<usize> {
    if matrix.len() > MAX_ARRAY_LENGTH {
        return Err(StarkError::MatrixTooWide {
            count: matrix.len(),
            max: MAX_ARRAY_LENGTH,
        });
    }
    let mut size = 1 + matrix.len();
    for column in matrix {
        if column.len() >= MAX_MATRIX_COLUMN_LENGTH {
            return Err(StarkError::MatrixColumnTooLong {
                len: column.len(),
                max: MAX_MATRIX_COLUMN_LENGTH,
            });
        }
        size += column.iter().map(|e| e.as_ref().len()).sum::<usize>();
    }
    Ok(size)
}
