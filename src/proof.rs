//! The proof artifact exchanged between prover and verifier.

use crate::hash::Digest;
use crate::merkle::BatchMerkleProof;

pub use crate::math::fri::{FriComponent, LowDegreeProof};

/// A complete STARK proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarkProof {
    /// Commitment to the extended execution trace.
    pub ev_root: Digest,
    /// Trace rows at the sampled positions and at the steps that follow them.
    pub ev_proof: BatchMerkleProof,
    /// Commitment to the linear combination.
    pub lc_root: Digest,
    /// Linear combination values at the sampled positions.
    pub lc_proof: BatchMerkleProof,
    pub ld_proof: LowDegreeProof,
}
