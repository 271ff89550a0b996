//! Error types for proving and verification.
//!
//! Every failure belongs to one of two families, see [`ErrorKind`]. Nothing is
//! retried and no partial result is returned alongside an error.

use crate::merkle::MerkleError;
use crate::program::evaluator::EvaluatorError;

pub type Result<T> = core::result::Result<T, StarkError>;

/// The two disjoint error families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied coordinates, shapes or configuration are out of range.
    MalformedInput,
    /// A trace, commitment or proof fails a soundness check.
    IntegrityViolation,
}

#[derive(thiserror::Error, Debug)]
pub enum StarkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid assertion: register {register} is outside of register bank of {register_count}")]
    AssertionRegisterOutOfRange { register: usize, register_count: usize },

    #[error("invalid assertion: step {step} is outside of execution trace of {steps} steps")]
    AssertionStepOutOfRange { step: usize, steps: usize },

    #[error("assertion at step {step}, register {register} conflicts with execution trace")]
    AssertionMismatch { register: usize, step: usize },

    #[error("trace generation failed at step {step}")]
    TraceGeneration {
        step: usize,
        #[source]
        source: EvaluatorError,
    },

    #[error("transition constraint evaluation failed")]
    ConstraintEvaluation(#[source] EvaluatorError),

    #[error("transition constraints are not satisfied by the execution trace")]
    ConstraintsNotSatisfied,

    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error("verification of {proof} Merkle proof failed")]
    MerkleProofInvalid { proof: &'static str },

    #[error("linear combination does not match trace evaluations at position {position}")]
    CombinationMismatch { position: usize },

    #[error("verification of column Merkle proof failed at depth {depth}")]
    ColumnProofInvalid { depth: usize },

    #[error("verification of polynomial Merkle proof failed at depth {depth}")]
    PolyProofInvalid { depth: usize },

    #[error("degree 4 polynomial didn't evaluate to column value at depth {depth}")]
    FoldingMismatch { depth: usize },

    #[error("remainder degree bound {max_degree_plus1} cannot exceed {available} usable remainder values")]
    RemainderDegreeTooLarge {
        max_degree_plus1: usize,
        available: usize,
    },

    #[error("remainder has {actual} values but the last column domain has {expected}")]
    RemainderLengthMismatch { expected: usize, actual: usize },

    #[error("remainder values do not match Merkle root of the last column")]
    RemainderRootMismatch,

    #[error("remainder is not a valid degree {degree} polynomial")]
    RemainderNotLowDegree { degree: usize },

    #[error("array cannot be zero-length")]
    EmptyArray,

    #[error("array length ({len}) cannot exceed {max}")]
    ArrayTooLong { len: usize, max: usize },

    #[error("matrix column count ({count}) cannot exceed {max}")]
    MatrixTooWide { count: usize, max: usize },

    #[error("matrix column length ({len}) cannot exceed {max}")]
    MatrixColumnTooLong { len: usize, max: usize },

    #[error("invalid field element encoding: {0}")]
    InvalidElement(&'static str),

    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

impl StarkError {
    pub fn kind(&self) -> ErrorKind {
        use StarkError::*;
        match self {
            InvalidConfig(_)
            | InvalidInput(_)
            | AssertionRegisterOutOfRange { .. }
            | AssertionStepOutOfRange { .. }
            | TraceGeneration { .. }
            | ConstraintEvaluation(_)
            | Merkle(_)
            | RemainderDegreeTooLarge { .. }
            | EmptyArray
            | ArrayTooLong { .. }
            | MatrixTooWide { .. }
            | MatrixColumnTooLong { .. }
            | MalformedProof(_) => ErrorKind::MalformedInput,
            AssertionMismatch { .. }
            | ConstraintsNotSatisfied
            | MerkleProofInvalid { .. }
            | CombinationMismatch { .. }
            | ColumnProofInvalid { .. }
            | PolyProofInvalid { .. }
            | FoldingMismatch { .. }
            | RemainderLengthMismatch { .. }
            | RemainderRootMismatch
            | RemainderNotLowDegree { .. }
            | InvalidElement(_) => ErrorKind::IntegrityViolation,
        }
    }

    /// FRI depth at which verification failed, if the error is depth-qualified.
    pub fn depth(&self) -> Option<usize> {
        match self {
            StarkError::ColumnProofInvalid { depth }
            | StarkError::PolyProofInvalid { depth }
            | StarkError::FoldingMismatch { depth } => Some(*depth),
            _ => None,
        }
    }
}
