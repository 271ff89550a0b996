//! A STARK prover and verifier over prime fields.
//!
//! A computation is described by a [`program::evaluator::TransitionEvaluator`]
//! that advances a set of mutable registers one step at a time and a
//! [`program::evaluator::ConstraintEvaluator`] that checks two consecutive
//! states. [`Stark::prove`] executes the transition, commits to the
//! low-degree extension of the trace and proves the combined constraint
//! quotients with FRI; [`Stark::verify`] replays the constraints at the
//! sampled positions and checks the FRI proof.

pub mod config;
pub mod error;
pub mod hash;
pub mod logging;
pub mod math;
pub mod merkle;
pub mod program;
pub mod proof;
pub mod prover;
pub mod ser;
pub mod sizeof;
pub mod stark;
pub mod transcript;
pub mod verifier;

pub use error::{ErrorKind, Result, StarkError};
pub use stark::Stark;
