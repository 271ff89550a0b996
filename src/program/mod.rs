//! Programs proved by a STARK: the execution trace and the evaluators that
//! define valid state transitions.

pub mod evaluator;
pub mod expr;
pub mod registers;
pub mod trace;
