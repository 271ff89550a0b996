//! Field, polynomial and low-degree proof primitives.
//!
//! Polynomials are dense coefficient vectors over an arkworks prime field,
//! evaluation domains are multiplicative subgroups of power-of-two order,
//! and [`fri`] proves that a committed vector of evaluations has low degree.

pub mod composition;
pub mod domain;
pub mod field;
pub mod fri;
pub mod polynomial;
