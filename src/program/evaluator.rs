//! Call contracts for transition functions and transition constraints.
//!
//! How an evaluator is produced does not matter to the prover; closures,
//! hand-written structs and [`crate::program::expr`] trees all work.

use ark_ff::Field;

use crate::program::registers::{LookupMode, ReadonlyRegister};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    #[error("{kind} register {index} is out of range (have {len})")]
    RegisterOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    #[error("transition expression for register {register} reads next register state")]
    NextStateInTransition { register: usize },
    #[error("expected {expected} output values, got {actual}")]
    OutputLength { expected: usize, actual: usize },
    #[error("evaluator failed: {0}")]
    Failed(String),
}

/// Computes the next state of the mutable registers from the current one.
pub trait TransitionEvaluator<F>: Send + Sync {
    fn apply(
        &self,
        current: &[F],
        readonly: &[F],
        constants: &[F],
        next: &mut [F],
    ) -> Result<(), EvaluatorError>;
}

impl<F, T> TransitionEvaluator<F> for T
where
    T: Fn(&[F], &[F], &[F], &mut [F]) -> Result<(), EvaluatorError> + Send + Sync,
{
    fn apply(
        &self,
        current: &[F],
        readonly: &[F],
        constants: &[F],
        next: &mut [F],
    ) -> Result<(), EvaluatorError> {
        self(current, readonly, constants, next)
    }
}

/// Transition constraints over a pair of consecutive states.
///
/// Every constraint evaluates to zero on a valid transition.
pub trait ConstraintEvaluator<F: Field>: Send + Sync {
    fn constraint_count(&self) -> usize;

    /// Highest algebraic degree among the constraints, at least 1.
    fn max_degree(&self) -> usize;

    /// Evaluates all constraints for current state `r`, next state `n` and
    /// readonly values `k`.
    fn evaluate(
        &self,
        r: &[F],
        n: &[F],
        k: &[F],
        constants: &[F],
    ) -> Result<Vec<F>, EvaluatorError>;

    /// Evaluates all constraints at every position of a cyclic domain of
    /// `steps` points. Next-state references at position `i` read
    /// `r[..][(i + skip) % steps]`; readonly registers are read in
    /// [`LookupMode::Extended`]. `out[j][i]` receives constraint `j` at `i`.
    fn evaluate_batch(
        &self,
        out: &mut [Vec<F>],
        r: &[Vec<F>],
        k: &[&dyn ReadonlyRegister<F>],
        constants: &[F],
        steps: usize,
        skip: usize,
    ) -> Result<(), EvaluatorError> {
        let count = self.constraint_count();
        if out.len() != count {
            return Err(EvaluatorError::OutputLength {
                expected: count,
                actual: out.len(),
            });
        }
        for column in out.iter_mut() {
            column.resize(steps, F::zero());
        }

        let mut current = vec![F::zero(); r.len()];
        let mut next = vec![F::zero(); r.len()];
        let mut readonly = vec![F::zero(); k.len()];
        for i in 0..steps {
            let j = (i + skip) % steps;
            for (register, values) in r.iter().enumerate() {
                current[register] = values[i];
                next[register] = values[j];
            }
            for (slot, register) in readonly.iter_mut().zip(k) {
                *slot = register.value_at(i, LookupMode::Extended);
            }
            let values = self.evaluate(&current, &next, &readonly, constants)?;
            if values.len() != count {
                return Err(EvaluatorError::OutputLength {
                    expected: count,
                    actual: values.len(),
                });
            }
            for (column, value) in out.iter_mut().zip(values) {
                column[i] = value;
            }
        }
        Ok(())
    }
}
