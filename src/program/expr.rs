//! A small algebraic instruction set for transition functions and constraints.
//!
//! Expressions are trees over register references and field literals and are
//! interpreted directly. Arithmetic operators build trees:
//!
//! ```
//! use ark_bls12_381::Fr;
//! use starkweave::program::expr::Expr;
//!
//! // n0 - (r0^3 + k0)
//! let constraint: Expr<Fr> = Expr::n(0) - (Expr::r(0).exp(3) + Expr::k(0));
//! assert_eq!(constraint.degree(), 3);
//! ```

use std::ops::{Add, Mul, Sub};

use ark_ff::Field;

use crate::program::evaluator::{ConstraintEvaluator, EvaluatorError, TransitionEvaluator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<F> {
    Literal(F),
    /// Current value of a mutable register.
    Register(usize),
    /// Next value of a mutable register.
    Next(usize),
    Readonly(usize),
    /// Global constant.
    Constant(usize),
    Add(Box<Expr<F>>, Box<Expr<F>>),
    Sub(Box<Expr<F>>, Box<Expr<F>>),
    Mul(Box<Expr<F>>, Box<Expr<F>>),
    Exp(Box<Expr<F>>, u64),
}

/// Values visible to an expression at one step.
pub struct Frame<'a, F> {
    pub current: &'a [F],
    pub next: Option<&'a [F]>,
    pub readonly: &'a [F],
    pub constants: &'a [F],
}

impl<F: Field> Expr<F> {
    pub fn r(index: usize) -> Self {
        Expr::Register(index)
    }

    pub fn n(index: usize) -> Self {
        Expr::Next(index)
    }

    pub fn k(index: usize) -> Self {
        Expr::Readonly(index)
    }

    pub fn constant(index: usize) -> Self {
        Expr::Constant(index)
    }

    pub fn lit(value: impl Into<F>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn exp(self, power: u64) -> Self {
        Expr::Exp(Box::new(self), power)
    }

    /// Algebraic degree in the register references. Literals and constants
    /// have degree 0, every register reference degree 1.
    pub fn degree(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Constant(_) => 0,
            Expr::Register(_) | Expr::Next(_) | Expr::Readonly(_) => 1,
            Expr::Add(a, b) | Expr::Sub(a, b) => a.degree().max(b.degree()),
            Expr::Mul(a, b) => a.degree() + b.degree(),
            Expr::Exp(base, power) => base.degree() * (*power as usize),
        }
    }

    pub fn reads_next(&self) -> bool {
        match self {
            Expr::Next(_) => true,
            Expr::Literal(_) | Expr::Register(_) | Expr::Readonly(_) | Expr::Constant(_) => false,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => a.reads_next() || b.reads_next(),
            Expr::Exp(base, _) => base.reads_next(),
        }
    }

    pub fn evaluate(&self, frame: &Frame<'_, F>) -> Result<F, EvaluatorError> {
        Ok(match self {
            Expr::Literal(value) => *value,
            Expr::Register(i) => lookup("mutable", frame.current, *i)?,
            Expr::Next(i) => match frame.next {
                Some(next) => lookup("next", next, *i)?,
                None => return Err(EvaluatorError::NextStateInTransition { register: *i }),
            },
            Expr::Readonly(i) => lookup("readonly", frame.readonly, *i)?,
            Expr::Constant(i) => lookup("constant", frame.constants, *i)?,
            Expr::Add(a, b) => a.evaluate(frame)? + b.evaluate(frame)?,
            Expr::Sub(a, b) => a.evaluate(frame)? - b.evaluate(frame)?,
            Expr::Mul(a, b) => a.evaluate(frame)? * b.evaluate(frame)?,
            Expr::Exp(base, power) => base.evaluate(frame)?.pow([*power]),
        })
    }
}

fn lookup<F: Copy>(kind: &'static str, values: &[F], index: usize) -> Result<F, EvaluatorError> {
    values
        .get(index)
        .copied()
        .ok_or(EvaluatorError::RegisterOutOfRange {
            kind,
            index,
            len: values.len(),
        })
}

impl<F: Field> Add for Expr<F> {
    type Output = Expr<F>;
    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl<F: Field> Sub for Expr<F> {
    type Output = Expr<F>;
    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl<F: Field> Mul for Expr<F> {
    type Output = Expr<F>;
    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

/// Transition function with one expression per mutable register.
#[derive(Debug, Clone)]
pub struct ExprTransition<F> {
    expressions: Vec<Expr<F>>,
}

impl<F: Field> ExprTransition<F> {
    pub fn new(expressions: Vec<Expr<F>>) -> Result<Self, EvaluatorError> {
        if let Some(register) = expressions.iter().position(Expr::reads_next) {
            return Err(EvaluatorError::NextStateInTransition { register });
        }
        Ok(Self { expressions })
    }
}

impl<F: Field> TransitionEvaluator<F> for ExprTransition<F> {
    fn apply(
        &self,
        current: &[F],
        readonly: &[F],
        constants: &[F],
        next: &mut [F],
    ) -> Result<(), EvaluatorError> {
        if next.len() != self.expressions.len() {
            return Err(EvaluatorError::OutputLength {
                expected: self.expressions.len(),
                actual: next.len(),
            });
        }
        let frame = Frame {
            current,
            next: None,
            readonly,
            constants,
        };
        for (slot, expression) in next.iter_mut().zip(&self.expressions) {
            *slot = expression.evaluate(&frame)?;
        }
        Ok(())
    }
}

/// Transition constraints given as expressions over `r`, `n` and `k`.
#[derive(Debug, Clone)]
pub struct ExprConstraints<F> {
    expressions: Vec<Expr<F>>,
    max_degree: usize,
}

impl<F: Field> ExprConstraints<F> {
    pub fn new(expressions: Vec<Expr<F>>) -> Self {
        let max_degree = expressions.iter().map(Expr::degree).max().unwrap_or(0).max(1);
        Self {
            expressions,
            max_degree,
        }
    }
}

impl<F: Field> ConstraintEvaluator<F> for ExprConstraints<F> {
    fn constraint_count(&self) -> usize {
        self.expressions.len()
    }

    fn max_degree(&self) -> usize {
        self.max_degree
    }

    fn evaluate(
        &self,
        r: &[F],
        n: &[F],
        k: &[F],
        constants: &[F],
    ) -> Result<Vec<F>, EvaluatorError> {
        let frame = Frame {
            current: r,
            next: Some(n),
            readonly: k,
            constants,
        };
        self.expressions.iter().map(|e| e.evaluate(&frame)).collect()
    }
}
