//! Composition of the trace polynomials into a single low-degree vector.
//!
//! Three kinds of components are combined:
//!
//! * transition quotients `Q_j(x) = C_j(x) * (x - g^(n-1)) / (x^n - 1)`,
//! * boundary quotients `B_r(x) = (P_r(x) - I_r(x)) / Z_r(x)`,
//! * the register polynomials `P_r(x)` themselves.
//!
//! Each component `v` of degree below `bound` enters the combination as
//! `alpha * v + beta * v * x^(D - bound)`, so every term has degree below the
//! composition degree `D` and FRI bounds all of them at once.

use std::collections::BTreeMap;

use ark_ff::{FftField, PrimeField};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, StarkError};
use crate::hash::{Digest, HashAlgorithm};
use crate::math::domain::{extend, power_series};
use crate::math::polynomial::Polynomial;
use crate::program::trace::{Assertion, ExecutionTrace};
use crate::transcript::prng_sequence;

/// Degree bound of the transition quotients.
pub fn transition_degree_bound(constraint_degree: usize, steps: usize) -> usize {
    (constraint_degree.saturating_sub(1) * steps).max(1)
}

/// Degree bound `D` of the combined vector.
pub fn composition_degree(constraint_degree: usize, steps: usize) -> usize {
    transition_degree_bound(constraint_degree, steps)
        .max(steps)
        .next_power_of_two()
}

/// Register polynomials in coefficient form and evaluated over the extended
/// domain.
#[derive(Debug, Clone)]
pub struct TraceExtension<F> {
    pub coefficients: Vec<Vec<F>>,
    pub evaluations: Vec<Vec<F>>,
}

impl<F: FftField> TraceExtension<F> {
    pub fn new(
        trace: &ExecutionTrace<F>,
        domain: &GeneralEvaluationDomain<F>,
        extended: &GeneralEvaluationDomain<F>,
    ) -> Self {
        #[cfg(feature = "parallel")]
        let registers = trace.registers().par_iter();
        #[cfg(not(feature = "parallel"))]
        let registers = trace.registers().iter();

        let (coefficients, evaluations) = registers
            .map(|values| extend(values, domain, extended))
            .unzip();
        Self {
            coefficients,
            evaluations,
        }
    }

    /// Register values at one position of the extended domain.
    pub fn row(&self, position: usize) -> Vec<F> {
        self.evaluations.iter().map(|column| column[position]).collect()
    }
}

/// Divides the constraint evaluations over `extended` by the transition
/// divisor and returns the quotient evaluated over `extended`.
///
/// Fails with [`StarkError::ConstraintsNotSatisfied`] if the constraint does
/// not vanish on every transition of the trace.
pub fn transition_quotient<F: FftField>(
    evaluations: &[F],
    extended: &GeneralEvaluationDomain<F>,
    steps: usize,
    last_step: F,
) -> Result<Vec<F>> {
    let constraint = Polynomial::new(extended.ifft(evaluations));
    let numerator = constraint.multiply(&Polynomial::new(vec![-last_step, F::one()]));

    let (quotient, remainder) = numerator
        .divide_by_vanishing(steps)
        .ok_or(StarkError::ConstraintsNotSatisfied)?;
    if !remainder.is_zero() {
        return Err(StarkError::ConstraintsNotSatisfied);
    }
    Ok(extended.fft(quotient.coefficients()))
}

/// Inverse of the transition divisor `(x^n - 1) / (x - g^(n-1))` at `x`.
pub fn transition_divisor_inverse<F: FftField>(x: F, steps: usize, last_step: F) -> Option<F> {
    let vanishing = x.pow([steps as u64]) - F::one();
    Some((x - last_step) * vanishing.inverse()?)
}

#[derive(Debug, Clone)]
struct BoundaryConstraint<F: FftField> {
    register: usize,
    /// Passes through every asserted `(g^step, value)` of the register.
    interpolant: Polynomial<F>,
    /// Vanishes on every asserted `g^step` of the register.
    zerofier: Polynomial<F>,
}

/// One boundary constraint per register that carries assertions, ordered by
/// register.
#[derive(Debug, Clone)]
pub struct BoundaryConstraints<F: FftField> {
    constraints: Vec<BoundaryConstraint<F>>,
}

impl<F: FftField> BoundaryConstraints<F> {
    pub fn new(assertions: &[Assertion<F>], trace_root: F) -> Result<Self> {
        let mut by_register: BTreeMap<usize, BTreeMap<usize, F>> = BTreeMap::new();
        for assertion in assertions {
            let steps = by_register.entry(assertion.register).or_default();
            if let Some(previous) = steps.insert(assertion.step, assertion.value) {
                if previous != assertion.value {
                    return Err(StarkError::InvalidInput(format!(
                        "conflicting assertions for register {} at step {}",
                        assertion.register, assertion.step
                    )));
                }
            }
        }

        let constraints = by_register
            .into_iter()
            .map(|(register, steps)| {
                let xs: Vec<F> = steps
                    .keys()
                    .map(|&step| trace_root.pow([step as u64]))
                    .collect();
                let ys: Vec<F> = steps.values().copied().collect();
                BoundaryConstraint {
                    register,
                    interpolant: Polynomial::lagrange_interpolate(&xs, &ys),
                    zerofier: Polynomial::from_roots(&xs),
                }
            })
            .collect();
        Ok(Self { constraints })
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Boundary quotients evaluated over `extended`.
    pub fn quotients(
        &self,
        trace_coefficients: &[Vec<F>],
        extended: &GeneralEvaluationDomain<F>,
    ) -> Result<Vec<Vec<F>>> {
        self.constraints
            .iter()
            .map(|constraint| {
                let register = Polynomial::new(trace_coefficients[constraint.register].clone());
                let (quotient, remainder) = register
                    .sub(&constraint.interpolant)
                    .divide(&constraint.zerofier)
                    .ok_or(StarkError::ConstraintsNotSatisfied)?;
                if !remainder.is_zero() {
                    return Err(StarkError::ConstraintsNotSatisfied);
                }
                Ok(extended.fft(quotient.coefficients()))
            })
            .collect()
    }

    /// Boundary quotients at a single point outside of the trace domain.
    pub fn evaluate_at(&self, registers: &[F], x: F) -> Result<Vec<F>> {
        self.constraints
            .iter()
            .map(|constraint| {
                let value = registers.get(constraint.register).ok_or_else(|| {
                    StarkError::MalformedProof(format!(
                        "no value for asserted register {}",
                        constraint.register
                    ))
                })?;
                let inverse = constraint.zerofier.evaluate(x).inverse().ok_or_else(|| {
                    StarkError::MalformedProof("boundary divisor vanishes at query point".into())
                })?;
                Ok((*value - constraint.interpolant.evaluate(x)) * inverse)
            })
            .collect()
    }
}

/// Random linear combination of components with degree adjustment.
#[derive(Debug, Clone)]
pub struct CompositionPolynomial<F> {
    /// `(alpha, beta)` for component `i` at `2i` and `2i + 1`.
    coefficients: Vec<F>,
    bounds: Vec<usize>,
    degree_plus1: usize,
}

impl<F: PrimeField> CompositionPolynomial<F> {
    /// `bounds[i]` is the degree bound of component `i`. Coefficients are
    /// derived from `seed`, which must already be committed.
    pub fn new(seed: &Digest, bounds: Vec<usize>, degree_plus1: usize, hash: HashAlgorithm) -> Result<Self> {
        if let Some(&bound) = bounds.iter().find(|&&b| b > degree_plus1) {
            return Err(StarkError::InvalidInput(format!(
                "component degree bound {bound} exceeds composition degree {degree_plus1}"
            )));
        }
        Ok(Self {
            coefficients: prng_sequence(seed, 2 * bounds.len(), hash),
            bounds,
            degree_plus1,
        })
    }

    pub fn degree_plus1(&self) -> usize {
        self.degree_plus1
    }

    pub fn component_count(&self) -> usize {
        self.bounds.len()
    }

    /// Combination of `values` (one per component) at `x`.
    pub fn evaluate_at(&self, values: &[F], x: F) -> F {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let (alpha, beta) = (self.coefficients[2 * i], self.coefficients[2 * i + 1]);
                let shift = (self.degree_plus1 - self.bounds[i]) as u64;
                value * (alpha + beta * x.pow([shift]))
            })
            .sum()
    }

    /// Combination of full component columns over the powers of `root`.
    pub fn evaluations(&self, columns: &[&[F]], root: F) -> Vec<F> {
        let length = columns.first().map_or(0, |column| column.len());
        let mut shifted: BTreeMap<usize, Vec<F>> = BTreeMap::new();
        let mut result = vec![F::zero(); length];

        for (i, column) in columns.iter().enumerate() {
            let (alpha, beta) = (self.coefficients[2 * i], self.coefficients[2 * i + 1]);
            let shift = self.degree_plus1 - self.bounds[i];
            let powers = shifted
                .entry(shift)
                .or_insert_with(|| power_series(root.pow([shift as u64]), length));
            for ((out, &value), &power) in result.iter_mut().zip(column.iter()).zip(powers.iter()) {
                *out += value * (alpha + beta * power);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::domain::{get_domain, get_extended_domain};
    use ark_bls12_381::Fr;
    use ark_ff::Field;

    fn counter_trace(steps: u64) -> ExecutionTrace<Fr> {
        ExecutionTrace::from_registers(vec![(0..steps).map(Fr::from).collect()]).unwrap()
    }

    #[test]
    fn degrees() {
        assert_eq!(transition_degree_bound(1, 8), 1);
        assert_eq!(composition_degree(1, 8), 8);
        assert_eq!(transition_degree_bound(3, 16), 32);
        assert_eq!(composition_degree(3, 16), 32);
        assert_eq!(composition_degree(4, 16), 64);
    }

    #[test]
    fn transition_quotient_of_valid_trace() {
        let steps = 8;
        let domain = get_domain::<Fr>(steps).unwrap();
        let extended = get_extended_domain::<Fr>(steps, 4).unwrap();
        let extension = TraceExtension::new(&counter_trace(steps as u64), &domain, &extended);
        let g = domain.group_gen();
        let last_step = g.pow([steps as u64 - 1]);

        // n0 - r0 - 1 over the extended domain; next is 4 positions ahead
        let p = &extension.evaluations[0];
        let size = p.len();
        let c: Vec<Fr> = (0..size).map(|i| p[(i + 4) % size] - p[i] - Fr::from(1u64)).collect();
        let quotient = transition_quotient(&c, &extended, steps, last_step).unwrap();

        for i in (0..size).filter(|i| i % 4 != 0) {
            let x = extended.element(i);
            let expected = c[i] * transition_divisor_inverse(x, steps, last_step).unwrap();
            assert_eq!(quotient[i], expected);
        }
    }

    #[test]
    fn transition_quotient_of_long_trace() {
        let steps = 4096;
        let domain = get_domain::<Fr>(steps).unwrap();
        let extended = get_extended_domain::<Fr>(steps, 2).unwrap();
        let extension = TraceExtension::new(&counter_trace(steps as u64), &domain, &extended);
        let last_step = domain.group_gen().pow([steps as u64 - 1]);

        let p = &extension.evaluations[0];
        let size = p.len();
        let c: Vec<Fr> = (0..size).map(|i| p[(i + 2) % size] - p[i] - Fr::from(1u64)).collect();
        let quotient = transition_quotient(&c, &extended, steps, last_step).unwrap();
        for i in [1usize, 777, 4095, 8191] {
            let x = extended.element(i);
            let expected = c[i] * transition_divisor_inverse(x, steps, last_step).unwrap();
            assert_eq!(quotient[i], expected);
        }
    }

    #[test]
    fn transition_quotient_of_invalid_trace() {
        let steps = 8;
        let domain = get_domain::<Fr>(steps).unwrap();
        let extended = get_extended_domain::<Fr>(steps, 4).unwrap();
        let extension = TraceExtension::new(&counter_trace(steps as u64), &domain, &extended);
        let last_step = domain.group_gen().pow([steps as u64 - 1]);

        let p = &extension.evaluations[0];
        let size = p.len();
        let c: Vec<Fr> = (0..size).map(|i| p[(i + 4) % size] - p[i] - Fr::from(2u64)).collect();
        assert!(matches!(
            transition_quotient(&c, &extended, steps, last_step),
            Err(StarkError::ConstraintsNotSatisfied)
        ));
    }

    #[test]
    fn boundary_quotients_match_pointwise_evaluation() {
        let steps = 8;
        let domain = get_domain::<Fr>(steps).unwrap();
        let extended = get_extended_domain::<Fr>(steps, 4).unwrap();
        let extension = TraceExtension::new(&counter_trace(steps as u64), &domain, &extended);
        let assertions = vec![
            Assertion::new(0, 0, Fr::from(0u64)),
            Assertion::new(0, 7, Fr::from(7u64)),
        ];
        let boundary = BoundaryConstraints::new(&assertions, domain.group_gen()).unwrap();
        assert_eq!(boundary.len(), 1);

        let quotients = boundary.quotients(&extension.coefficients, &extended).unwrap();
        for i in [1usize, 6, 13, 31] {
            let x = extended.element(i);
            let at = boundary.evaluate_at(&extension.row(i), x).unwrap();
            assert_eq!(at[0], quotients[0][i]);
        }

        let wrong = vec![Assertion::new(0, 7, Fr::from(8u64))];
        let boundary = BoundaryConstraints::new(&wrong, domain.group_gen()).unwrap();
        assert!(boundary.quotients(&extension.coefficients, &extended).is_err());
    }

    #[test]
    fn conflicting_assertions_are_rejected() {
        let assertions = vec![
            Assertion::new(1, 3, Fr::from(1u64)),
            Assertion::new(1, 3, Fr::from(2u64)),
        ];
        assert!(BoundaryConstraints::new(&assertions, Fr::from(2u64)).is_err());
    }

    #[test]
    fn combination_is_consistent_pointwise() {
        let extended = get_extended_domain::<Fr>(8, 4).unwrap();
        let a: Vec<Fr> = (0..32u64).map(Fr::from).collect();
        let b: Vec<Fr> = (0..32u64).map(|i| Fr::from(i * i)).collect();
        let composition =
            CompositionPolynomial::<Fr>::new(&[5u8; 32], vec![2, 8], 8, HashAlgorithm::Sha256).unwrap();
        let combined = composition.evaluations(&[&a, &b], extended.group_gen());
        for i in [0usize, 3, 17] {
            let x = extended.element(i);
            assert_eq!(combined[i], composition.evaluate_at(&[a[i], b[i]], x));
        }
        assert!(CompositionPolynomial::<Fr>::new(&[5u8; 32], vec![16], 8, HashAlgorithm::Sha256).is_err());
    }
}
