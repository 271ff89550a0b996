//! A STARK for one transition function and its constraints.
//!
//! Proving and verification live in [`crate::prover`] and
//! [`crate::verifier`]; this module holds the shared setup.

use ark_ff::PrimeField;
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use tracing::debug;

use crate::config::{StarkConfig, StarkOptions};
use crate::error::{Result, StarkError};
use crate::math::composition::transition_degree_bound;
use crate::math::domain::{get_domain, get_extended_domain};
use crate::math::field::element_size;
use crate::math::fri::LowDegreeProver;
use crate::program::evaluator::{ConstraintEvaluator, TransitionEvaluator};
use crate::proof::StarkProof;
use crate::ser::{parse_proof, serialize_proof};
use crate::sizeof::{ProofSize, size_of};
use crate::transcript::QueryIndexGenerator;

pub struct Stark<F: PrimeField> {
    pub(crate) config: StarkConfig,
    pub(crate) transition: Box<dyn TransitionEvaluator<F>>,
    pub(crate) constraints: Box<dyn ConstraintEvaluator<F>>,
    pub(crate) constants: Vec<F>,
    pub(crate) index_generator: QueryIndexGenerator,
    pub(crate) ld_prover: LowDegreeProver,
}

impl<F: PrimeField> Stark<F> {
    /// Creates a STARK for programs with `register_count` mutable registers.
    ///
    /// The constraint count and degree are taken from `constraints`; the
    /// options are validated against them.
    pub fn new<T, C>(
        register_count: usize,
        transition: T,
        constraints: C,
        constants: Vec<F>,
        options: &StarkOptions,
    ) -> Result<Self>
    where
        T: TransitionEvaluator<F> + 'static,
        C: ConstraintEvaluator<F> + 'static,
    {
        let config = StarkConfig::new(
            options,
            register_count,
            constants.len(),
            constraints.constraint_count(),
            constraints.max_degree(),
        )?;
        debug!(
            registers = config.register_count,
            constraints = config.constraint_count,
            degree = config.constraint_degree,
            extension_factor = config.extension_factor,
            "stark configured"
        );

        let index_generator = QueryIndexGenerator::from_config(&config);
        let ld_prover = LowDegreeProver::new(index_generator.clone(), config.hash_algorithm);
        Ok(Self {
            config,
            transition: Box::new(transition),
            constraints: Box::new(constraints),
            constants,
            index_generator,
            ld_prover,
        })
    }

    pub fn config(&self) -> &StarkConfig {
        &self.config
    }

    pub fn extension_factor(&self) -> usize {
        self.config.extension_factor
    }

    pub fn size_of(&self, proof: &StarkProof) -> Result<ProofSize> {
        size_of(proof, self.config.hash_algorithm.digest_size())
    }

    pub fn serialize(&self, proof: &StarkProof) -> Result<Vec<u8>> {
        serialize_proof(proof)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<StarkProof> {
        let value_size = element_size::<F>();
        parse_proof(bytes, self.config.register_count * value_size, value_size)
    }

    /// Trace and extended domains for an execution of `steps` steps.
    pub(crate) fn domains(
        &self,
        steps: usize,
    ) -> Result<(GeneralEvaluationDomain<F>, GeneralEvaluationDomain<F>)> {
        if steps < 2 || !steps.is_power_of_two() {
            return Err(StarkError::InvalidInput(format!(
                "number of steps ({steps}) must be a power of 2 greater than 1"
            )));
        }
        let domain = get_domain(steps)?;
        let extended: GeneralEvaluationDomain<F> =
            get_extended_domain(steps, self.config.extension_factor)?;
        debug_assert_eq!(
            domain.group_gen(),
            extended.group_gen().pow([self.config.extension_factor as u64])
        );
        Ok((domain, extended))
    }

    /// Degree bounds of the composition components: transition quotients,
    /// then boundary quotients, then register polynomials.
    pub(crate) fn component_bounds(&self, steps: usize, boundary_count: usize) -> Vec<usize> {
        let transition = transition_degree_bound(self.config.constraint_degree, steps);
        std::iter::repeat_n(transition, self.config.constraint_count)
            .chain(std::iter::repeat_n(steps, boundary_count))
            .chain(std::iter::repeat_n(steps, self.config.register_count))
            .collect()
    }
}

/// Sampled positions followed by the positions of their next steps,
/// without repetitions.
pub(crate) fn augmented_positions(positions: &[usize], skip: usize, domain_size: usize) -> Vec<usize> {
    let mut augmented = positions.to_vec();
    for &position in positions {
        let next = (position + skip) % domain_size;
        if !augmented.contains(&next) {
            augmented.push(next);
        }
    }
    augmented
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::expr::{Expr, ExprConstraints, ExprTransition};
    use ark_bls12_381::Fr;

    #[test]
    fn augmented_positions_wrap_and_dedup() {
        assert_eq!(augmented_positions(&[1, 5, 30], 4, 32), vec![1, 5, 30, 9, 2]);
    }

    #[test]
    fn component_bounds_follow_config() {
        let transition = ExprTransition::<Fr>::new(vec![Expr::r(0).exp(3) + Expr::k(0)]).unwrap();
        let constraints = ExprConstraints::<Fr>::new(vec![Expr::n(0) - (Expr::r(0).exp(3) + Expr::k(0))]);
        let stark = Stark::<Fr>::new(1, transition, constraints, vec![], &StarkOptions::default()).unwrap();
        assert_eq!(stark.extension_factor(), 8);
        assert_eq!(stark.component_bounds(64, 2), vec![128, 64, 64, 64]);
        assert!(stark.domains(48).is_err());
        assert!(stark.domains(1).is_err());
        let (domain, extended) = stark.domains(64).unwrap();
        assert_eq!(extended.size(), domain.size() * 8);
    }
}
