use std::collections::HashMap;

use ark_ff::PrimeField;
use ark_poly::EvaluationDomain;
use tracing::{debug, info, instrument};

use crate::error::{Result, StarkError};
use crate::math::composition::{
    BoundaryConstraints, CompositionPolynomial, composition_degree, transition_divisor_inverse,
};
use crate::math::field::{decode_element, decode_elements, element_size};
use crate::merkle::verify_batch;
use crate::program::evaluator::EvaluatorError;
use crate::program::registers::{LookupMode, ReadonlyRegister};
use crate::program::trace::Assertion;
use crate::proof::StarkProof;
use crate::stark::{Stark, augmented_positions};

impl<F: PrimeField> Stark<F> {
    /// Verifies `proof` for an execution of `steps` steps satisfying
    /// `assertions`. `readonly` must hold the same registers the prover used.
    #[instrument(skip_all, fields(steps = steps, assertions = assertions.len()))]
    pub fn verify(
        &self,
        assertions: &[Assertion<F>],
        proof: &StarkProof,
        steps: usize,
        readonly: &[&dyn ReadonlyRegister<F>],
    ) -> Result<()> {
        let register_count = self.config.register_count;
        let extension_factor = self.config.extension_factor;
        let hash = self.config.hash_algorithm;
        let (domain, extended) = self.domains(steps)?;
        let domain_size = extended.size();

        for assertion in assertions {
            if assertion.register >= register_count {
                return Err(StarkError::AssertionRegisterOutOfRange {
                    register: assertion.register,
                    register_count,
                });
            }
            if assertion.step >= steps {
                return Err(StarkError::AssertionStepOutOfRange {
                    step: assertion.step,
                    steps,
                });
            }
        }

        // 1 ----- openings of the trace and of the linear combination
        let positions = self
            .index_generator
            .get_exe_indexes(&proof.lc_root, domain_size);
        let augmented = augmented_positions(&positions, extension_factor, domain_size);

        if !verify_batch(&proof.ev_root, domain_size, &augmented, &proof.ev_proof, hash) {
            return Err(StarkError::MerkleProofInvalid {
                proof: "execution trace",
            });
        }
        if !verify_batch(&proof.lc_root, domain_size, &positions, &proof.lc_proof, hash) {
            return Err(StarkError::MerkleProofInvalid {
                proof: "linear combination",
            });
        }

        let value_size = element_size::<F>();
        let mut rows: HashMap<usize, Vec<F>> = HashMap::with_capacity(augmented.len());
        for (&position, leaf) in augmented.iter().zip(&proof.ev_proof.values) {
            if leaf.len() != register_count * value_size {
                return Err(StarkError::MalformedProof(format!(
                    "trace leaf at position {position} has {} bytes",
                    leaf.len()
                )));
            }
            let row = leaf
                .chunks_exact(value_size)
                .map(decode_element)
                .collect::<Result<Vec<F>>>()?;
            rows.insert(position, row);
        }
        let lc_values: Vec<F> = decode_elements(&proof.lc_proof.values)?;

        // 2 ----- replay the linear combination at every position
        let trace_root = domain.group_gen();
        let last_step = trace_root.pow([(steps - 1) as u64]);
        let boundary = BoundaryConstraints::new(assertions, trace_root)?;
        let composition = CompositionPolynomial::new(
            &proof.ev_root,
            self.component_bounds(steps, boundary.len()),
            composition_degree(self.config.constraint_degree, steps),
            hash,
        )?;
        let root = extended.group_gen();

        let mut k = vec![F::zero(); readonly.len()];
        let mut values = Vec::with_capacity(composition.component_count());
        for (&position, &lc_value) in positions.iter().zip(&lc_values) {
            let (Some(current), Some(next)) = (
                rows.get(&position),
                rows.get(&((position + extension_factor) % domain_size)),
            ) else {
                return Err(StarkError::MalformedProof(format!(
                    "missing trace row for position {position}"
                )));
            };
            for (slot, register) in k.iter_mut().zip(readonly) {
                *slot = register.value_at(position, LookupMode::Extended);
            }

            let x = root.pow([position as u64]);
            let constraint_values = self
                .constraints
                .evaluate(current, next, &k, &self.constants)
                .map_err(StarkError::ConstraintEvaluation)?;
            if constraint_values.len() != self.config.constraint_count {
                return Err(StarkError::ConstraintEvaluation(EvaluatorError::OutputLength {
                    expected: self.config.constraint_count,
                    actual: constraint_values.len(),
                }));
            }
            let divisor_inverse = transition_divisor_inverse(x, steps, last_step).ok_or_else(|| {
                StarkError::MalformedProof(format!("position {position} lies on the trace domain"))
            })?;

            values.clear();
            values.extend(constraint_values.iter().map(|&c| c * divisor_inverse));
            values.extend(boundary.evaluate_at(current, x)?);
            values.extend_from_slice(current);

            if composition.evaluate_at(&values, x) != lc_value {
                return Err(StarkError::CombinationMismatch { position });
            }
        }
        debug!(queries = positions.len(), "trace spot checks passed");

        // 3 ----- low degree of the linear combination
        self.ld_prover
            .verify(&proof.lc_root, composition.degree_plus1(), root, &proof.ld_proof)?;

        info!("proof verified");
        Ok(())
    }
}
