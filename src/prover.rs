use ark_ff::PrimeField;
use ark_poly::EvaluationDomain;
use tracing::{debug, info, instrument};

use crate::error::{Result, StarkError};
use crate::math::composition::{
    BoundaryConstraints, CompositionPolynomial, TraceExtension, composition_degree,
    transition_quotient,
};
use crate::math::domain::power_series;
use crate::math::field::{encode_element, encode_elements};
use crate::merkle::MerkleTree;
use crate::program::registers::ReadonlyRegister;
use crate::program::trace::{Assertion, TraceBuilder, TraceContext, validate_assertions};
use crate::proof::StarkProof;
use crate::stark::{Stark, augmented_positions};

impl<F: PrimeField> Stark<F> {
    /// Generates a proof that executing the transition function over
    /// `inputs` produces a trace satisfying the constraints and `assertions`.
    ///
    /// # Arguments
    ///
    /// * `assertions` - boundary values the trace must contain
    /// * `context` - number of steps and the round length at which `inputs`
    ///   are injected
    /// * `inputs` - one value per round for every register
    /// * `readonly` - public per-step values, read by both the transition
    ///   function and the constraints
    ///
    /// # Errors
    ///
    /// Malformed inputs, a failing transition function, an assertion that does
    /// not hold, or constraints that do not vanish on the trace.
    #[instrument(skip_all, fields(steps = context.total_steps, registers = self.config.register_count))]
    pub fn prove(
        &self,
        assertions: &[Assertion<F>],
        context: &TraceContext,
        inputs: &[Vec<F>],
        readonly: &[&dyn ReadonlyRegister<F>],
    ) -> Result<StarkProof> {
        let steps = context.total_steps;
        let extension_factor = self.config.extension_factor;
        let hash = self.config.hash_algorithm;
        let (domain, extended) = self.domains(steps)?;
        let domain_size = extended.size();

        // 1 ----- execution trace
        let builder = TraceBuilder::new(
            self.config.register_count,
            self.transition.as_ref(),
            &self.constants,
        );
        let trace = builder.compute(context, inputs, readonly)?;
        validate_assertions(&trace, assertions)?;

        // 2 ----- extend and commit to the trace
        let extension = TraceExtension::new(&trace, &domain, &extended);
        let ev_leaves: Vec<Vec<u8>> = (0..domain_size)
            .map(|i| {
                extension
                    .evaluations
                    .iter()
                    .flat_map(|column| encode_element(&column[i]))
                    .collect()
            })
            .collect();
        let ev_tree = MerkleTree::new(ev_leaves, hash)?;
        debug!(domain_size, "committed extended trace");

        // 3 ----- transition and boundary quotients
        let mut constraint_values = vec![Vec::new(); self.config.constraint_count];
        self.constraints
            .evaluate_batch(
                &mut constraint_values,
                &extension.evaluations,
                readonly,
                &self.constants,
                domain_size,
                extension_factor,
            )
            .map_err(StarkError::ConstraintEvaluation)?;

        let last_step = domain.group_gen().pow([(steps - 1) as u64]);
        let transition_quotients = constraint_values
            .iter()
            .map(|values| transition_quotient(values, &extended, steps, last_step))
            .collect::<Result<Vec<_>>>()?;

        let boundary = BoundaryConstraints::new(assertions, domain.group_gen())?;
        let boundary_quotients = boundary.quotients(&extension.coefficients, &extended)?;

        // 4 ----- linear combination
        let composition = CompositionPolynomial::new(
            ev_tree.root(),
            self.component_bounds(steps, boundary.len()),
            composition_degree(self.config.constraint_degree, steps),
            hash,
        )?;
        let columns: Vec<&[F]> = transition_quotients
            .iter()
            .chain(&boundary_quotients)
            .chain(&extension.evaluations)
            .map(Vec::as_slice)
            .collect();
        let lc_values = composition.evaluations(&columns, extended.group_gen());
        let lc_tree = MerkleTree::new(encode_elements(&lc_values), hash)?;
        debug!(degree = composition.degree_plus1(), "committed linear combination");

        // 5 ----- spot checks
        let positions = self
            .index_generator
            .get_exe_indexes(lc_tree.root(), domain_size);
        let augmented = augmented_positions(&positions, extension_factor, domain_size);
        let ev_proof = ev_tree.prove_batch(&augmented)?;
        let lc_proof = lc_tree.prove_batch(&positions)?;

        // 6 ----- low degree proof of the linear combination
        let points = power_series(extended.group_gen(), domain_size);
        let ld_proof =
            self.ld_prover
                .prove(&lc_tree, &lc_values, &points, composition.degree_plus1())?;

        info!(
            queries = positions.len(),
            fri_components = ld_proof.components.len(),
            "proof generated"
        );
        Ok(StarkProof {
            ev_root: *ev_tree.root(),
            ev_proof,
            lc_root: *lc_tree.root(),
            lc_proof,
            ld_proof,
        })
    }
}
