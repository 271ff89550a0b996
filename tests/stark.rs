#[cfg(test)]
mod tests {
    use ark_bls12_381::Fr;
    use ark_ff::{Field, One};
    use starkweave::config::StarkOptions;
    use starkweave::error::{ErrorKind, StarkError};
    use starkweave::hash::HashAlgorithm;
    use starkweave::program::expr::{Expr, ExprConstraints, ExprTransition};
    use starkweave::program::registers::{CyclicRegister, ReadonlyRegister};
    use starkweave::program::trace::{Assertion, TraceContext};
    use starkweave::Stark;

    const FIB_STEPS: usize = 128;
    const MIMC_STEPS: usize = 64;

    fn fibonacci_stark(hash: HashAlgorithm) -> Stark<Fr> {
        starkweave::logging::init_with_level(Some("debug"));
        let transition = ExprTransition::<Fr>::new(vec![
            Expr::r(0) + Expr::r(1),
            Expr::r(1) + (Expr::r(0) + Expr::r(1)),
        ])
        .unwrap();
        let constraints = ExprConstraints::<Fr>::new(vec![
            Expr::n(0) - (Expr::r(0) + Expr::r(1)),
            Expr::n(1) - (Expr::r(1) + Expr::n(0)),
        ]);
        let options = StarkOptions {
            extension_factor: Some(4),
            hash_algorithm: hash,
            ..StarkOptions::default()
        };
        Stark::new(2, transition, constraints, vec![], &options).unwrap()
    }

    /// Both registers of every step of the two-register Fibonacci program.
    fn fibonacci_sequence(steps: usize) -> (Vec<Fr>, Vec<Fr>) {
        let (mut a, mut b) = (Fr::one(), Fr::one());
        let mut r0 = Vec::with_capacity(steps);
        let mut r1 = Vec::with_capacity(steps);
        for _ in 0..steps {
            r0.push(a);
            r1.push(b);
            a += b;
            b += a;
        }
        (r0, r1)
    }

    fn fibonacci_assertions(steps: usize) -> Vec<Assertion<Fr>> {
        let (r0, r1) = fibonacci_sequence(steps);
        vec![
            Assertion::new(0, 0, Fr::one()),
            Assertion::new(1, 0, Fr::one()),
            Assertion::new(1, steps - 1, r1[steps - 1]),
            Assertion::new(0, steps - 1, r0[steps - 1]),
        ]
    }

    fn mimc_constants() -> Vec<Fr> {
        (0..16u64).map(|i| Fr::from(i * i * 42 + 17)).collect()
    }

    fn mimc_result(seed: Fr, constants: &[Fr], steps: usize) -> Fr {
        let mut value = seed;
        for step in 0..steps - 1 {
            value = value.pow([3u64]) + constants[step % constants.len()];
        }
        value
    }

    fn mimc_stark() -> Stark<Fr> {
        starkweave::logging::init_with_level(Some("debug"));
        let transition =
            ExprTransition::<Fr>::new(vec![Expr::r(0).exp(3) + Expr::k(0)]).unwrap();
        let constraints =
            ExprConstraints::<Fr>::new(vec![Expr::n(0) - (Expr::r(0).exp(3) + Expr::k(0))]);
        Stark::new(1, transition, constraints, vec![], &StarkOptions::default()).unwrap()
    }

    #[test]
    fn test_fibonacci_proof() {
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
            let stark = fibonacci_stark(hash);
            let assertions = fibonacci_assertions(FIB_STEPS);
            let proof = stark
                .prove(
                    &assertions,
                    &TraceContext::new(FIB_STEPS, FIB_STEPS),
                    &[vec![Fr::one()], vec![Fr::one()]],
                    &[],
                )
                .unwrap();
            stark.verify(&assertions, &proof, FIB_STEPS, &[]).unwrap();
            // 512 evaluations fold once to 128
            assert_eq!(proof.ld_proof.components.len(), 1);
            assert_eq!(proof.ld_proof.remainder.len(), 128);
        }
    }

    #[test]
    fn test_fibonacci_eight_steps() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let (r0, r1) = fibonacci_sequence(8);
        assert_eq!(r0[7], Fr::from(610u64));
        assert_eq!(r1[7], Fr::from(987u64));

        let mut assertions = fibonacci_assertions(8);
        for context in [TraceContext::new(8, 1), TraceContext::new(8, 8)] {
            let inputs = if context.round_steps == 1 {
                vec![r0.clone(), r1.clone()]
            } else {
                vec![vec![Fr::one()], vec![Fr::one()]]
            };
            let proof = stark.prove(&assertions, &context, &inputs, &[]).unwrap();
            stark.verify(&assertions, &proof, 8, &[]).unwrap();
            // 32 evaluations are sent as the remainder
            assert!(proof.ld_proof.components.is_empty());
        }

        assertions[2].value = Fr::from(988u64);
        let err = stark
            .prove(&assertions, &TraceContext::new(8, 8), &[vec![Fr::one()], vec![Fr::one()]], &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn test_proof_from_per_step_inputs() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let (r0, r1) = fibonacci_sequence(FIB_STEPS);
        let assertions = fibonacci_assertions(FIB_STEPS);
        let proof = stark
            .prove(&assertions, &TraceContext::new(FIB_STEPS, 1), &[r0, r1], &[])
            .unwrap();
        stark.verify(&assertions, &proof, FIB_STEPS, &[]).unwrap();
    }

    #[test]
    fn test_prover_rejects_false_assertion() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let mut assertions = fibonacci_assertions(FIB_STEPS);
        assertions[3].value += Fr::one();
        let err = stark
            .prove(
                &assertions,
                &TraceContext::new(FIB_STEPS, FIB_STEPS),
                &[vec![Fr::one()], vec![Fr::one()]],
                &[],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StarkError::AssertionMismatch { register: 0, step: 127 }
        ));
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn test_prover_rejects_unsatisfied_constraints() {
        let transition = ExprTransition::<Fr>::new(vec![Expr::r(0) + Expr::lit(1u64)]).unwrap();
        let constraints =
            ExprConstraints::<Fr>::new(vec![Expr::n(0) - (Expr::r(0) + Expr::lit(2u64))]);
        let stark = Stark::new(1, transition, constraints, vec![], &StarkOptions::default()).unwrap();
        let err = stark
            .prove(&[], &TraceContext::new(32, 32), &[vec![Fr::one()]], &[])
            .unwrap_err();
        assert!(matches!(err, StarkError::ConstraintsNotSatisfied));
    }

    #[test]
    fn test_prover_rejects_bad_shapes() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let inputs = [vec![Fr::one()], vec![Fr::one()]];
        let err = stark
            .prove(&[], &TraceContext::new(96, 96), &inputs, &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);

        let err = stark
            .prove(
                &[Assertion::new(2, 0, Fr::one())],
                &TraceContext::new(FIB_STEPS, FIB_STEPS),
                &inputs,
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, StarkError::AssertionRegisterOutOfRange { .. }));
    }

    #[test]
    fn test_verifier_rejects_wrong_assertion() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let assertions = fibonacci_assertions(FIB_STEPS);
        let proof = stark
            .prove(
                &assertions,
                &TraceContext::new(FIB_STEPS, FIB_STEPS),
                &[vec![Fr::one()], vec![Fr::one()]],
                &[],
            )
            .unwrap();

        let mut claimed = assertions.clone();
        claimed[2].value += Fr::one();
        let err = stark.verify(&claimed, &proof, FIB_STEPS, &[]).unwrap_err();
        assert!(matches!(err, StarkError::CombinationMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);

        let err = stark
            .verify(&assertions, &proof, FIB_STEPS * 2, &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
    }

    #[test]
    fn test_verifier_rejects_tampered_proof() {
        let stark = fibonacci_stark(HashAlgorithm::Sha256);
        let assertions = fibonacci_assertions(FIB_STEPS);
        let proof = stark
            .prove(
                &assertions,
                &TraceContext::new(FIB_STEPS, FIB_STEPS),
                &[vec![Fr::one()], vec![Fr::one()]],
                &[],
            )
            .unwrap();

        let mut tampered = proof.clone();
        tampered.ev_proof.values[0][63] ^= 1;
        assert!(matches!(
            stark.verify(&assertions, &tampered, FIB_STEPS, &[]),
            Err(StarkError::MerkleProofInvalid { proof: "execution trace" })
        ));

        let mut tampered = proof.clone();
        tampered.lc_proof.values[0][31] ^= 1;
        assert!(matches!(
            stark.verify(&assertions, &tampered, FIB_STEPS, &[]),
            Err(StarkError::MerkleProofInvalid { proof: "linear combination" })
        ));

        let mut tampered = proof.clone();
        tampered.ld_proof.components[0].poly_proof.values[1][31] ^= 1;
        let err = stark
            .verify(&assertions, &tampered, FIB_STEPS, &[])
            .unwrap_err();
        assert_eq!(err.depth(), Some(0));
    }

    #[test]
    fn test_proof_serialization() {
        let stark = fibonacci_stark(HashAlgorithm::Blake3);
        let assertions = fibonacci_assertions(FIB_STEPS);
        let proof = stark
            .prove(
                &assertions,
                &TraceContext::new(FIB_STEPS, FIB_STEPS),
                &[vec![Fr::one()], vec![Fr::one()]],
                &[],
            )
            .unwrap();

        let size = stark.size_of(&proof).unwrap();
        let bytes = stark.serialize(&proof).unwrap();
        assert_eq!(bytes.len(), size.total);
        assert_eq!(size.total, size.ev_proof + size.ld_proof.total);

        let parsed = stark.parse(&bytes).unwrap();
        assert_eq!(parsed, proof);
        stark.verify(&assertions, &parsed, FIB_STEPS, &[]).unwrap();

        assert!(stark.parse(&bytes[..bytes.len() - 5]).is_err());
    }

    #[test]
    fn test_mimc_proof() {
        let stark = mimc_stark();
        assert_eq!(stark.extension_factor(), 8);

        let constants = mimc_constants();
        let register = CyclicRegister::new(constants.clone(), MIMC_STEPS, 8).unwrap();
        let readonly: [&dyn ReadonlyRegister<Fr>; 1] = [&register];

        let seed = Fr::from(3u64);
        let assertions = vec![
            Assertion::new(0, 0, seed),
            Assertion::new(0, MIMC_STEPS - 1, mimc_result(seed, &constants, MIMC_STEPS)),
        ];
        let proof = stark
            .prove(
                &assertions,
                &TraceContext::new(MIMC_STEPS, MIMC_STEPS),
                &[vec![seed]],
                &readonly,
            )
            .unwrap();
        stark
            .verify(&assertions, &proof, MIMC_STEPS, &readonly)
            .unwrap();

        // different round constants describe a different computation
        let mut other = constants;
        other[5] += Fr::one();
        let other = CyclicRegister::new(other, MIMC_STEPS, 8).unwrap();
        let readonly: [&dyn ReadonlyRegister<Fr>; 1] = [&other];
        let err = stark
            .verify(&assertions, &proof, MIMC_STEPS, &readonly)
            .unwrap_err();
        assert!(matches!(err, StarkError::CombinationMismatch { .. }));
    }
}
