//! FRI low-degree proofs with folding by four.
//!
//! The prover splits a committed vector of evaluations into rows of four
//! values whose x-coordinates share the same fourth power, interpolates a
//! cubic through each row and evaluates all of them at a challenge derived
//! from the current Merkle root. The resulting column is a quarter of the
//! length, is committed, and becomes the input of the next depth. Once a
//! column has at most [`MAX_REMAINDER_LENGTH`] values it is sent in full.
//!
//! The verifier spot-checks every depth at positions derived from the column
//! root and checks the remainder directly.

use ark_ff::PrimeField;
use tracing::{debug, instrument};

use crate::error::{Result, StarkError};
use crate::hash::{Digest, HashAlgorithm};
use crate::math::domain::{power_series, root_of_unity_degree};
use crate::math::field::{decode_elements, encode_elements};
use crate::math::polynomial::{Polynomial, eval_quartic, eval_quartic_batch, interpolate_quartic_batch};
use crate::merkle::{BatchMerkleProof, MerkleTree, verify_batch};
use crate::transcript::{QueryIndexGenerator, prng};

/// Columns of at most this many values are not folded any further.
pub const MAX_REMAINDER_LENGTH: usize = 256;

/// Openings for one folding depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriComponent {
    /// Commitment to the folded column.
    pub column_root: Digest,
    /// Folded column values at the sampled positions.
    pub column_proof: BatchMerkleProof,
    /// The four parent values behind every sampled position.
    pub poly_proof: BatchMerkleProof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowDegreeProof {
    /// Ordered from the outermost depth inwards.
    pub components: Vec<FriComponent>,
    /// Encoded values of the last column.
    pub remainder: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct LowDegreeProver {
    index_generator: QueryIndexGenerator,
    hash: HashAlgorithm,
}

impl LowDegreeProver {
    pub fn new(index_generator: QueryIndexGenerator, hash: HashAlgorithm) -> Self {
        Self {
            index_generator,
            hash,
        }
    }

    /// Proves that `values`, committed in `l_tree` and evaluated over
    /// `domain`, lie on a polynomial of degree below `max_degree_plus1`.
    ///
    /// # Arguments
    ///
    /// * `l_tree` - Merkle tree whose leaves are the encoded `values`
    /// * `values` - evaluations, one per element of `domain`
    /// * `domain` - power series of a root of unity of order `values.len()`
    /// * `max_degree_plus1` - claimed degree bound
    ///
    /// # Errors
    ///
    /// Fails when the vector is not of low degree or the shapes are
    /// inconsistent; no partial proof is returned.
    #[instrument(skip_all, fields(len = values.len(), max_degree_plus1 = max_degree_plus1))]
    pub fn prove<F: PrimeField>(
        &self,
        l_tree: &MerkleTree,
        values: &[F],
        domain: &[F],
        max_degree_plus1: usize,
    ) -> Result<LowDegreeProof> {
        if values.len() != domain.len() || l_tree.leaves().len() != values.len() {
            return Err(StarkError::InvalidInput(format!(
                "{} values cannot be proved over a domain of {} with a tree of {} leaves",
                values.len(),
                domain.len(),
                l_tree.leaves().len()
            )));
        }

        // layers[d] is the column produced at depth d together with its tree
        let mut layers: Vec<(MerkleTree, Vec<F>)> = Vec::new();
        let mut max_degree_plus1 = max_degree_plus1;
        loop {
            let (tree, column) = match layers.last() {
                Some((tree, column)) => (tree, column.as_slice()),
                None => (l_tree, values),
            };
            if column.len() <= MAX_REMAINDER_LENGTH {
                break;
            }
            let depth = layers.len();
            let folded = self.fold(tree.root(), column, domain, depth);
            let c_tree = MerkleTree::new(encode_elements(&folded), self.hash)?;
            debug!(depth, column_length = folded.len(), "committed folded column");
            layers.push((c_tree, folded));
            max_degree_plus1 /= 4;
        }

        let depth = layers.len();
        let (last_tree, last_column) = match layers.last() {
            Some((tree, column)) => (tree, column.as_slice()),
            None => (l_tree, values),
        };
        let root = domain.get(1).copied().unwrap_or_else(F::one).pow([4u64.pow(depth as u32)]);
        self.verify_remainder(last_column, max_degree_plus1, root)?;
        let remainder = last_tree.leaves().to_vec();

        let mut components = Vec::with_capacity(depth);
        for (d, (c_tree, column)) in layers.iter().enumerate() {
            let parent = if d == 0 { l_tree } else { &layers[d - 1].0 };
            let positions = self
                .index_generator
                .get_fri_indexes(c_tree.root(), column.len());
            let poly_positions = poly_positions(&positions, column.len());
            components.push(FriComponent {
                column_root: *c_tree.root(),
                column_proof: c_tree.prove_batch(&positions)?,
                poly_proof: parent.prove_batch(&poly_positions)?,
            });
        }

        debug!(components = components.len(), remainder = remainder.len(), "low degree proof built");
        Ok(LowDegreeProof {
            components,
            remainder,
        })
    }

    /// Checks a proof produced by [`LowDegreeProver::prove`] against the
    /// commitment `l_root` of values over the powers of `root_of_unity`.
    #[instrument(skip_all, fields(components = proof.components.len(), max_degree_plus1 = max_degree_plus1))]
    pub fn verify<F: PrimeField>(
        &self,
        l_root: &Digest,
        max_degree_plus1: usize,
        root_of_unity: F,
        proof: &LowDegreeProof,
    ) -> Result<()> {
        let mut rou_degree = root_of_unity_degree(root_of_unity).ok_or_else(|| {
            StarkError::InvalidInput("root of unity does not have a power-of-two order".into())
        })?;

        let quartic_roots = [
            F::one(),
            root_of_unity.pow([(rou_degree / 4) as u64]),
            root_of_unity.pow([(rou_degree / 2) as u64]),
            root_of_unity.pow([(rou_degree * 3 / 4) as u64]),
        ];

        let mut l_root = *l_root;
        let mut root_of_unity = root_of_unity;
        let mut max_degree_plus1 = max_degree_plus1;

        for (depth, component) in proof.components.iter().enumerate() {
            let column_length = rou_degree / 4;
            if column_length == 0 {
                return Err(StarkError::MalformedProof(format!(
                    "proof has more components than the domain can be folded ({depth})"
                )));
            }

            let positions = self
                .index_generator
                .get_fri_indexes(&component.column_root, column_length);
            if !verify_batch(
                &component.column_root,
                column_length,
                &positions,
                &component.column_proof,
                self.hash,
            ) {
                return Err(StarkError::ColumnProofInvalid { depth });
            }

            let poly_positions = poly_positions(&positions, column_length);
            if !verify_batch(&l_root, rou_degree, &poly_positions, &component.poly_proof, self.hash) {
                return Err(StarkError::PolyProofInvalid { depth });
            }

            let poly_values: Vec<F> = decode_elements(&component.poly_proof.values)?;
            let column_values: Vec<F> = decode_elements(&component.column_proof.values)?;

            let mut xs = Vec::with_capacity(positions.len());
            let mut ys = Vec::with_capacity(positions.len());
            for (i, &position) in positions.iter().enumerate() {
                let xe = root_of_unity.pow([position as u64]);
                xs.push(quartic_roots.map(|root| root * xe));
                ys.push([
                    poly_values[i * 4],
                    poly_values[i * 4 + 1],
                    poly_values[i * 4 + 2],
                    poly_values[i * 4 + 3],
                ]);
            }

            let special_x: F = prng(&l_root, self.hash);
            let polys = interpolate_quartic_batch(&xs, &ys);
            for (poly, value) in polys.iter().zip(&column_values) {
                if eval_quartic(poly, special_x) != *value {
                    return Err(StarkError::FoldingMismatch { depth });
                }
            }

            l_root = component.column_root;
            root_of_unity = root_of_unity.pow([4u64]);
            max_degree_plus1 /= 4;
            rou_degree /= 4;
        }

        if max_degree_plus1 > proof.remainder.len() {
            return Err(StarkError::RemainderDegreeTooLarge {
                max_degree_plus1,
                available: proof.remainder.len(),
            });
        }
        if proof.remainder.len() != rou_degree {
            return Err(StarkError::RemainderLengthMismatch {
                expected: rou_degree,
                actual: proof.remainder.len(),
            });
        }

        let c_tree = MerkleTree::new(proof.remainder.clone(), self.hash)?;
        if *c_tree.root() != l_root {
            return Err(StarkError::RemainderRootMismatch);
        }

        let remainder: Vec<F> = decode_elements(&proof.remainder)?;
        self.verify_remainder(&remainder, max_degree_plus1, root_of_unity)?;
        debug!("low degree proof verified");
        Ok(())
    }

    /// Checks that `remainder`, evaluated over the powers of `root`, is a
    /// polynomial of degree below `max_degree_plus1`. Positions that are
    /// multiples of the extension factor are ignored.
    pub fn verify_remainder<F: PrimeField>(
        &self,
        remainder: &[F],
        max_degree_plus1: usize,
        root: F,
    ) -> Result<()> {
        let positions = self.index_generator.remainder_positions(remainder.len());
        if max_degree_plus1 > positions.len() {
            return Err(StarkError::RemainderDegreeTooLarge {
                max_degree_plus1,
                available: positions.len(),
            });
        }

        let domain = power_series(root, remainder.len());
        let (known, rest) = positions.split_at(max_degree_plus1);
        let xs: Vec<F> = known.iter().map(|&p| domain[p]).collect();
        let ys: Vec<F> = known.iter().map(|&p| remainder[p]).collect();
        let poly = Polynomial::lagrange_interpolate(&xs, &ys);

        if rest.iter().any(|&p| poly.evaluate(domain[p]) != remainder[p]) {
            return Err(StarkError::RemainderNotLowDegree {
                degree: max_degree_plus1.saturating_sub(1),
            });
        }
        Ok(())
    }

    /// Folds `values` at `depth` into a column a quarter of the length.
    fn fold<F: PrimeField>(&self, root: &Digest, values: &[F], domain: &[F], depth: usize) -> Vec<F> {
        let column_length = values.len() / 4;
        let stride = 4usize.pow(depth as u32);

        let mut xs = Vec::with_capacity(column_length);
        let mut ys = Vec::with_capacity(column_length);
        for i in 0..column_length {
            let row = [i, i + column_length, i + 2 * column_length, i + 3 * column_length];
            xs.push(row.map(|p| domain[p * stride]));
            ys.push(row.map(|p| values[p]));
        }

        let polys = interpolate_quartic_batch(&xs, &ys);
        let special_x: F = prng(root, self.hash);
        eval_quartic_batch(&polys, special_x)
    }
}

/// The four parent positions behind every column position.
fn poly_positions(positions: &[usize], column_length: usize) -> Vec<usize> {
    positions
        .iter()
        .flat_map(|&p| (0..4).map(move |k| p + k * column_length))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::domain::get_domain;
    use ark_bls12_381::Fr;
    use ark_ff::UniformRand;
    use ark_poly::EvaluationDomain;
    use rand::thread_rng;

    fn prover(extension_factor: usize) -> LowDegreeProver {
        let hash = HashAlgorithm::Sha256;
        LowDegreeProver::new(QueryIndexGenerator::new(extension_factor, 80, 40, hash), hash)
    }

    fn evaluations(degree_bound: usize, size: usize) -> (Vec<Fr>, Vec<Fr>) {
        let mut rng = thread_rng();
        let coefficients: Vec<Fr> = (0..degree_bound).map(|_| Fr::rand(&mut rng)).collect();
        let domain = get_domain::<Fr>(size).unwrap();
        (domain.elements().collect(), domain.fft(&coefficients))
    }

    #[test]
    fn poly_positions_are_grouped_per_query() {
        assert_eq!(poly_positions(&[1, 5], 8), vec![1, 9, 17, 25, 5, 13, 21, 29]);
    }

    #[test]
    fn short_vector_is_sent_as_remainder() {
        let fri = prover(4);
        let (domain, values) = evaluations(16, 64);
        let tree = MerkleTree::new(encode_elements(&values), HashAlgorithm::Sha256).unwrap();
        let proof = fri.prove(&tree, &values, &domain, 16).unwrap();
        assert!(proof.components.is_empty());
        assert_eq!(proof.remainder, tree.leaves().to_vec());
        fri.verify(tree.root(), 16, domain[1], &proof).unwrap();
    }

    #[test]
    fn remainder_check_rejects_high_degree() {
        let fri = prover(4);
        let (domain, values) = evaluations(32, 64);
        assert!(matches!(
            fri.verify_remainder(&values, 16, domain[1]),
            Err(StarkError::RemainderNotLowDegree { degree: 15 })
        ));
        fri.verify_remainder(&values, 32, domain[1]).unwrap();
    }

    #[test]
    fn remainder_degree_bound_limited_by_usable_positions() {
        let fri = prover(4);
        let (domain, values) = evaluations(4, 16);
        // 12 of 16 positions are usable
        let err = fri.verify_remainder(&values, 13, domain[1]).unwrap_err();
        assert!(matches!(
            err,
            StarkError::RemainderDegreeTooLarge { max_degree_plus1: 13, available: 12 }
        ));
    }

    #[test]
    fn prover_rejects_high_degree_values() {
        let fri = prover(4);
        let (domain, values) = evaluations(512, 1024);
        let tree = MerkleTree::new(encode_elements(&values), HashAlgorithm::Sha256).unwrap();
        let err = fri.prove(&tree, &values, &domain, 256).unwrap_err();
        assert!(matches!(err, StarkError::RemainderNotLowDegree { .. }));
    }

    #[test]
    fn verifier_rejects_unrelated_root_of_unity() {
        let fri = prover(4);
        let (domain, values) = evaluations(16, 64);
        let tree = MerkleTree::new(encode_elements(&values), HashAlgorithm::Sha256).unwrap();
        let proof = fri.prove(&tree, &values, &domain, 16).unwrap();
        let err = fri.verify(tree.root(), 16, Fr::from(5u64), &proof).unwrap_err();
        assert!(matches!(err, StarkError::InvalidInput(_)));
    }
}
