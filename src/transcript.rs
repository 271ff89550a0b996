use std::collections::HashSet;

use ark_ff::PrimeField;

use crate::config::StarkConfig;
use crate::hash::{Digest, HashAlgorithm};

/// Derives a field element from already-committed bytes.
pub fn prng<F: PrimeField>(seed: &[u8], hash: HashAlgorithm) -> F {
    F::from_le_bytes_mod_order(&hash.digest(seed))
}

/// Derives `count` field elements from already-committed bytes.
pub fn prng_sequence<F: PrimeField>(seed: &[u8], count: usize, hash: HashAlgorithm) -> Vec<F> {
    let mut buf = Vec::with_capacity(seed.len() + 8);
    (0..count as u64)
        .map(|counter| {
            buf.clear();
            buf.extend_from_slice(seed);
            buf.extend_from_slice(&counter.to_le_bytes());
            F::from_le_bytes_mod_order(&hash.digest(&buf))
        })
        .collect()
}

/// Derives up to `count` distinct positions in `[0, domain_size)` from `seed`.
///
/// When `skip_multiples_of` is set, positions divisible by it are never
/// returned. `count` is clamped to the number of positions that can be
/// returned, so the call always terminates. The result depends only on the
/// arguments.
pub fn get_indexes(
    seed: &[u8],
    domain_size: usize,
    count: usize,
    skip_multiples_of: Option<usize>,
    hash: HashAlgorithm,
) -> Vec<usize> {
    let skip = skip_multiples_of.filter(|&m| m > 1);
    let available = match skip {
        Some(m) => domain_size - domain_size.div_ceil(m),
        None => domain_size,
    };
    let count = count.min(available);

    let mut indexes = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    let mut buf = Vec::with_capacity(seed.len() + 8);
    let mut counter = 0u64;
    while indexes.len() < count {
        buf.clear();
        buf.extend_from_slice(seed);
        buf.extend_from_slice(&counter.to_le_bytes());
        counter += 1;

        let digest = hash.digest(&buf);
        for chunk in digest.chunks_exact(8) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            let index = (u64::from_le_bytes(word) % domain_size as u64) as usize;
            if skip.is_some_and(|m| index % m == 0) {
                continue;
            }
            if seen.insert(index) {
                indexes.push(index);
                if indexes.len() == count {
                    break;
                }
            }
        }
    }
    indexes
}

/// Samples the spot-check positions used by the prover and the verifier.
#[derive(Debug, Clone)]
pub struct QueryIndexGenerator {
    extension_factor: usize,
    exe_query_count: usize,
    fri_query_count: usize,
    hash: HashAlgorithm,
}

impl QueryIndexGenerator {
    pub fn new(
        extension_factor: usize,
        exe_query_count: usize,
        fri_query_count: usize,
        hash: HashAlgorithm,
    ) -> Self {
        Self {
            extension_factor,
            exe_query_count,
            fri_query_count,
            hash,
        }
    }

    pub fn from_config(config: &StarkConfig) -> Self {
        Self::new(
            config.extension_factor,
            config.exe_query_count,
            config.fri_query_count,
            config.hash_algorithm,
        )
    }

    pub fn extension_factor(&self) -> usize {
        self.extension_factor
    }

    /// Positions in the extended evaluation domain, excluding points that lie
    /// on the trace domain.
    pub fn get_exe_indexes(&self, seed: &Digest, domain_size: usize) -> Vec<usize> {
        get_indexes(
            seed,
            domain_size,
            self.exe_query_count,
            Some(self.extension_factor),
            self.hash,
        )
    }

    /// Positions in a folded FRI column.
    pub fn get_fri_indexes(&self, seed: &Digest, column_length: usize) -> Vec<usize> {
        get_indexes(seed, column_length, self.fri_query_count, None, self.hash)
    }

    /// Remainder positions usable by the final low-degree check.
    pub fn remainder_positions(&self, length: usize) -> Vec<usize> {
        if self.extension_factor <= 1 {
            return (0..length).collect();
        }
        (0..length)
            .filter(|i| i % self.extension_factor != 0)
            .collect()
    }
}
