use ark_ff::{FftField, Field};
use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};

use crate::error::{Result, StarkError};

pub fn get_domain<F: FftField>(domain_size: usize) -> Result<GeneralEvaluationDomain<F>> {
    if !domain_size.is_power_of_two() {
        return Err(StarkError::InvalidInput(format!(
            "domain size {domain_size} is not a power of two"
        )));
    }
    GeneralEvaluationDomain::<F>::new(domain_size).ok_or_else(|| {
        StarkError::InvalidInput(format!("field has no domain of size {domain_size}"))
    })
}

pub fn get_extended_domain<F: FftField>(
    domain_size: usize,
    blowup_factor: usize,
) -> Result<GeneralEvaluationDomain<F>> {
    get_domain(domain_size * blowup_factor)
}

/// `[1, root, root^2, ..., root^(length-1)]`.
pub fn power_series<F: Field>(root: F, length: usize) -> Vec<F> {
    let mut series = Vec::with_capacity(length);
    let mut current = F::one();
    for _ in 0..length {
        series.push(current);
        current *= root;
    }
    series
}

/// Multiplicative order of a root of unity of power-of-two order, found by
/// repeated squaring. Returns `None` if `root` is not such a root.
pub fn root_of_unity_degree<F: Field>(root: F) -> Option<usize> {
    let mut degree = 1usize;
    let mut current = root;
    while !current.is_one() {
        degree = degree.checked_mul(2)?;
        if degree > 1 << 40 {
            return None;
        }
        current.square_in_place();
    }
    Some(degree)
}

/// Values of a polynomial given on `domain` re-evaluated over `extended`.
/// Returns `(coefficients, extended evaluations)`.
pub fn extend<F: FftField>(
    values: &[F],
    domain: &GeneralEvaluationDomain<F>,
    extended: &GeneralEvaluationDomain<F>,
) -> (Vec<F>, Vec<F>) {
    let coefficients = domain.ifft(values);
    let evaluations = extended.fft(&coefficients);
    (coefficients, evaluations)
}
