//! Readonly registers: public per-step values such as round constants.

use ark_ff::FftField;
use ark_poly::EvaluationDomain;

use crate::error::{Result, StarkError};
use crate::math::domain::get_domain;

/// Which index space a readonly lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// `index` is a step of the execution trace.
    Exact,
    /// `index` is a position in the extended evaluation domain.
    Extended,
}

pub trait ReadonlyRegister<F>: Send + Sync {
    fn value_at(&self, index: usize, mode: LookupMode) -> F;
}

/// Repeats a power-of-two pattern of values for the whole execution.
///
/// In the extended domain the register takes the values of the polynomial
/// interpolating the pattern, so it has degree below the trace length.
#[derive(Debug, Clone)]
pub struct CyclicRegister<F> {
    values: Vec<F>,
    extended: Vec<F>,
}

impl<F: FftField> CyclicRegister<F> {
    pub fn new(values: Vec<F>, total_steps: usize, extension_factor: usize) -> Result<Self> {
        let period = values.len();
        if period == 0 || !period.is_power_of_two() {
            return Err(StarkError::InvalidInput(format!(
                "readonly register pattern length {period} is not a power of two"
            )));
        }
        if total_steps % period != 0 {
            return Err(StarkError::InvalidInput(format!(
                "readonly register pattern length {period} does not divide {total_steps} steps"
            )));
        }

        // k(x) = p(x^(steps/period)); over the extended domain this repeats
        // with period `period * extension_factor`.
        let pattern_domain = get_domain::<F>(period)?;
        let cycle_domain = get_domain::<F>(period * extension_factor)?;
        let coefficients = pattern_domain.ifft(&values);
        let extended = cycle_domain.fft(&coefficients);

        Ok(Self { values, extended })
    }
}

impl<F: FftField> ReadonlyRegister<F> for CyclicRegister<F> {
    fn value_at(&self, index: usize, mode: LookupMode) -> F {
        match mode {
            LookupMode::Exact => self.values[index % self.values.len()],
            LookupMode::Extended => self.extended[index % self.extended.len()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::domain::{extend, get_extended_domain};
    use ark_bls12_381::Fr;

    #[test]
    fn exact_lookup_cycles() {
        let values: Vec<Fr> = (1..=4u64).map(Fr::from).collect();
        let register = CyclicRegister::new(values.clone(), 16, 8).unwrap();
        for step in 0..16 {
            assert_eq!(register.value_at(step, LookupMode::Exact), values[step % 4]);
        }
    }

    #[test]
    fn extended_lookup_matches_full_extension() {
        let steps = 16;
        let extension_factor = 4;
        let values: Vec<Fr> = [3u64, 1, 4, 1].iter().map(|&v| Fr::from(v)).collect();
        let register = CyclicRegister::new(values.clone(), steps, extension_factor).unwrap();

        let domain = get_domain::<Fr>(steps).unwrap();
        let extended = get_extended_domain::<Fr>(steps, extension_factor).unwrap();
        let column: Vec<Fr> = (0..steps).map(|s| values[s % 4]).collect();
        let (_, evaluations) = extend(&column, &domain, &extended);

        for (i, value) in evaluations.iter().enumerate() {
            assert_eq!(register.value_at(i, LookupMode::Extended), *value);
        }
    }

    #[test]
    fn rejects_bad_patterns() {
        let values: Vec<Fr> = (0..3u64).map(Fr::from).collect();
        assert!(CyclicRegister::new(values, 12, 4).is_err());
        let values: Vec<Fr> = (0..8u64).map(Fr::from).collect();
        assert!(CyclicRegister::new(values, 4, 4).is_err());
    }
}
