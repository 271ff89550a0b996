//! STARK options and their validation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StarkError};
use crate::hash::HashAlgorithm;

pub const MAX_REGISTER_COUNT: usize = 64;
pub const MAX_CONSTANT_COUNT: usize = 64;
pub const MAX_CONSTRAINT_COUNT: usize = 1024;
pub const MAX_CONSTRAINT_DEGREE: usize = 16;
pub const MAX_EXTENSION_FACTOR: usize = 32;
pub const MAX_EXE_QUERY_COUNT: usize = 128;
pub const MAX_FRI_QUERY_COUNT: usize = 64;

pub const DEFAULT_EXE_QUERY_COUNT: usize = 80;
pub const DEFAULT_FRI_QUERY_COUNT: usize = 40;

/// User-facing options. Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarkOptions {
    /// Blowup of the evaluation domain over the trace domain. Derived from the
    /// constraint degree when absent.
    pub extension_factor: Option<usize>,
    /// Number of execution trace spot checks.
    pub exe_query_count: usize,
    /// Number of spot checks per FRI layer.
    pub fri_query_count: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for StarkOptions {
    fn default() -> Self {
        Self {
            extension_factor: None,
            exe_query_count: DEFAULT_EXE_QUERY_COUNT,
            fri_query_count: DEFAULT_FRI_QUERY_COUNT,
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

/// Validated configuration of a STARK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarkConfig {
    pub register_count: usize,
    pub constant_count: usize,
    pub constraint_count: usize,
    pub constraint_degree: usize,
    pub extension_factor: usize,
    pub exe_query_count: usize,
    pub fri_query_count: usize,
    pub hash_algorithm: HashAlgorithm,
}

impl StarkConfig {
    pub fn new(
        options: &StarkOptions,
        register_count: usize,
        constant_count: usize,
        constraint_count: usize,
        constraint_degree: usize,
    ) -> Result<Self> {
        if register_count == 0 || register_count > MAX_REGISTER_COUNT {
            return Err(invalid(format!(
                "number of state registers must be between 1 and {MAX_REGISTER_COUNT}"
            )));
        }
        if constant_count > MAX_CONSTANT_COUNT {
            return Err(invalid(format!(
                "number of global constants cannot exceed {MAX_CONSTANT_COUNT}"
            )));
        }
        if constraint_count == 0 || constraint_count > MAX_CONSTRAINT_COUNT {
            return Err(invalid(format!(
                "number of transition constraints must be between 1 and {MAX_CONSTRAINT_COUNT}"
            )));
        }
        if constraint_degree == 0 || constraint_degree > MAX_CONSTRAINT_DEGREE {
            return Err(invalid(format!(
                "transition constraint degree must be between 1 and {MAX_CONSTRAINT_DEGREE}"
            )));
        }

        let extension_factor = match options.extension_factor {
            None => (2 * constraint_degree).next_power_of_two(),
            Some(factor) => {
                if !(2..=MAX_EXTENSION_FACTOR).contains(&factor) {
                    return Err(invalid(format!(
                        "extension factor must be between 2 and {MAX_EXTENSION_FACTOR}"
                    )));
                }
                if !factor.is_power_of_two() {
                    return Err(invalid("extension factor must be a power of 2".into()));
                }
                if factor < 2 * constraint_degree {
                    return Err(invalid(
                        "extension factor must be at least 2x greater than the transition constraint degree"
                            .into(),
                    ));
                }
                factor
            }
        };

        if options.exe_query_count == 0 || options.exe_query_count > MAX_EXE_QUERY_COUNT {
            return Err(invalid(format!(
                "execution query count must be between 1 and {MAX_EXE_QUERY_COUNT}"
            )));
        }
        if options.fri_query_count == 0 || options.fri_query_count > MAX_FRI_QUERY_COUNT {
            return Err(invalid(format!(
                "FRI query count must be between 1 and {MAX_FRI_QUERY_COUNT}"
            )));
        }

        Ok(Self {
            register_count,
            constant_count,
            constraint_count,
            constraint_degree,
            extension_factor,
            exe_query_count: options.exe_query_count,
            fri_query_count: options.fri_query_count,
            hash_algorithm: options.hash_algorithm,
        })
    }
}

fn invalid(message: String) -> StarkError {
    StarkError::InvalidConfig(message)
}
