//! Execution trace construction and boundary assertions.

use ark_ff::Field;
use tracing::{debug, instrument};

use crate::error::{Result, StarkError};
use crate::program::evaluator::TransitionEvaluator;
use crate::program::registers::{LookupMode, ReadonlyRegister};

/// Register values over time: `registers[r][s]` is register `r` at step `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTrace<F> {
    registers: Vec<Vec<F>>,
}

impl<F: Field> ExecutionTrace<F> {
    /// Wraps already computed register columns. All columns must have the
    /// same non-zero length.
    pub fn from_registers(registers: Vec<Vec<F>>) -> Result<Self> {
        let steps = registers.first().map(Vec::len).unwrap_or(0);
        if steps == 0 {
            return Err(StarkError::InvalidInput(
                "execution trace must have at least one register and one step".into(),
            ));
        }
        if registers.iter().any(|column| column.len() != steps) {
            return Err(StarkError::InvalidInput(
                "all trace registers must have the same length".into(),
            ));
        }
        Ok(Self { registers })
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn steps(&self) -> usize {
        self.registers[0].len()
    }

    pub fn register(&self, index: usize) -> &[F] {
        &self.registers[index]
    }

    pub fn registers(&self) -> &[Vec<F>] {
        &self.registers
    }

    pub fn value(&self, register: usize, step: usize) -> Option<F> {
        self.registers.get(register)?.get(step).copied()
    }

    /// Values of all registers at `step`.
    pub fn row(&self, step: usize) -> Vec<F> {
        self.registers.iter().map(|column| column[step]).collect()
    }

    pub fn into_registers(self) -> Vec<Vec<F>> {
        self.registers
    }
}

/// Declares that `register` holds `value` at `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion<F> {
    pub register: usize,
    pub step: usize,
    pub value: F,
}

impl<F> Assertion<F> {
    pub fn new(register: usize, step: usize, value: F) -> Self {
        Self {
            register,
            step,
            value,
        }
    }
}

/// Shape of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    pub total_steps: usize,
    /// Inputs are injected every `round_steps` steps.
    pub round_steps: usize,
}

impl TraceContext {
    pub fn new(total_steps: usize, round_steps: usize) -> Self {
        Self {
            total_steps,
            round_steps,
        }
    }

    pub fn round_count(&self) -> usize {
        self.total_steps / self.round_steps
    }
}

/// Runs a transition function over per-round inputs.
pub struct TraceBuilder<'a, F> {
    register_count: usize,
    transition: &'a dyn TransitionEvaluator<F>,
    constants: &'a [F],
}

impl<'a, F: Field> TraceBuilder<'a, F> {
    pub fn new(
        register_count: usize,
        transition: &'a dyn TransitionEvaluator<F>,
        constants: &'a [F],
    ) -> Self {
        Self {
            register_count,
            transition,
            constants,
        }
    }

    /// Builds the trace. `inputs[r]` holds one value per round; step 0 and
    /// every step at a round boundary take their values from it, every other
    /// step is the transition of the previous one.
    #[instrument(skip_all, fields(steps = context.total_steps, round = context.round_steps))]
    pub fn compute(
        &self,
        context: &TraceContext,
        inputs: &[Vec<F>],
        readonly: &[&dyn ReadonlyRegister<F>],
    ) -> Result<ExecutionTrace<F>> {
        self.check_inputs(context, inputs)?;

        let steps = context.total_steps;
        let round = context.round_steps;
        let mut registers: Vec<Vec<F>> = inputs
            .iter()
            .map(|input| {
                let mut column = Vec::with_capacity(steps);
                column.push(input[0]);
                column
            })
            .collect();

        let mut current: Vec<F> = inputs.iter().map(|input| input[0]).collect();
        let mut next = vec![F::zero(); self.register_count];
        let mut k = vec![F::zero(); readonly.len()];

        for step in 0..steps - 1 {
            for (slot, register) in k.iter_mut().zip(readonly) {
                *slot = register.value_at(step, LookupMode::Exact);
            }
            self.transition
                .apply(&current, &k, self.constants, &mut next)
                .map_err(|source| StarkError::TraceGeneration { step, source })?;

            let boundary = (step + 1) % round == 0;
            for (r, column) in registers.iter_mut().enumerate() {
                let value = if boundary {
                    inputs[r][(step + 1) / round]
                } else {
                    next[r]
                };
                column.push(value);
                current[r] = value;
            }
        }

        debug!(registers = self.register_count, "execution trace built");
        ExecutionTrace::from_registers(registers)
    }

    fn check_inputs(&self, context: &TraceContext, inputs: &[Vec<F>]) -> Result<()> {
        if context.total_steps == 0 || context.round_steps == 0 {
            return Err(StarkError::InvalidInput(
                "total steps and round steps must be greater than 0".into(),
            ));
        }
        if context.total_steps % context.round_steps != 0 {
            return Err(StarkError::InvalidInput(format!(
                "total steps ({}) must be a multiple of round steps ({})",
                context.total_steps, context.round_steps
            )));
        }
        if inputs.len() != self.register_count {
            return Err(StarkError::InvalidInput(format!(
                "expected inputs for {} registers, got {}",
                self.register_count,
                inputs.len()
            )));
        }
        let rounds = context.round_count();
        if let Some(r) = inputs.iter().position(|input| input.len() != rounds) {
            return Err(StarkError::InvalidInput(format!(
                "inputs for register {r} must have {rounds} values, got {}",
                inputs[r].len()
            )));
        }
        Ok(())
    }
}

/// Checks every assertion against `trace`.
///
/// Coordinates are bounds-checked first; a value mismatch is reported as
/// [`StarkError::AssertionMismatch`].
pub fn validate_assertions<F: Field>(
    trace: &ExecutionTrace<F>,
    assertions: &[Assertion<F>],
) -> Result<()> {
    let register_count = trace.register_count();
    let steps = trace.steps();
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
        if trace.registers[assertion.register][assertion.step] != assertion.value {
            return Err(StarkError::AssertionMismatch {
                register: assertion.register,
                step: assertion.step,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::program::evaluator::EvaluatorError;
    use crate::program::registers::CyclicRegister;
    use ark_bls12_381::Fr;

    fn fibonacci(
        current: &[Fr],
        _k: &[Fr],
        _c: &[Fr],
        next: &mut [Fr],
    ) -> core::result::Result<(), EvaluatorError> {
        next[0] = current[0] + current[1];
        next[1] = current[1] + next[0];
        Ok(())
    }

    fn fib_trace() -> ExecutionTrace<Fr> {
        let builder = TraceBuilder::<Fr>::new(2, &fibonacci, &[]);
        builder
            .compute(
                &TraceContext::new(8, 8),
                &[vec![Fr::from(1u64)], vec![Fr::from(1u64)]],
                &[],
            )
            .unwrap()
    }

    #[test]
    fn computes_single_round() {
        let trace = fib_trace();
        assert_eq!(trace.steps(), 8);
        assert_eq!(trace.row(1), vec![Fr::from(2u64), Fr::from(3u64)]);
        assert_eq!(trace.value(0, 7), Some(Fr::from(610u64)));
        assert_eq!(trace.value(1, 7), Some(Fr::from(987u64)));
        assert_eq!(trace.value(2, 7), None);
    }

    #[test]
    fn round_boundaries_reseed_registers() {
        let add_one = |current: &[Fr], _: &[Fr], _: &[Fr], next: &mut [Fr]| -> core::result::Result<(), EvaluatorError> {
            next[0] = current[0] + Fr::from(1u64);
            Ok(())
        };
        let builder = TraceBuilder::<Fr>::new(1, &add_one, &[]);
        let inputs = vec![vec![Fr::from(10u64), Fr::from(20u64)]];
        let trace = builder
            .compute(&TraceContext::new(8, 4), &inputs, &[])
            .unwrap();
        let expected: Vec<Fr> = [10u64, 11, 12, 13, 20, 21, 22, 23]
            .iter()
            .map(|&v| Fr::from(v))
            .collect();
        assert_eq!(trace.register(0), expected.as_slice());
    }

    #[test]
    fn readonly_values_use_exact_steps() {
        let add_k = |current: &[Fr], k: &[Fr], _: &[Fr], next: &mut [Fr]| -> core::result::Result<(), EvaluatorError> {
            next[0] = current[0] + k[0];
            Ok(())
        };
        let pattern: Vec<Fr> = [1u64, 2].iter().map(|&v| Fr::from(v)).collect();
        let register = CyclicRegister::new(pattern, 4, 2).unwrap();
        let builder = TraceBuilder::<Fr>::new(1, &add_k, &[]);
        let trace = builder
            .compute(&TraceContext::new(4, 4), &[vec![Fr::from(0u64)]], &[&register])
            .unwrap();
        let expected: Vec<Fr> = [0u64, 1, 3, 4].iter().map(|&v| Fr::from(v)).collect();
        assert_eq!(trace.register(0), expected.as_slice());
    }

    #[test]
    fn evaluator_failure_is_wrapped() {
        let failing = |_: &[Fr], _: &[Fr], _: &[Fr], _: &mut [Fr]| -> core::result::Result<(), EvaluatorError> {
            Err(EvaluatorError::Failed("boom".into()))
        };
        let builder = TraceBuilder::<Fr>::new(1, &failing, &[]);
        let err = builder
            .compute(&TraceContext::new(4, 4), &[vec![Fr::from(0u64)]], &[])
            .unwrap_err();
        assert!(matches!(err, StarkError::TraceGeneration { step: 0, .. }));
    }

    #[test]
    fn rejects_bad_input_shapes() {
        let builder = TraceBuilder::<Fr>::new(2, &fibonacci, &[]);
        let one = || vec![Fr::from(1u64)];
        for (context, inputs) in [
            (TraceContext::new(8, 0), vec![one(), one()]),
            (TraceContext::new(8, 3), vec![one(), one()]),
            (TraceContext::new(8, 8), vec![one()]),
            (TraceContext::new(8, 4), vec![one(), one()]),
        ] {
            let err = builder.compute(&context, &inputs, &[]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedInput);
        }
    }

    #[test]
    fn assertions_round_trip() {
        let trace = fib_trace();
        let assertions = vec![
            Assertion::new(0, 0, Fr::from(1u64)),
            Assertion::new(1, 0, Fr::from(1u64)),
            Assertion::new(1, 7, Fr::from(987u64)),
        ];
        validate_assertions(&trace, &assertions).unwrap();

        // mutate each pinned cell in turn
        for assertion in &assertions {
            let mut registers = trace.clone().into_registers();
            registers[assertion.register][assertion.step] += Fr::from(1u64);
            let mutated = ExecutionTrace::from_registers(registers).unwrap();
            let err = validate_assertions(&mutated, &assertions).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::IntegrityViolation);
        }
    }

    #[test]
    fn assertion_bounds_are_malformed_input() {
        let trace = fib_trace();
        let err = validate_assertions(&trace, &[Assertion::new(2, 0, Fr::from(1u64))]).unwrap_err();
        assert!(matches!(err, StarkError::AssertionRegisterOutOfRange { register: 2, .. }));
        let err = validate_assertions(&trace, &[Assertion::new(0, 8, Fr::from(1u64))]).unwrap_err();
        assert!(matches!(err, StarkError::AssertionStepOutOfRange { step: 8, steps: 8 }));
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
