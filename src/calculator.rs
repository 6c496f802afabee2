use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::input::validate_number_input;
use crate::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Cannot divide by zero")]
    DivisionByZero,
    #[error("Cannot calculate square root of negative number: {0}")]
    NegativeSqrt(f64),
    #[error("Invalid number input: {0}")]
    InvalidNumber(String),
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
    #[error("{operation} expects {expected} operand(s), got {got}")]
    WrongArity {
        operation: &'static str,
        expected: usize,
        got: usize,
    },
}

impl CalcError {
    /// True for errors caused by a mathematically invalid input.
    pub fn is_domain(&self) -> bool {
        matches!(self, CalcError::DivisionByZero | CalcError::NegativeSqrt(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Sqrt,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Power,
        Operation::Sqrt,
    ];

    /// Label used for the operation counter.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Power => "power",
            Operation::Sqrt => "sqrt",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }

    pub fn arity(self) -> usize {
        match self {
            Operation::Sqrt => 1,
            _ => 2,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Arithmetic operations that count their own invocations.
///
/// The counter is recorded before the result is computed, so calls that fail
/// with a domain error are still counted.
#[derive(Debug, Clone)]
pub struct Calculator {
    metrics: Arc<Metrics>,
}

impl Calculator {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }

    fn track(&self, op: Operation) {
        self.metrics.track_operation(op.name());
    }

    pub fn add(&self, a: f64, b: f64) -> f64 {
        self.track(Operation::Add);
        a + b
    }

    pub fn subtract(&self, a: f64, b: f64) -> f64 {
        self.track(Operation::Subtract);
        a - b
    }

    pub fn multiply(&self, a: f64, b: f64) -> f64 {
        self.track(Operation::Multiply);
        a * b
    }

    pub fn divide(&self, a: f64, b: f64) -> Result<f64, CalcError> {
        self.track(Operation::Divide);
        if b == 0.0 {
            return Err(CalcError::DivisionByZero);
        }
        Ok(a / b)
    }

    pub fn power(&self, base: f64, exponent: f64) -> f64 {
        self.track(Operation::Power);
        base.powf(exponent)
    }

    pub fn sqrt(&self, x: f64) -> Result<f64, CalcError> {
        self.track(Operation::Sqrt);
        if x < 0.0 {
            return Err(CalcError::NegativeSqrt(x));
        }
        // -0.0 passes the check above; its root must not keep the sign
        Ok(x.sqrt().abs())
    }

    /// Apply `op` to already-parsed operands.
    pub fn apply(&self, op: Operation, operands: &[f64]) -> Result<f64, CalcError> {
        if operands.len() != op.arity() {
            return Err(CalcError::WrongArity {
                operation: op.name(),
                expected: op.arity(),
                got: operands.len(),
            });
        }
        match (op, operands) {
            (Operation::Add, [a, b]) => Ok(self.add(*a, *b)),
            (Operation::Subtract, [a, b]) => Ok(self.subtract(*a, *b)),
            (Operation::Multiply, [a, b]) => Ok(self.multiply(*a, *b)),
            (Operation::Divide, [a, b]) => self.divide(*a, *b),
            (Operation::Power, [a, b]) => Ok(self.power(*a, *b)),
            (Operation::Sqrt, [x]) => self.sqrt(*x),
            _ => Err(CalcError::WrongArity {
                operation: op.name(),
                expected: op.arity(),
                got: operands.len(),
            }),
        }
    }

    /// Evaluate a line of the form `<op> <a> [<b>]`, e.g. `divide 6 3`.
    pub fn evaluate_line(&self, line: &str) -> Result<f64, CalcError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let op = Operation::parse(name)
            .ok_or_else(|| CalcError::UnknownOperation(name.to_string()))?;
        let operands = parts
            .map(validate_number_input)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Evaluating {} with {:?}", op, operands);
        self.apply(op, &operands)
    }
}
