//! Numeric updates on stored values.

use std::fmt;

use crate::error::{JsonKvError, Result};
use crate::store::JsonKv;
use crate::value::Value;

/// An arithmetic update applied to a stored number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    /// Truncated remainder, carrying the sign of the stored value.
    Modulo,
    Power,
}

impl Operation {
    fn compute(self, current: f64, operand: f64) -> f64 {
        match self {
            Operation::Add => current + operand,
            Operation::Subtract => current - operand,
            Operation::Multiply => current * operand,
            Operation::Divide => current / operand,
            Operation::Modulo => current % operand,
            Operation::Power => current.powf(operand),
        }
    }

    fn divides(self) -> bool {
        matches!(self, Operation::Divide | Operation::Modulo)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Modulo => "mod",
            Operation::Power => "power",
        };
        f.write_str(name)
    }
}

impl JsonKv {
    /// Applies `op` with `operand` to the number stored under `key`.
    ///
    /// The key must already hold a number; missing keys are not treated as
    /// zero. Returns the new value.
    pub fn apply(&mut self, key: &str, op: Operation, operand: f64) -> Result<f64> {
        if !operand.is_finite() {
            return Err(JsonKvError::InvalidValue(format!(
                "{op} operand for key {key:?} must be a finite number, got {operand}"
            )));
        }
        if op.divides() && operand == 0.0 {
            return Err(JsonKvError::DivisionByZero(key.to_string()));
        }

        let current = match self.fetch(key) {
            Some(Value::Number(n)) => *n,
            Some(other) => {
                return Err(JsonKvError::InvalidValue(format!(
                    "cannot {op} key {key:?}: it holds a {}, not a number",
                    other.type_name()
                )));
            }
            None => {
                return Err(JsonKvError::InvalidValue(format!(
                    "cannot {op} key {key:?}: no number stored"
                )));
            }
        };

        let result = op.compute(current, operand);
        if !result.is_finite() {
            return Err(JsonKvError::InvalidValue(format!(
                "{op} on key {key:?} gives {result}, which cannot be stored"
            )));
        }

        self.mutate(|data| {
            data.insert(key.to_string(), Value::Number(result));
            Ok(result)
        })
    }

    /// Adds `operand` to the stored number.
    pub fn add(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Add, operand)
    }

    /// Subtracts `operand` from the stored number.
    pub fn subtract(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Subtract, operand)
    }

    /// Multiplies the stored number by `operand`.
    pub fn multiply(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Multiply, operand)
    }

    /// Fails with [`JsonKvError::DivisionByZero`] when `operand` is zero.
    pub fn divide(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Divide, operand)
    }

    /// Remainder of the stored value divided by `operand`.
    pub fn modulo(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Modulo, operand)
    }

    /// Raises the stored number to the power `operand`.
    pub fn power(&mut self, key: &str, operand: f64) -> Result<f64> {
        self.apply(key, Operation::Power, operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(key: &str, value: impl Into<Value>) -> (TempDir, JsonKv) {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = JsonKv::open(dir.path().join("math.json")).unwrap();
        let value: Value = value.into();
        kv.set(key, value).unwrap();
        (dir, kv)
    }

    #[test]
    fn test_basic_arithmetic() {
        let (_dir, mut kv) = store_with("x", 10);

        assert_eq!(kv.add("x", 5.0).unwrap(), 15.0);
        assert_eq!(kv.subtract("x", 3.0).unwrap(), 12.0);
        assert_eq!(kv.multiply("x", 2.0).unwrap(), 24.0);
        assert_eq!(kv.divide("x", 8.0).unwrap(), 3.0);
        assert_eq!(kv.power("x", 3.0).unwrap(), 27.0);
        assert_eq!(kv.modulo("x", 5.0).unwrap(), 2.0);
        assert_eq!(kv.fetch("x"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_result_is_persisted() {
        let (dir, mut kv) = store_with("counter", 1);
        kv.add("counter", 41.0).unwrap();

        let reopened = JsonKv::open(dir.path().join("math.json")).unwrap();
        assert_eq!(reopened.get::<i64>("counter").unwrap(), Some(42));
    }

    #[test]
    fn test_modulo_keeps_sign_of_stored_value() {
        let (_dir, mut kv) = store_with("x", -7);
        assert_eq!(kv.modulo("x", 3.0).unwrap(), -1.0);
    }

    #[test]
    fn test_requires_existing_number() {
        let (_dir, mut kv) = store_with("name", "alice");

        let err = kv.add("name", 1.0).unwrap_err();
        assert!(matches!(err, JsonKvError::InvalidValue(_)));
        assert_eq!(kv.fetch("name"), Some(&Value::from("alice")));

        let err = kv.add("missing", 1.0).unwrap_err();
        assert!(matches!(err, JsonKvError::InvalidValue(_)));
        assert!(!kv.has("missing"));
    }

    #[test]
    fn test_division_by_zero() {
        let (_dir, mut kv) = store_with("x", 4);

        assert!(matches!(kv.divide("x", 0.0), Err(JsonKvError::DivisionByZero(_))));
        assert!(matches!(kv.modulo("x", 0.0), Err(JsonKvError::DivisionByZero(_))));
        // Checked before the stored value is inspected.
        assert!(matches!(kv.divide("missing", 0.0), Err(JsonKvError::DivisionByZero(_))));
        assert_eq!(kv.fetch("x"), Some(&Value::Number(4.0)));
    }

    #[test]
    fn test_non_finite_operands_and_results() {
        let (_dir, mut kv) = store_with("x", 2);

        assert!(matches!(kv.add("x", f64::NAN), Err(JsonKvError::InvalidValue(_))));
        assert!(matches!(kv.multiply("x", f64::INFINITY), Err(JsonKvError::InvalidValue(_))));
        assert!(matches!(kv.power("x", 5000.0), Err(JsonKvError::InvalidValue(_))));
        assert_eq!(kv.fetch("x"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_fractional_values() {
        let (_dir, mut kv) = store_with("ratio", 1);
        assert_eq!(kv.divide("ratio", 4.0).unwrap(), 0.25);
        assert_eq!(kv.apply("ratio", Operation::Add, 0.5).unwrap(), 0.75);
        assert_eq!(Operation::Modulo.to_string(), "mod");
    }
}
