// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Helpers for the dynamic values flowing through hooks.
//!
//! Hook arguments, callback results and accumulators are all
//! [`serde_json::Value`]s. The functions here give those values the loose
//! boolean, numeric and textual semantics the built-in reduction strategies
//! rely on.

use crate::error::StrategyError;
use serde_json::{Number, Value};

/// Name of a value's JSON type, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truthiness of a value.
///
/// `null`, `false`, zero and the empty string are falsy; everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value as text. Strings are taken verbatim, everything else is
/// rendered as compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone, Copy)]
enum Arith {
    Add,
    Mul,
}

/// Sum of two numeric values.
pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, StrategyError> {
    arith(lhs, rhs, Arith::Add)
}

/// Product of two numeric values.
pub fn mul(lhs: &Value, rhs: &Value) -> Result<Value, StrategyError> {
    arith(lhs, rhs, Arith::Mul)
}

fn arith(lhs: &Value, rhs: &Value, op: Arith) -> Result<Value, StrategyError> {
    let a = as_number(lhs)?;
    let b = as_number(rhs)?;

    // Exact integer arithmetic where possible
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let exact = match op {
            Arith::Add => x.checked_add(y),
            Arith::Mul => x.checked_mul(y),
        };
        if let Some(v) = exact {
            return Ok(Value::from(v));
        }
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        let exact = match op {
            Arith::Add => x.checked_add(y),
            Arith::Mul => x.checked_mul(y),
        };
        if let Some(v) = exact {
            return Ok(Value::from(v));
        }
    }

    let (x, y) = (to_f64(a)?, to_f64(b)?);
    let result = match op {
        Arith::Add => x + y,
        Arith::Mul => x * y,
    };
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| StrategyError::NotRepresentable(result.to_string()))
}

fn as_number(value: &Value) -> Result<&Number, StrategyError> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(StrategyError::type_mismatch("number", other)),
    }
}

fn to_f64(n: &Number) -> Result<f64, StrategyError> {
    n.as_f64()
        .ok_or_else(|| StrategyError::NotRepresentable(n.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(add(&json!(2), &json!(3)).unwrap(), json!(5));
        assert_eq!(mul(&json!(-4), &json!(3)).unwrap(), json!(-12));
        assert!(add(&json!(2), &json!(3)).unwrap().is_i64());
    }

    #[test]
    fn test_large_unsigned_arithmetic() {
        let big = u64::MAX - 1;
        assert_eq!(add(&json!(big), &json!(1)).unwrap(), json!(u64::MAX));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let result = mul(&json!(i64::MAX), &json!(4)).unwrap();
        assert!(result.is_f64());
    }

    #[test]
    fn test_mixed_float_arithmetic() {
        assert_eq!(add(&json!(1), &json!(0.5)).unwrap(), json!(1.5));
        assert_eq!(mul(&json!(2.5), &json!(2)).unwrap(), json!(5.0));
    }

    #[test]
    fn test_non_numeric_operand() {
        let err = add(&json!(1), &json!("2")).unwrap_err();
        assert_eq!(
            err,
            StrategyError::TypeMismatch {
                expected: "number",
                actual: "string".to_string()
            }
        );
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("abc")), "abc");
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!([1, "a"])), r#"[1,"a"]"#);
        assert_eq!(to_text(&Value::Null), "null");
    }
}
