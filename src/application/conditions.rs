//! Pattern conditions evaluated against a serialized payload.
//!
//! A [`Condition`] is compiled once into a [`CompiledCondition`]: the field
//! path is split up front and the operator is parsed into an [`Operator`]
//! that carries its operand. Evaluation never fails; a missing field is
//! `undefined` and compares the way a JavaScript matcher would.

use crate::domain::errors::ConditionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw condition as stored in a pattern definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the payload, e.g. `flags.sq30_release`
    pub field: String,
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            op: op.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    Neq(Value),
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
    Truthy,
    Falsy,
    In(Vec<Value>),
    Contains(String),
}

impl Operator {
    fn parse(op: &str, value: Option<&Value>) -> Result<Self, ConditionError> {
        let required = || {
            value.cloned().ok_or_else(|| ConditionError::MissingValue { op: op.to_string() })
        };
        let number = || -> Result<f64, ConditionError> {
            required()?.as_f64().ok_or_else(|| ConditionError::InvalidOperand {
                op: op.to_string(),
                reason: "expected a number".to_string(),
            })
        };

        match op {
            "eq" => Ok(Operator::Eq(required()?)),
            "neq" => Ok(Operator::Neq(required()?)),
            "gt" => Ok(Operator::Gt(number()?)),
            "gte" => Ok(Operator::Gte(number()?)),
            "lt" => Ok(Operator::Lt(number()?)),
            "lte" => Ok(Operator::Lte(number()?)),
            "truthy" => Ok(Operator::Truthy),
            "falsy" => Ok(Operator::Falsy),
            "in" => match required()? {
                Value::Array(items) => Ok(Operator::In(items)),
                _ => Err(ConditionError::InvalidOperand {
                    op: op.to_string(),
                    reason: "expected an array".to_string(),
                }),
            },
            "contains" => match required()? {
                Value::String(needle) => Ok(Operator::Contains(needle)),
                _ => Err(ConditionError::InvalidOperand {
                    op: op.to_string(),
                    reason: "expected a string".to_string(),
                }),
            },
            other => Err(ConditionError::UnknownOperator {
                op: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    path: Vec<String>,
    op: Operator,
}

impl CompiledCondition {
    pub fn compile(condition: &Condition) -> Result<Self, ConditionError> {
        let path: Vec<String> = condition
            .field
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if path.is_empty() {
            return Err(ConditionError::EmptyPath);
        }

        Ok(Self {
            path,
            op: Operator::parse(&condition.op, condition.value.as_ref())?,
        })
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    fn resolve<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        self.path.iter().try_fold(payload, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn evaluate(&self, payload: &Value) -> bool {
        let found = self.resolve(payload);
        let number = found.and_then(Value::as_f64);

        match &self.op {
            Operator::Eq(expected) => found.is_some_and(|v| strict_eq(v, expected)),
            Operator::Neq(expected) => !found.is_some_and(|v| strict_eq(v, expected)),
            Operator::Gt(bound) => number.is_some_and(|n| n > *bound),
            Operator::Gte(bound) => number.is_some_and(|n| n >= *bound),
            Operator::Lt(bound) => number.is_some_and(|n| n < *bound),
            Operator::Lte(bound) => number.is_some_and(|n| n <= *bound),
            Operator::Truthy => found.is_some_and(truthy),
            Operator::Falsy => !found.is_some_and(truthy),
            Operator::In(items) => found.is_some_and(|v| items.iter().any(|item| strict_eq(v, item))),
            Operator::Contains(needle) => found
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(needle.as_str())),
        }
    }
}

/// Numbers compare by value regardless of integer/float representation
fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// JavaScript truthiness of a JSON value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A named conjunction of conditions
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub name: String,
    conditions: Vec<CompiledCondition>,
}

impl Pattern {
    pub fn compile(name: impl Into<String>, conditions: &[Condition]) -> Result<Self, ConditionError> {
        Ok(Self {
            name: name.into(),
            conditions: conditions
                .iter()
                .map(CompiledCondition::compile)
                .collect::<Result<_, _>>()?,
        })
    }

    /// All conditions hold; a pattern without conditions never matches
    pub fn matches(&self, payload: &Value) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.evaluate(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(field: &str, op: &str, value: Option<Value>, payload: &Value) -> bool {
        CompiledCondition::compile(&Condition::new(field, op, value))
            .unwrap()
            .evaluate(payload)
    }

    #[test]
    fn test_compile_parses_operand() {
        let gt =
            CompiledCondition::compile(&Condition::new("htf_score", "gt", Some(json!(25)))).unwrap();
        assert_eq!(gt.operator(), &Operator::Gt(25.0));

        let within = CompiledCondition::compile(&Condition::new(
            "state",
            "in",
            Some(json!(["HTF_BULL_LTF_BULL"])),
        ))
        .unwrap();
        assert_eq!(within.operator(), &Operator::In(vec![json!("HTF_BULL_LTF_BULL")]));
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(
            CompiledCondition::compile(&Condition::new("", "truthy", None)),
            Err(ConditionError::EmptyPath)
        );
        assert!(matches!(
            CompiledCondition::compile(&Condition::new("a", "between", None)),
            Err(ConditionError::UnknownOperator { .. })
        ));
        assert!(matches!(
            CompiledCondition::compile(&Condition::new("a", "eq", None)),
            Err(ConditionError::MissingValue { .. })
        ));
        assert!(matches!(
            CompiledCondition::compile(&Condition::new("a", "gt", Some(json!("x")))),
            Err(ConditionError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_numeric_and_equality_operators() {
        let payload = json!({"htf_score": 22.5, "state": "HTF_BULL_LTF_BULL", "n": 3});
        assert!(check("htf_score", "gte", Some(json!(20)), &payload));
        assert!(!check("htf_score", "lt", Some(json!(20)), &payload));
        assert!(check("state", "eq", Some(json!("HTF_BULL_LTF_BULL")), &payload));
        assert!(check("n", "eq", Some(json!(3.0)), &payload));
        assert!(check("missing", "neq", Some(json!(1)), &payload));
        assert!(!check("state", "gt", Some(json!(1)), &payload));
    }

    #[test]
    fn test_truthiness_and_missing_fields() {
        let payload = json!({"flags": {"sq30_release": true}, "zero": 0, "empty": ""});
        assert!(check("flags.sq30_release", "truthy", None, &payload));
        assert!(check("flags.st_flip_30m", "falsy", None, &payload));
        assert!(check("zero", "falsy", None, &payload));
        assert!(check("empty", "falsy", None, &payload));
        assert!(check("flags", "truthy", None, &payload));
    }

    #[test]
    fn test_in_and_contains() {
        let payload = json!({"tier": "HIGH", "regime": {"combined": "STRONG_BULL"}});
        assert!(check("tier", "in", Some(json!(["HIGH", "EXTREME"])), &payload));
        assert!(!check("tier", "in", Some(json!(["LOW"])), &payload));
        assert!(check("regime.combined", "contains", Some(json!("BULL")), &payload));
        assert!(!check("tier", "contains", Some(json!("BULL")), &payload));
    }

    #[test]
    fn test_array_index_segment() {
        let payload = json!({"active_gates": [{"side": "bull"}]});
        assert!(check("active_gates.0.side", "eq", Some(json!("bull")), &payload));
        assert!(!check("active_gates.1.side", "truthy", None, &payload));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let pattern = Pattern::compile("empty", &[]).unwrap();
        assert!(!pattern.matches(&json!({})));

        let pattern = Pattern::compile(
            "bull",
            &[
                Condition::new("a", "truthy", None),
                Condition::new("b", "gt", Some(json!(1))),
            ],
        )
        .unwrap();
        assert!(pattern.matches(&json!({"a": 1, "b": 2})));
        assert!(!pattern.matches(&json!({"a": 1, "b": 0})));
    }
}
