use crate::domain::model::{FieldChange, FieldChanges, Record};
use serde_json::Value;
use std::fmt;

/// Field-level diff from `existing` to `incoming`.
///
/// Only fields present on `incoming` are visited: a field that disappears
/// between versions never shows up here. A field new on `incoming` is
/// reported with `value_from: null`, which cannot be told apart from an
/// explicit `null` on `existing`.
pub fn field_changes(existing: &Record, incoming: &Record) -> FieldChanges {
    let mut changes = FieldChanges::new();
    for (field, value_to) in &incoming.data {
        let value_from = existing.get(field);
        let unchanged = value_from.is_some_and(|from| values_equal(from, value_to));
        if !unchanged {
            changes.push(
                field.clone(),
                FieldChange {
                    value_from: value_from.cloned().unwrap_or(Value::Null),
                    value_to: value_to.clone(),
                },
            );
        }
    }
    changes
}

/// Numeric reading of a scalar: booleans count as `0`/`1`, and floats with
/// an exact integer value collapse to that integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    const I128_LIMIT: f64 = 1.7e38;

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Numeric::Int(i128::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Numeric::Int(i128::from(i)))
                } else if let Some(u) = n.as_u64() {
                    Some(Numeric::Int(i128::from(u)))
                } else {
                    n.as_f64().map(|f| {
                        if f.fract() == 0.0 && f.abs() < Self::I128_LIMIT {
                            Numeric::Int(f as i128)
                        } else {
                            Numeric::Float(f)
                        }
                    })
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            Numeric::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Structural equality. Numbers and booleans compare by numeric value, so
/// `1`, `1.0` and `true` are all equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (Numeric::from_value(a), Numeric::from_value(b)) {
        return x == y;
    }
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
