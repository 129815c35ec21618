use std::cmp::Ordering;

/// Scalar value as produced by row sources and expression evaluation.
///
/// Sources are schema-less, so a single column may carry different kinds
/// across rows. The untagged serde representation maps directly onto JSON
/// scalars (`1`, `2.5`, `"x"`, `true`, `null`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value. Int promotes to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Three-valued ordering comparison.
    ///
    /// Numeric kinds compare under promotion (`Int(1) == Float(1.0)`).
    /// Null operands, NaN, and cross-kind pairs (e.g. Text vs Int) are
    /// incomparable and yield `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Null, _) | (_, Value::Null) => None,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Three-valued equality: `None` means unknown (SQL null).
    pub fn sql_eq(&self, other: &Value) -> Option<bool> {
        self.compare(other).map(|ord| ord == Ordering::Equal)
    }

    /// `self + other` with null propagation. Int overflow yields Null.
    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(*b).map(Value::Int).unwrap_or(Value::Null)
            }
            _ => Self::float_op(self, other, |a, b| a + b),
        }
    }

    /// `self - other` with null propagation. Int overflow yields Null.
    pub fn sub(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Int).unwrap_or(Value::Null)
            }
            _ => Self::float_op(self, other, |a, b| a - b),
        }
    }

    /// `self * other` with null propagation. Int overflow yields Null.
    pub fn mul(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(*b).map(Value::Int).unwrap_or(Value::Null)
            }
            _ => Self::float_op(self, other, |a, b| a * b),
        }
    }

    /// `self / other`. Always produces Float; division by zero yields Null.
    pub fn div(&self, other: &Value) -> Value {
        match (self.as_f64(), other.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Value::Null,
            (Some(a), Some(b)) => Value::Float(a / b),
            _ => Value::Null,
        }
    }

    /// Arithmetic negation; non-numeric operands yield Null.
    pub fn neg(&self) -> Value {
        match self {
            Value::Int(i) => i.checked_neg().map(Value::Int).unwrap_or(Value::Null),
            Value::Float(f) => Value::Float(-f),
            _ => Value::Null,
        }
    }

    fn float_op(a: &Value, b: &Value, op: impl Fn(f64, f64) -> f64) -> Value {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Value::Float(op(x, y)),
            _ => Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Null => write!(f, "NULL"),
        }
    }
}
