use std::cmp::Ordering;
use std::fmt;

use crate::expr::Literal;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Nil,
    Number(f64),
    String(String),
}

impl Value {
    /// `nil` and `false` are falsy, everything else (including `0` and `""`)
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(x) => *x,
            Value::Nil => false,
            Value::Number(_) | Value::String(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            _ => None,
        }
    }

    /// Three-way comparison between two numbers or two strings. Values of
    /// any other pairing have no ordering.
    pub fn three_way(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Some(a.total_cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(x) => Value::Number(*x),
            Literal::String(x) => Value::String(x.to_owned()),
            Literal::Bool(x) => Value::Bool(*x),
            Literal::Nil => Value::Nil,
        }
    }
}

impl From<Ordering> for Value {
    fn from(ordering: Ordering) -> Self {
        Value::Number(ordering as i8 as f64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(x) => write!(f, "{}", x),
            Value::Nil => write!(f, "nil"),
            Value::Number(x) => {
                let text = format!("{:?}", x);
                write!(f, "{}", text.strip_suffix(".0").unwrap_or(&text))
            }
            Value::String(x) => write!(f, "{}", x),
        }
    }
}
