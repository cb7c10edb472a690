/*
 * Constant Value
 *
 * Resolved compile-time value of a program expression, or Unknown.
 *
 * Unknown is a poison value: every operator and extractor propagates it
 * instead of defaulting to false/zero. Absence of information is always
 * representable, so resolution never raises.
 */

use crate::shared::models::Span;
use serde::{Deserialize, Serialize};

/// Tagged value kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ConstantValue>),
    Unknown,
}

/// Resolved constant value with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantValue {
    pub kind: ValueKind,

    /// Program location the value originates from, for diagnostics
    pub origin: Option<Span>,
}

// Provenance is diagnostic only; two values are equal when their kinds are.
impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl ConstantValue {
    pub fn unknown() -> Self {
        Self {
            kind: ValueKind::Unknown,
            origin: None,
        }
    }

    pub fn bool_(value: bool) -> Self {
        Self {
            kind: ValueKind::Bool(value),
            origin: None,
        }
    }

    pub fn int(value: i64) -> Self {
        Self {
            kind: ValueKind::Int(value),
            origin: None,
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            kind: ValueKind::Float(value),
            origin: None,
        }
    }

    pub fn str_(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Str(value.into()),
            origin: None,
        }
    }

    pub fn list(values: Vec<ConstantValue>) -> Self {
        Self {
            kind: ValueKind::List(values),
            origin: None,
        }
    }

    /// Build a string value from possibly-quoted literal text
    ///
    /// `"abc"` and `'a'` lose their surrounding quotes; bare text is
    /// taken as-is.
    pub fn from_literal_text(text: &str) -> Self {
        Self::str_(strip_quoted_char(strip_quoted_string(text)))
    }

    pub fn with_origin(mut self, span: Span) -> Self {
        self.origin = Some(span);
        self
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, ValueKind::Unknown)
    }

    /// Extract a boolean; Unknown and non-boolean kinds yield None
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Extract an integer; Unknown and non-numeric kinds yield None
    pub fn as_int(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Extract a numeric value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Int(i) => Some(i as f64),
            ValueKind::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Extract a string; Unknown and non-string kinds yield None
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract list elements
    pub fn as_list(&self) -> Option<&[ConstantValue]> {
        match &self.kind {
            ValueKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Value equality usable in three-valued comparisons
    ///
    /// Returns None when either side is Unknown or the kinds are not
    /// comparable; numerics compare across Int/Float.
    pub fn same_value(&self, other: &Self) -> Option<bool> {
        match (&self.kind, &other.kind) {
            (ValueKind::Unknown, _) | (_, ValueKind::Unknown) => None,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => Some(a == b),
            (ValueKind::Str(a), ValueKind::Str(b)) => Some(a == b),
            (ValueKind::List(a), ValueKind::List(b)) => Some(a == b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Some(a == b),
                _ => None,
            },
        }
    }
}

impl std::fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ValueKind::Bool(b) => write!(f, "{}", b),
            ValueKind::Int(i) => write!(f, "{}", i),
            ValueKind::Float(x) => write!(f, "{}", x),
            ValueKind::Str(s) => write!(f, "\"{}\"", s),
            ValueKind::List(items) => {
                write!(f, "[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, " ]")
            }
            ValueKind::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Remove surrounding double quotes, if present
pub fn strip_quoted_string(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Remove surrounding single quotes, if present
pub fn strip_quoted_char(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        // there should be only a single character here
        &s[1..s.len() - 1]
    } else {
        s
    }
}
