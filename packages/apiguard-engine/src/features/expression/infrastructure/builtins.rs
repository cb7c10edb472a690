/*
 * Built-in Predicates
 *
 * Registered table of functions callable from guard expressions.
 * Unregistered names fall through to the evaluation context's modeled
 * return value.
 *
 * Every builtin is total: bad arity or an Unknown argument yields
 * Unknown, never an error.
 */

use crate::features::constant_resolution::domain::{ConstantValue, ValueKind};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Builtin signature: evaluated arguments in, value out
pub type BuiltinFn = fn(&[ConstantValue]) -> ConstantValue;

static BUILTINS: Lazy<HashMap<&'static str, BuiltinFn>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
    m.insert("_is", builtin_is);
    m.insert("_length", builtin_length);
    m.insert("_split", builtin_split);
    m.insert("_starts_with", builtin_starts_with);
    m.insert("_ends_with", builtin_ends_with);
    m.insert("_receives_value_from", builtin_receives_value_from);
    m
});

/// Look up a registered builtin
pub fn builtin(name: &str) -> Option<BuiltinFn> {
    BUILTINS.get(name).copied()
}

/// `_is(a, b)` — value equality
fn builtin_is(args: &[ConstantValue]) -> ConstantValue {
    match args {
        [a, b] => match a.same_value(b) {
            Some(eq) => ConstantValue::bool_(eq),
            None => ConstantValue::unknown(),
        },
        _ => ConstantValue::unknown(),
    }
}

/// `_length(x)` — string length or list length
fn builtin_length(args: &[ConstantValue]) -> ConstantValue {
    match args {
        [v] => match &v.kind {
            ValueKind::Str(s) => ConstantValue::int(s.chars().count() as i64),
            ValueKind::List(items) => ConstantValue::int(items.len() as i64),
            _ => ConstantValue::unknown(),
        },
        _ => ConstantValue::unknown(),
    }
}

/// `_split(str, sep, index)` — indexed fragment of a separated string
fn builtin_split(args: &[ConstantValue]) -> ConstantValue {
    match args {
        [s, sep, index] => {
            let (Some(s), Some(sep), Some(index)) = (s.as_str(), sep.as_str(), index.as_int())
            else {
                return ConstantValue::unknown();
            };
            if index < 0 {
                return ConstantValue::unknown();
            }
            match s.split(sep).nth(index as usize) {
                Some(fragment) => ConstantValue::str_(fragment),
                None => ConstantValue::unknown(),
            }
        }
        _ => ConstantValue::unknown(),
    }
}

/// `_starts_with(str, prefix)`
fn builtin_starts_with(args: &[ConstantValue]) -> ConstantValue {
    match args {
        [s, prefix] => match (s.as_str(), prefix.as_str()) {
            (Some(s), Some(prefix)) => ConstantValue::bool_(s.starts_with(prefix)),
            _ => ConstantValue::unknown(),
        },
        _ => ConstantValue::unknown(),
    }
}

/// `_ends_with(str, suffix)`
fn builtin_ends_with(args: &[ConstantValue]) -> ConstantValue {
    match args {
        [s, suffix] => match (s.as_str(), suffix.as_str()) {
            (Some(s), Some(suffix)) => ConstantValue::bool_(s.ends_with(suffix)),
            _ => ConstantValue::unknown(),
        },
        _ => ConstantValue::unknown(),
    }
}

/// `_receives_value_from(sink, source)` — needs full data-flow tracking,
/// which lives outside this core; answer honestly with Unknown
fn builtin_receives_value_from(_args: &[ConstantValue]) -> ConstantValue {
    ConstantValue::unknown()
}
