/*
 * Expression Ports
 *
 * Interfaces the evaluator needs from its surroundings.
 */

use crate::features::constant_resolution::domain::ConstantValue;
use rustc_hash::FxHashMap;

/// Source of operand and modeled-call values during guard evaluation
///
/// Implementations must represent missing information as
/// `ConstantValue::unknown()`; they never fail.
pub trait EvalContext {
    /// Resolve a named operand (e.g. `cipher.algorithm`)
    fn resolve_operand(&self, name: &str) -> ConstantValue;

    /// Resolve a call that is not a registered builtin via its modeled
    /// return value
    fn resolve_call(&self, name: &str, args: &[ConstantValue]) -> ConstantValue;
}

/// Fixed-map context
///
/// Used by tests and by front ends that pre-resolve every operand.
#[derive(Debug, Default, Clone)]
pub struct MapContext {
    values: FxHashMap<String, ConstantValue>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ConstantValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl EvalContext for MapContext {
    fn resolve_operand(&self, name: &str) -> ConstantValue {
        self.values
            .get(name)
            .cloned()
            .unwrap_or_else(ConstantValue::unknown)
    }

    fn resolve_call(&self, _name: &str, _args: &[ConstantValue]) -> ConstantValue {
        ConstantValue::unknown()
    }
}
