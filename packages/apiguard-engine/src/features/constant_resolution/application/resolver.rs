/*
 * Constant Resolver
 *
 * Resolves a variable's value at a program point by walking backward
 * through its defining assignments, bounded by a fixed hop budget so the
 * walk terminates on cyclic or unbounded definition chains.
 *
 * Never raises: an unresolved branch, external input, or an exhausted
 * budget all yield Unknown. Deterministic for a fixed graph and budget.
 *
 * The resolver only reads the program graph and may be called from
 * multiple rule evaluations concurrently; results are memoized per
 * (variable, program point).
 */

use crate::features::constant_resolution::domain::ConstantValue;
use crate::shared::models::{AssignedValue, NodeId, ProgramGraph, ProgramNodeKind};
use dashmap::DashMap;
use tracing::trace;

/// Bounded backward constant resolver over a read-only program graph
pub struct ConstantResolver<'g> {
    graph: &'g ProgramGraph,
    hop_budget: usize,
    memo: DashMap<(String, NodeId), ConstantValue>,
}

impl<'g> ConstantResolver<'g> {
    pub fn new(graph: &'g ProgramGraph, hop_budget: usize) -> Self {
        Self {
            graph,
            hop_budget,
            memo: DashMap::new(),
        }
    }

    /// Resolve `variable` as observed at node `at`
    pub fn resolve(&self, variable: &str, at: NodeId) -> ConstantValue {
        let key = (variable.to_string(), at);
        if let Some(hit) = self.memo.get(&key) {
            return hit.clone();
        }
        let value = self.resolve_inner(variable, at, self.hop_budget);
        trace!(variable, ?at, %value, "resolved constant");
        self.memo.insert(key, value.clone());
        value
    }

    fn resolve_inner(&self, variable: &str, at: NodeId, budget: usize) -> ConstantValue {
        if budget == 0 {
            // hop budget exhausted: absence of information, not an error
            return ConstantValue::unknown();
        }

        let defs = self.graph.defining_assignments(variable, at);
        if defs.is_empty() {
            return ConstantValue::unknown();
        }

        let mut resolved: Option<ConstantValue> = None;
        for def in defs {
            let value = self.resolve_definition(def, budget);
            match &resolved {
                None => resolved = Some(value),
                Some(prev) => {
                    // Distinct reaching definitions must agree, otherwise
                    // the value depends on an unresolved branch.
                    if prev.same_value(&value) != Some(true) {
                        return ConstantValue::unknown();
                    }
                }
            }
        }
        resolved.unwrap_or_else(ConstantValue::unknown)
    }

    fn resolve_definition(&self, def: NodeId, budget: usize) -> ConstantValue {
        let Some(node) = self.graph.node(def) else {
            return ConstantValue::unknown();
        };
        let ProgramNodeKind::Assignment { value, .. } = &node.kind else {
            return ConstantValue::unknown();
        };
        match value {
            AssignedValue::BoolLiteral(b) => {
                ConstantValue::bool_(*b).with_origin(node.span.clone())
            }
            AssignedValue::IntLiteral(i) => ConstantValue::int(*i).with_origin(node.span.clone()),
            AssignedValue::FloatLiteral(f) => {
                ConstantValue::float(*f).with_origin(node.span.clone())
            }
            AssignedValue::StrLiteral(s) => {
                ConstantValue::from_literal_text(s).with_origin(node.span.clone())
            }
            AssignedValue::Copy(source) => self.resolve_inner(source, def, budget - 1),
            AssignedValue::Opaque => ConstantValue::unknown(),
        }
    }
}
