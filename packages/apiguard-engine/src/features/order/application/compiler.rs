/*
 * Order Expression Compiler
 *
 * Structural translation from an order expression to an automaton:
 * - Terminal becomes one labeled edge
 * - Sequence wires the left fragment's accept to the right's start
 * - Alternative fans out from a shared start and back into a shared accept
 * - Repetition adds a back-edge for + and *, and a bypass for * and ?
 *
 * A malformed order expression (a guard node beneath the Order wrapper,
 * or no Order wrapper at all) fails compilation for that one rule only.
 */

use crate::errors::{EngineError, Result};
use crate::features::expression::domain::{Expression, RepetitionOp};
use crate::features::order::domain::{Automaton, StateId, Symbol};
use rustc_hash::{FxHashMap, FxHashSet};

/// Compile a rule's order expression into an automaton
///
/// `rule_name` scopes the error when the expression is malformed.
pub fn compile_order(rule_name: &str, order: &Expression) -> Result<Automaton> {
    let inner = match order {
        Expression::Order(inner) => inner,
        other => {
            return Err(EngineError::automaton(
                rule_name,
                format!("expected an order expression, got '{}'", other.to_text()),
            ))
        }
    };

    // The alphabet must be fully known before construction.
    let mut pairs = FxHashSet::default();
    order.collect_alphabet(&mut pairs);
    let alphabet: FxHashSet<Symbol> = pairs
        .into_iter()
        .map(|(entity, op)| Symbol { entity, op })
        .collect();
    if alphabet.is_empty() {
        return Err(EngineError::automaton(rule_name, "empty order expression"));
    }

    let mut builder = Builder::default();
    let fragment = builder.compile(rule_name, inner)?;

    let mut accepting = FxHashSet::default();
    accepting.insert(fragment.accept);

    Ok(Automaton::new(
        builder.state_count,
        fragment.start,
        accepting,
        builder.transitions,
        builder.epsilon,
        alphabet,
    ))
}

/// Sub-automaton with one entry and one exit state
#[derive(Debug, Clone, Copy)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

#[derive(Default)]
struct Builder {
    state_count: usize,
    transitions: FxHashMap<StateId, Vec<(Symbol, StateId)>>,
    epsilon: FxHashMap<StateId, Vec<StateId>>,
}

impl Builder {
    fn fresh_state(&mut self) -> StateId {
        let id = StateId(self.state_count);
        self.state_count += 1;
        id
    }

    fn add_edge(&mut self, from: StateId, symbol: Symbol, to: StateId) {
        self.transitions.entry(from).or_default().push((symbol, to));
    }

    fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.epsilon.entry(from).or_default().push(to);
    }

    fn compile(&mut self, rule_name: &str, expr: &Expression) -> Result<Fragment> {
        match expr {
            Expression::Terminal { entity, op } => {
                let start = self.fresh_state();
                let accept = self.fresh_state();
                self.add_edge(start, Symbol::new(entity.clone(), op.clone()), accept);
                Ok(Fragment { start, accept })
            }

            Expression::Sequence { left, right, .. } => {
                let l = self.compile(rule_name, left)?;
                let r = self.compile(rule_name, right)?;
                self.add_epsilon(l.accept, r.start);
                Ok(Fragment {
                    start: l.start,
                    accept: r.accept,
                })
            }

            Expression::Alternative { left, right } => {
                let l = self.compile(rule_name, left)?;
                let r = self.compile(rule_name, right)?;
                let start = self.fresh_state();
                let accept = self.fresh_state();
                self.add_epsilon(start, l.start);
                self.add_epsilon(start, r.start);
                self.add_epsilon(l.accept, accept);
                self.add_epsilon(r.accept, accept);
                Ok(Fragment { start, accept })
            }

            Expression::Repetition { inner, op } => {
                let f = self.compile(rule_name, inner)?;
                let start = self.fresh_state();
                let accept = self.fresh_state();
                self.add_epsilon(start, f.start);
                self.add_epsilon(f.accept, accept);
                if matches!(op, RepetitionOp::Plus | RepetitionOp::Star) {
                    // back-edge: another round of the body
                    self.add_epsilon(f.accept, f.start);
                }
                if matches!(op, RepetitionOp::Star | RepetitionOp::Opt) {
                    // bypass: the body may be skipped entirely
                    self.add_epsilon(start, accept);
                }
                Ok(Fragment { start, accept })
            }

            // Nested Order wrappers are flattened
            Expression::Order(inner) => self.compile(rule_name, inner),

            other => Err(EngineError::automaton(
                rule_name,
                format!("'{}' is not valid inside an order expression", other.to_text()),
            )),
        }
    }
}
