/*
 * Weighted Pushdown System backend
 *
 * Interprocedural typestate configuration: the same automaton as the NFA
 * backend, augmented with push/pop transitions at call and return
 * boundaries so an instance's state survives across procedures at a cost
 * proportional to call-graph depth.
 *
 * Weights form the boolean semiring (combine = or over paths, extend =
 * and along a path): the only question the analysis asks is whether a
 * violation is reachable along some path, and boolean reachability is
 * exactly that predicate. See DESIGN.md for the rationale.
 */

use crate::features::order::domain::{Automaton, StateId, Symbol};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Boolean semiring weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weight(pub bool);

impl Weight {
    /// Additive identity: no path
    pub const ZERO: Weight = Weight(false);

    /// Multiplicative identity: the empty path
    pub const ONE: Weight = Weight(true);

    /// Path combination (⊕): reachable along either path
    pub fn combine(self, other: Weight) -> Weight {
        Weight(self.0 || other.0)
    }

    /// Path extension (⊗): every step along the path must be feasible
    pub fn extend(self, other: Weight) -> Weight {
        Weight(self.0 && other.0)
    }
}

/// (state set, call stack) configuration with an accumulated weight
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub states: FxHashSet<StateId>,
    pub stack: Vec<String>,
    pub weight: Weight,
}

impl Configuration {
    pub fn is_dead(&self) -> bool {
        self.states.is_empty() || self.weight == Weight::ZERO
    }
}

/// Pushdown wrapper around a shared automaton
///
/// All transition functions are pure: they take a configuration and
/// return the successor configuration.
#[derive(Debug, Clone)]
pub struct PushdownSystem {
    automaton: Arc<Automaton>,
}

impl PushdownSystem {
    pub fn new(automaton: Arc<Automaton>) -> Self {
        Self { automaton }
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Initial configuration: automaton start closure, empty stack
    pub fn initial(&self) -> Configuration {
        Configuration {
            states: self.automaton.initial_states(),
            stack: Vec::new(),
            weight: Weight::ONE,
        }
    }

    /// Internal transition: advance on an alphabet symbol
    pub fn step(&self, config: &Configuration, symbol: &Symbol) -> Configuration {
        let states = self.automaton.step(&config.states, symbol);
        let weight = if states.is_empty() {
            Weight::ZERO
        } else {
            config.weight.extend(Weight::ONE)
        };
        Configuration {
            states,
            stack: config.stack.clone(),
            weight,
        }
    }

    /// Push transition at a call edge: typestate survives into the callee
    pub fn push(&self, config: &Configuration, frame: impl Into<String>) -> Configuration {
        let mut next = config.clone();
        next.stack.push(frame.into());
        next
    }

    /// Pop transition at a return edge
    ///
    /// An unmatched return (already-empty stack or a different frame on
    /// top) is tolerated: the trace provider may hand us a suffix of the
    /// real call stack.
    pub fn pop(&self, config: &Configuration, frame: &str) -> Configuration {
        let mut next = config.clone();
        if next.stack.last().map(String::as_str) == Some(frame) {
            next.stack.pop();
        }
        next
    }

    /// Merge configurations arriving at a join point
    ///
    /// State sets union; weights combine. Stacks agree by construction
    /// (a branch cannot change call depth between fork and join).
    pub fn merge(&self, a: &Configuration, b: &Configuration) -> Configuration {
        let mut states = a.states.clone();
        states.extend(b.states.iter().copied());
        Configuration {
            states,
            stack: a.stack.clone(),
            weight: a.weight.combine(b.weight),
        }
    }
}
