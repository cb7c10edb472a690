/*
 * Order Automaton
 *
 * Nondeterministic finite automaton over (entity, operation) symbols,
 * compiled once per rule from its order expression and read-only
 * thereafter. Trackers share it via Arc; per-instance state is an
 * explicit set of state identifiers manipulated by pure transition
 * functions, not a mutable object graph.
 */

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Automaton state identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub usize);

/// Alphabet symbol: one (entity-role, operation) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    pub entity: String,
    pub op: String,
}

impl Symbol {
    pub fn new(entity: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            op: op.into(),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}()", self.entity, self.op)
    }
}

/// Compiled order automaton
#[derive(Debug, Clone)]
pub struct Automaton {
    state_count: usize,
    start: StateId,
    accepting: FxHashSet<StateId>,
    transitions: FxHashMap<StateId, Vec<(Symbol, StateId)>>,
    epsilon: FxHashMap<StateId, Vec<StateId>>,
    alphabet: FxHashSet<Symbol>,
}

impl Automaton {
    pub(crate) fn new(
        state_count: usize,
        start: StateId,
        accepting: FxHashSet<StateId>,
        transitions: FxHashMap<StateId, Vec<(Symbol, StateId)>>,
        epsilon: FxHashMap<StateId, Vec<StateId>>,
        alphabet: FxHashSet<Symbol>,
    ) -> Self {
        Self {
            state_count,
            start,
            accepting,
            transitions,
            epsilon,
            alphabet,
        }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    /// Symbols the automaton knows; operations outside it never match
    /// any transition and are ignored, not errors
    pub fn alphabet(&self) -> &FxHashSet<Symbol> {
        &self.alphabet
    }

    pub fn in_alphabet(&self, symbol: &Symbol) -> bool {
        self.alphabet.contains(symbol)
    }

    /// Initial state set: epsilon closure of the start state
    pub fn initial_states(&self) -> FxHashSet<StateId> {
        let mut set = FxHashSet::default();
        set.insert(self.start);
        self.epsilon_closure(set)
    }

    /// Epsilon closure of a state set
    pub fn epsilon_closure(&self, mut states: FxHashSet<StateId>) -> FxHashSet<StateId> {
        let mut stack: Vec<StateId> = states.iter().copied().collect();
        while let Some(state) = stack.pop() {
            if let Some(nexts) = self.epsilon.get(&state) {
                for &next in nexts {
                    if states.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        states
    }

    /// Advance every active state via `symbol`-labeled edges
    ///
    /// Returns the epsilon-closed successor set; empty means no edge
    /// matched from any active state (the caller moves to the sink).
    pub fn step(&self, states: &FxHashSet<StateId>, symbol: &Symbol) -> FxHashSet<StateId> {
        let mut next = FxHashSet::default();
        for state in states {
            if let Some(edges) = self.transitions.get(state) {
                for (label, target) in edges {
                    if label == symbol {
                        next.insert(*target);
                    }
                }
            }
        }
        self.epsilon_closure(next)
    }

    /// True when any state in the set is accepting
    pub fn is_accepting(&self, states: &FxHashSet<StateId>) -> bool {
        states.iter().any(|s| self.accepting.contains(s))
    }

    /// Symbols with an outgoing edge from the given state set, sorted
    /// for deterministic violation messages
    pub fn expected_symbols(&self, states: &FxHashSet<StateId>) -> Vec<Symbol> {
        let mut expected: Vec<Symbol> = states
            .iter()
            .filter_map(|s| self.transitions.get(s))
            .flatten()
            .map(|(symbol, _)| symbol.clone())
            .collect();
        expected.sort();
        expected.dedup();
        expected
    }
}
