//! Automaton domain model

pub mod automaton;

pub use automaton::{Automaton, StateId, Symbol};
