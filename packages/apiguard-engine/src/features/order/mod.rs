/*
 * Order Feature
 *
 * Compiles order expressions into automata.
 *
 * Architecture:
 * - Domain: Automaton, StateId, Symbol
 * - Application: Thompson-style compiler (NFA), pushdown wrapper (WPDS)
 */

pub mod application;
pub mod domain;

pub use application::compiler::compile_order;
pub use application::wpds::{Configuration, PushdownSystem, Weight};
pub use domain::{Automaton, StateId, Symbol};
