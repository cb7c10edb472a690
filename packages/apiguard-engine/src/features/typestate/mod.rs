/*
 * Typestate Feature
 *
 * Per-instance replay of operation traces against compiled order
 * automata.
 *
 * Architecture:
 * - Domain: TrackedInstance
 * - Application: TypestateTracker (NFA subset tracking, WPDS
 *   configurations, branch fork/union merge)
 */

pub mod application;
pub mod domain;

pub use application::tracker::{StepOutcome, TypestateTracker};
pub use domain::TrackedInstance;
