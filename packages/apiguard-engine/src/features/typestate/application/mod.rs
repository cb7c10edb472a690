//! Typestate tracking

pub mod tracker;

pub use tracker::{StepOutcome, TypestateTracker};
