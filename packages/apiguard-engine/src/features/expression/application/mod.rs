//! Expression evaluation

pub mod evaluator;

pub use evaluator::{evaluate, evaluate_or_unknown};
