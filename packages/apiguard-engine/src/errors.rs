//! Error types for apiguard-engine
//!
//! Provides unified error handling across the crate.
//!
//! Recoverable conditions are deliberately NOT errors here: an operand
//! that cannot be resolved and a hop budget that runs out both yield
//! `ConstantValue::Unknown`, which every operator propagates. Only
//! structurally malformed input (a broken expression tree, an order
//! expression that cannot become an automaton) surfaces as an error,
//! and even then the failure is scoped to one rule.

use thiserror::Error;

/// Main error type for apiguard-engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structurally malformed expression tree
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Malformed order expression; the offending rule is skipped
    #[error("Automaton construction error in rule '{rule}': {message}")]
    AutomatonConstruction { rule: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an evaluation error
    pub fn evaluation(msg: impl Into<String>) -> Self {
        EngineError::Evaluation(msg.into())
    }

    /// Create an automaton construction error
    pub fn automaton(rule: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::AutomatonConstruction {
            rule: rule.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
