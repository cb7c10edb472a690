/*
 * Engine Configuration
 *
 * Configuration surface consumed by the rule-evaluation core:
 * - typestate backend selection (NFA or WPDS)
 * - suppression of non-problem ("good") findings
 * - constant resolver hop budget
 * - overall wall-clock timeout
 */

use crate::errors::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Typestate tracking backend
///
/// NFA:  nondeterministic finite automaton (faster, intraprocedural)
/// WPDS: weighted pushdown system (slower, interprocedural)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypestateMode {
    #[default]
    Nfa,
    Wpds,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Typestate backend
    pub typestate_mode: TypestateMode,

    /// Suppress non-problem findings at the reporting boundary
    ///
    /// The tracker always computes the true outcome; this only filters
    /// what is handed to the reporting layer.
    pub disable_good_findings: bool,

    /// Backward hops the constant resolver may take before answering
    /// Unknown
    pub hop_budget: usize,

    /// Wall-clock budget for the whole analysis; None = unbounded
    pub timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            typestate_mode: TypestateMode::default(),
            disable_good_findings: false,
            hop_budget: 20,
            timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_typestate_mode(mut self, mode: TypestateMode) -> Self {
        self.typestate_mode = mode;
        self
    }

    pub fn with_disable_good_findings(mut self, disable: bool) -> Self {
        self.disable_good_findings = disable;
        self
    }

    pub fn with_hop_budget(mut self, budget: usize) -> Self {
        self.hop_budget = budget;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate configuration ranges
    pub fn validate(&self) -> Result<()> {
        if self.hop_budget == 0 {
            return Err(EngineError::config(
                "hop_budget must be at least 1 (0 would make every resolution Unknown)",
            ));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(EngineError::config("timeout must be non-zero when set"));
            }
        }
        Ok(())
    }
}
