/*
 * Tracked Instance
 *
 * One concrete program object under surveillance by one rule's
 * automaton. Holds the current configuration (state set, plus call
 * stack in WPDS mode) and the history of matched operations.
 *
 * Invariant: the state set is never empty except when the instance has
 * explicitly reached the error sink (`sink == true`).
 */

use crate::features::order::application::wpds::Configuration;
use crate::shared::models::OpEvent;

/// Per-instance typestate
#[derive(Debug, Clone)]
pub struct TrackedInstance {
    /// Rule this instance is tracked against
    pub rule_name: String,

    /// Program variable holding the instance
    pub variable: String,

    /// Entity role the variable is bound to in the rule
    pub entity_role: String,

    /// Current (state set, call stack) configuration
    pub config: Configuration,

    /// Operations that matched a transition, in program order
    pub history: Vec<OpEvent>,

    /// True once the instance reached the explicit error sink
    pub sink: bool,
}

impl TrackedInstance {
    pub fn new(
        rule_name: impl Into<String>,
        variable: impl Into<String>,
        entity_role: impl Into<String>,
        config: Configuration,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            variable: variable.into(),
            entity_role: entity_role.into(),
            config,
            history: Vec::new(),
            sink: false,
        }
    }

    /// Span of the most recently matched operation, if any
    pub fn last_span(&self) -> Option<&crate::shared::models::Span> {
        self.history.last().map(|ev| &ev.span)
    }
}
