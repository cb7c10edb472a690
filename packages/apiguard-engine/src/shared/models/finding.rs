//! Finding model
//!
//! A finding is either a violation (`problem == true`) or a confirmation
//! of correct use (`problem == false`). Findings are deduplicated by
//! (rule, first location, onfail identifier).

use super::span::Span;
use serde::{Deserialize, Serialize};

/// Reported analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the rule that produced this finding
    pub rule_id: String,

    /// Onfail identifier from the rule
    pub onfail_id: String,

    /// true = violation, false = confirmation of correct use
    pub problem: bool,

    /// Source locations, most specific first
    pub locations: Vec<Span>,

    /// Rendered message, including the canonical expression text
    pub message: String,
}

impl Finding {
    pub fn problem(
        rule_id: impl Into<String>,
        onfail_id: impl Into<String>,
        locations: Vec<Span>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            onfail_id: onfail_id.into(),
            problem: true,
            locations,
            message: message.into(),
        }
    }

    pub fn good(
        rule_id: impl Into<String>,
        onfail_id: impl Into<String>,
        locations: Vec<Span>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            onfail_id: onfail_id.into(),
            problem: false,
            locations,
            message: message.into(),
        }
    }

    pub fn is_problem(&self) -> bool {
        self.problem
    }

    /// Deduplication key: (rule, first location, onfail)
    pub fn dedup_key(&self) -> (String, Option<Span>, String) {
        (
            self.rule_id.clone(),
            self.locations.first().cloned(),
            self.onfail_id.clone(),
        )
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.problem { "violation" } else { "ok" };
        match self.locations.first() {
            Some(span) => write!(
                f,
                "[{}] {} ({}): {}",
                marker, self.rule_id, span, self.message
            ),
            None => write!(f, "[{}] {}: {}", marker, self.rule_id, self.message),
        }
    }
}
