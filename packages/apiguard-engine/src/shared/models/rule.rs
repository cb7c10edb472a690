//! Rule model
//!
//! Rules arrive pre-parsed from the rule source; grammar-level text
//! parsing is outside this core. A rule is immutable after load and is
//! safely shared across workers.

use crate::features::expression::domain::Expression;
use serde::{Deserialize, Serialize};

/// Binding of a rule entity role to a declared source type
///
/// E.g. role "c" bound to type "Botan::Cipher_Mode".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBinding {
    /// Role name used by guard operands and order terminals
    pub name: String,

    /// Declared type the role applies to
    pub type_name: String,
}

impl EntityBinding {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Declarative rule: guard expressions plus an optional order expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,

    /// Entity roles this rule tracks
    pub entities: Vec<EntityBinding>,

    /// Guard expressions (argument constraints), all must hold
    pub guards: Vec<Expression>,

    /// Permitted call ordering; None when the rule is guards-only
    pub order: Option<Expression>,

    /// Identifiers reported on failure
    pub onfail: Vec<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            guards: Vec::new(),
            order: None,
            onfail: Vec::new(),
        }
    }

    pub fn with_entity(mut self, binding: EntityBinding) -> Self {
        self.entities.push(binding);
        self
    }

    pub fn with_guard(mut self, guard: Expression) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn with_order(mut self, order: Expression) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_onfail(mut self, id: impl Into<String>) -> Self {
        self.onfail.push(id.into());
        self
    }

    /// First onfail identifier, falling back to the rule name
    pub fn primary_onfail(&self) -> &str {
        self.onfail.first().map(String::as_str).unwrap_or(&self.name)
    }
}
