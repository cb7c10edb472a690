/*
 * Constant Resolution
 *
 * Resolves program expressions to concrete values (or Unknown) via
 * bounded backward data-flow over defining assignments.
 *
 * Architecture:
 * - Domain: ConstantValue (tagged value with provenance)
 * - Application: ConstantResolver (bounded backward walk, memoized)
 */

pub mod application;
pub mod domain;

pub use application::resolver::ConstantResolver;
pub use domain::{ConstantValue, ValueKind};
