//! Feature modules (vertical slices of the rule-evaluation core)

pub mod constant_resolution;
pub mod expression;
pub mod order;
pub mod reporting;
pub mod type_matching;
pub mod typestate;
