//! Expression domain model

pub mod expr;

pub use expr::{ComparisonOp, Expression, LiteralValue, MulOp, RepetitionOp, UnaryOp};
