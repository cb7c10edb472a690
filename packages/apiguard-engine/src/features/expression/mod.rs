/*
 * Expression Feature
 *
 * Guard-expression model and three-valued evaluator.
 *
 * Architecture:
 * - Domain: Expression sum type, canonical renderer, static traversals
 * - Application: evaluator (three-valued logic)
 * - Infrastructure: builtin predicate registry, order-expression parser
 * - Ports: EvalContext trait
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::evaluator::{evaluate, evaluate_or_unknown};
pub use domain::{ComparisonOp, Expression, LiteralValue, MulOp, RepetitionOp, UnaryOp};
pub use infrastructure::parser::parse_order;
pub use ports::{EvalContext, MapContext};
