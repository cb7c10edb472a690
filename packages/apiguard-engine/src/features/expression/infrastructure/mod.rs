//! Builtin predicates and the order-expression parser

pub mod builtins;
pub mod parser;

pub use builtins::{builtin, BuiltinFn};
pub use parser::parse_order;
