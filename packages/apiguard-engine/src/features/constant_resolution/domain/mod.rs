//! Constant value domain model

pub mod value;

pub use value::{strip_quoted_char, strip_quoted_string, ConstantValue, ValueKind};
