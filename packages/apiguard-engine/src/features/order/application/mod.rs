//! Order expression compilation

pub mod compiler;
pub mod wpds;

pub use compiler::compile_order;
pub use wpds::{Configuration, PushdownSystem, Weight};
