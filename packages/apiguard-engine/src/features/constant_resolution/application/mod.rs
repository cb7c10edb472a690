//! Constant resolution

pub mod resolver;

pub use resolver::ConstantResolver;
