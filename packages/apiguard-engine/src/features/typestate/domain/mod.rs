//! Typestate domain model

pub mod instance;

pub use instance::TrackedInstance;
