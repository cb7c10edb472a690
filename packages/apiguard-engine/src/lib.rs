/*
 * ApiGuard Engine - Rule-Based Security-API Analysis Core
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (ProgramGraph, Rule, Finding, Span)
 * - features/    : Vertical slices (expression → order → typestate →
 *                  constant_resolution → type_matching → reporting)
 * - usecases/    : Orchestration (RuleEvaluationService)
 * - config/      : Engine configuration surface
 *
 * The engine consumes a read-only program graph produced by a language
 * front end and a set of pre-parsed rules, and emits findings: either
 * violations or confirmations of correct API use. Rules evaluate in
 * parallel over rayon workers; each tracked instance is stepped by
 * exactly one worker.
 */

// Crate-level lint configuration
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Shared models and utilities
pub mod shared;

/// Feature modules (rule-evaluation slices)
pub mod features;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

/// Usecase layer (RuleEvaluationService)
pub mod usecases;

// Re-exports for Public API

pub use config::{EngineConfig, TypestateMode};
pub use errors::{EngineError, Result};
pub use features::reporting::{Report, ReportStats};
pub use shared::models::{
    EntityBinding, Finding, InstanceTrace, OpEvent, ProgramGraph, ProgramNode, ProgramNodeKind,
    Rule, Span, TraceStep,
};
pub use usecases::RuleEvaluationService;
