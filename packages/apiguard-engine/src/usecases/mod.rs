//! Usecase layer (rule evaluation orchestration)

pub mod evaluation;

pub use evaluation::RuleEvaluationService;
