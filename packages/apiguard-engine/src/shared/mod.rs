/*
 * Shared Models
 *
 * Cross-feature data model: source spans, the read-only program graph
 * view, pre-parsed rules, and findings.
 */

pub mod models;

pub use models::{
    AssignedValue, EntityBinding, Finding, FlowEdge, InstanceTrace, NodeId, OpEvent, ProgramGraph,
    ProgramNode, ProgramNodeKind, Rule, Span, TraceStep,
};
