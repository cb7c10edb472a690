//! Shared model types (single source of truth for cross-feature data)

pub mod finding;
pub mod graph;
pub mod rule;
pub mod span;

pub use finding::Finding;
pub use graph::{
    AssignedValue, FlowEdge, InstanceTrace, NodeId, OpEvent, ProgramGraph, ProgramNode,
    ProgramNodeKind, TraceStep,
};
pub use rule::{EntityBinding, Rule};
pub use span::Span;
