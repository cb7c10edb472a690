/*
 * Program Graph View
 *
 * Read-only view of the program graph produced by the (external)
 * translation front end. The engine never mutates it after construction;
 * it is shared by reference across concurrently evaluated rules.
 *
 * What the engine consumes from it:
 * - control-flow successor edges (join-point detection)
 * - defining assignments per variable (constant resolution)
 * - declared type name per variable (type matching)
 * - per-instance operation traces in program order (typestate tracking)
 */

use super::span::Span;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Node handle into the program graph
pub type NodeId = NodeIndex;

/// Value on the right-hand side of an assignment, as far as the front
/// end could classify it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignedValue {
    BoolLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    StrLiteral(String),

    /// `x = y` — value flows from another variable
    Copy(String),

    /// Call result, parameter, external input: not statically known
    Opaque,
}

/// Program graph node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgramNodeKind {
    /// `target = value`
    Assignment {
        target: String,
        value: AssignedValue,
    },

    /// Call expression `callee(args...)`; args are variable names
    Call { callee: String, args: Vec<String> },

    /// Two-way (or n-way) control-flow split
    Branch,

    /// Control-flow join point
    Join,

    FunctionEntry { name: String },
    FunctionExit { name: String },
}

/// Program graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramNode {
    pub kind: ProgramNodeKind,
    pub span: Span,
}

impl ProgramNode {
    pub fn new(kind: ProgramNodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Program graph edge kind
///
/// Call/Return edges drive WPDS push/pop; NFA tracking only follows Flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEdge {
    Flow,
    Call,
    Return,
}

/// One observed operation on a tracked instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpEvent {
    /// Base variable the operation was invoked on
    pub base: String,

    /// Method name, already stripped of qualifiers (e.g. "init")
    pub op: String,

    /// Graph node of the call, when the provider supplies one
    #[serde(skip)]
    pub node: Option<NodeId>,

    pub span: Span,

    /// Argument variable names, in call order
    pub args: Vec<String>,
}

impl OpEvent {
    pub fn new(base: impl Into<String>, op: impl Into<String>, span: Span) -> Self {
        Self {
            base: base.into(),
            op: op.into(),
            node: None,
            span,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn at_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }
}

/// One step of an instance's operation trace
///
/// Branch arms are kept structurally so the tracker can fork its state
/// set per arm and union the results at the join, instead of picking an
/// arbitrary arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraceStep {
    Op(OpEvent),

    /// Parallel control-flow arms merged at the following join point
    Branch(Vec<Vec<TraceStep>>),

    /// Entering a callee (interprocedural tracking only)
    CallEnter(String),

    /// Returning from a callee
    CallReturn(String),
}

/// Operation trace for one concrete program object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTrace {
    /// Variable holding the instance
    pub variable: String,

    /// Declared source type of the variable ("UNKNOWN" if undetermined)
    pub type_name: String,

    /// Steps in program order
    pub steps: Vec<TraceStep>,
}

impl InstanceTrace {
    pub fn new(variable: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            type_name: type_name.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<TraceStep>) -> Self {
        self.steps = steps;
        self
    }
}

/// Read-only program graph view
#[derive(Debug, Default)]
pub struct ProgramGraph {
    graph: DiGraph<ProgramNode, FlowEdge>,
    declared_types: FxHashMap<String, String>,
    traces: Vec<InstanceTrace>,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node (construction phase; the engine only reads)
    pub fn add_node(&mut self, node: ProgramNode) -> NodeId {
        self.graph.add_node(node)
    }

    /// Add a control-flow, call or return edge
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: FlowEdge) {
        self.graph.add_edge(from, to, edge);
    }

    /// Record the declared type of a variable
    pub fn set_declared_type(&mut self, variable: impl Into<String>, type_name: impl Into<String>) {
        self.declared_types
            .insert(variable.into(), type_name.into());
    }

    /// Attach an instance trace collected by the graph traversal
    pub fn add_trace(&mut self, trace: InstanceTrace) {
        self.traces.push(trace);
    }

    pub fn node(&self, id: NodeId) -> Option<&ProgramNode> {
        self.graph.node_weight(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Control-flow successors of a node
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .neighbors_directed(id, Direction::Outgoing)
            .collect()
    }

    /// Control-flow predecessors of a node
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .neighbors_directed(id, Direction::Incoming)
            .collect()
    }

    /// Declared type of a variable, "UNKNOWN" when the front end could
    /// not determine one
    pub fn declared_type(&self, variable: &str) -> &str {
        self.declared_types
            .get(variable)
            .map(String::as_str)
            .unwrap_or("UNKNOWN")
    }

    /// All instance traces in deterministic (insertion) order
    pub fn traces(&self) -> &[InstanceTrace] {
        &self.traces
    }

    /// Nearest defining assignments of `variable` strictly before `at`,
    /// walking control flow backward
    ///
    /// The walk stops at the first definition found along each backward
    /// path, so two results mean two branches with distinct definitions
    /// reach `at`.
    pub fn defining_assignments(&self, variable: &str, at: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut visited = rustc_hash::FxHashSet::default();
        let mut queue: Vec<NodeId> = self.predecessors(at);

        while let Some(id) = queue.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.node(id) else { continue };
            match &node.kind {
                ProgramNodeKind::Assignment { target, .. } if target == variable => {
                    found.push(id);
                    // definition kills the backward walk on this path
                }
                _ => queue.extend(self.predecessors(id)),
            }
        }

        // Deterministic order for a fixed graph
        found.sort();
        found
    }
}
