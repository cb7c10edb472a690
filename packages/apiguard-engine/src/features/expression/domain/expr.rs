/*
 * Expression Model
 *
 * Closed sum type covering guard predicates and order expressions.
 *
 * Order-only variants (Sequence, Repetition, Alternative, Terminal under
 * an Order wrapper) never contribute free variables to guard evaluation;
 * they contribute alphabet symbols instead. Every traversal over this
 * tree is an exhaustive match, so adding a variant is a compile-time
 * checked change.
 */

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Literal value appearing in a rule text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Int(i) => write!(f, "{}", i),
            LiteralValue::Float(x) => write!(f, "{}", x),
            LiteralValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Membership in a literal list
    In,
    /// Regex match against a string
    Like,
}

impl std::fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::In => "in",
            ComparisonOp::Like => "like",
        };
        write!(f, "{}", s)
    }
}

/// Multiplicative operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MulOp {
    Times,
    Divide,
    Mod,
}

impl std::fmt::Display for MulOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MulOp::Times => "*",
            MulOp::Divide => "/",
            MulOp::Mod => "%",
        };
        write!(f, "{}", s)
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Neg => write!(f, "-"),
        }
    }
}

/// Repetition operator of an order expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepetitionOp {
    /// Zero or more
    Star,
    /// One or more
    Plus,
    /// Zero or one
    Opt,
}

impl std::fmt::Display for RepetitionOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepetitionOp::Star => write!(f, "*"),
            RepetitionOp::Plus => write!(f, "+"),
            RepetitionOp::Opt => write!(f, "?"),
        }
    }
}

/// Expression tree
///
/// Guard variants and order variants share one type because a rule's
/// `order` clause is just another expression in the rule grammar; the
/// compiler and the evaluator each reject the other group structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(LiteralValue),

    /// Named operand, e.g. `cipher.algorithm`
    Operand(String),

    /// Built-in or modeled function call
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },

    LogicalAnd {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    LogicalOr {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    Multiplication {
        op: MulOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        inner: Box<Expression>,
    },

    LiteralList(Vec<LiteralValue>),

    /// Order-only: `left, right` (op is the separator text, e.g. ",")
    Sequence {
        left: Box<Expression>,
        op: String,
        right: Box<Expression>,
    },

    /// Order-only: `inner*`, `inner+`, `inner?`
    Repetition {
        inner: Box<Expression>,
        op: RepetitionOp,
    },

    /// Order-only: `left | right`
    Alternative {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Order-only leaf: `entity.op()`
    Terminal {
        entity: String,
        op: String,
    },

    /// Wrapper marking an order expression root
    Order(Box<Expression>),
}

impl Expression {
    /// Canonical text rendering
    ///
    /// Reproduces the rule-text form with correct operator spacing.
    /// Grouping is preserved wherever a child binds looser than its
    /// parent operator: a repetition parenthesizes a sequence or
    /// alternative child, and an alternative parenthesizes a sequence
    /// operand, so rendered text re-parses to an equivalent tree.
    /// This text is used verbatim in finding messages.
    pub fn to_text(&self) -> String {
        match self {
            Expression::Literal(lit) => lit.to_string(),
            Expression::Operand(name) => name.clone(),
            Expression::FunctionCall { name, args } => {
                let rendered: Vec<String> = args.iter().map(Expression::to_text).collect();
                format!("{}({})", name, rendered.join(", "))
            }
            Expression::LogicalAnd { left, right } => {
                format!("{} && {}", left.to_text(), right.to_text())
            }
            Expression::LogicalOr { left, right } => {
                format!("{} || {}", left.to_text(), right.to_text())
            }
            Expression::Comparison { op, left, right } => {
                format!("{} {} {}", left.to_text(), op, right.to_text())
            }
            Expression::Multiplication { op, left, right } => {
                format!("{} {} {}", left.to_text(), op, right.to_text())
            }
            Expression::Unary { op, inner } => format!("{}{}", op, inner.to_text()),
            Expression::LiteralList(values) => {
                let rendered: Vec<String> = values.iter().map(LiteralValue::to_string).collect();
                format!("[ {} ]", rendered.join(", "))
            }
            Expression::Sequence { left, op, right } => {
                format!("{}{} {}", left.to_text(), op, right.to_text())
            }
            Expression::Repetition { inner, op } => {
                // () can be omitted unless the child binds looser than
                // the postfix operator (sequences and alternatives do)
                if matches!(
                    inner.as_ref(),
                    Expression::Sequence { .. } | Expression::Alternative { .. }
                ) {
                    format!("({}){}", inner.to_text(), op)
                } else {
                    format!("{}{}", inner.to_text(), op)
                }
            }
            Expression::Alternative { left, right } => {
                // a sequence operand binds looser than "|"
                let operand = |e: &Expression| {
                    if matches!(e, Expression::Sequence { .. }) {
                        format!("({})", e.to_text())
                    } else {
                        e.to_text()
                    }
                };
                format!("{} | {}", operand(left), operand(right))
            }
            Expression::Terminal { entity, op } => format!("{}.{}()", entity, op),
            Expression::Order(inner) => format!("order {}", inner.to_text()),
        }
    }

    /// Collect every free variable of a guard expression
    ///
    /// Order subtrees contribute nothing; literals and literal lists
    /// contribute nothing.
    pub fn collect_vars(&self, vars: &mut FxHashSet<String>) {
        match self {
            Expression::Order(_)
            | Expression::Sequence { .. }
            | Expression::Repetition { .. }
            | Expression::Alternative { .. }
            | Expression::Terminal { .. } => {
                // order expressions will not contain vars
            }
            Expression::Literal(_) | Expression::LiteralList(_) => {}
            Expression::Operand(name) => {
                vars.insert(name.clone());
            }
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_vars(vars);
                }
            }
            Expression::LogicalAnd { left, right }
            | Expression::LogicalOr { left, right }
            | Expression::Comparison { left, right, .. }
            | Expression::Multiplication { left, right, .. } => {
                left.collect_vars(vars);
                right.collect_vars(vars);
            }
            Expression::Unary { inner, .. } => inner.collect_vars(vars),
        }
    }

    /// Collect the (entity, operation) alphabet of an order expression
    ///
    /// Walks only order nodes; the alphabet must be fully known before
    /// automaton compilation.
    pub fn collect_alphabet(&self, symbols: &mut FxHashSet<(String, String)>) {
        match self {
            Expression::Terminal { entity, op } => {
                symbols.insert((entity.clone(), op.clone()));
            }
            Expression::Sequence { left, right, .. } | Expression::Alternative { left, right } => {
                left.collect_alphabet(symbols);
                right.collect_alphabet(symbols);
            }
            Expression::Repetition { inner, .. } | Expression::Order(inner) => {
                inner.collect_alphabet(symbols);
            }
            _ => {}
        }
    }

    /// True for variants only meaningful beneath an `Order` wrapper
    pub fn is_order_only(&self) -> bool {
        matches!(
            self,
            Expression::Sequence { .. }
                | Expression::Repetition { .. }
                | Expression::Alternative { .. }
                | Expression::Terminal { .. }
                | Expression::Order(_)
        )
    }

    // Convenience constructors keep rule fixtures readable.

    pub fn operand(name: impl Into<String>) -> Self {
        Expression::Operand(name.into())
    }

    pub fn terminal(entity: impl Into<String>, op: impl Into<String>) -> Self {
        Expression::Terminal {
            entity: entity.into(),
            op: op.into(),
        }
    }

    pub fn seq(left: Expression, right: Expression) -> Self {
        Expression::Sequence {
            left: Box::new(left),
            op: ",".to_string(),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::LogicalAnd {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::LogicalOr {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn cmp(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Expression::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn alt(left: Expression, right: Expression) -> Self {
        Expression::Alternative {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn rep(inner: Expression, op: RepetitionOp) -> Self {
        Expression::Repetition {
            inner: Box::new(inner),
            op,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
