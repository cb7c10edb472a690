/*
 * Expression Evaluator
 *
 * Evaluates guard expression trees with three-valued logic.
 *
 * Unknown is short-circuit-absorbing:
 *   false && unknown = false      true || unknown = true
 *   true  && unknown = unknown    false || unknown = unknown
 *
 * Errors are reserved for structurally malformed trees (an order-only
 * node reached during guard evaluation). Unresolved operands never
 * error; they evaluate to Unknown and poison onward. A malformed
 * operand of a logical connective degrades to Unknown in place, so
 * `false && <malformed>` still resolves to false.
 */

use crate::errors::{EngineError, Result};
use crate::features::constant_resolution::domain::{ConstantValue, ValueKind};
use crate::features::expression::domain::{
    ComparisonOp, Expression, LiteralValue, MulOp, UnaryOp,
};
use crate::features::expression::infrastructure::builtins::builtin;
use crate::features::expression::ports::EvalContext;
use regex::Regex;
use tracing::{debug, warn};

/// Evaluate a guard expression
pub fn evaluate(expr: &Expression, ctx: &dyn EvalContext) -> Result<ConstantValue> {
    match expr {
        Expression::Literal(lit) => Ok(literal_value(lit)),

        Expression::LiteralList(values) => Ok(ConstantValue::list(
            values.iter().map(literal_value).collect(),
        )),

        Expression::Operand(name) => Ok(ctx.resolve_operand(name)),

        Expression::FunctionCall { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, ctx)?);
            }
            match builtin(name) {
                Some(f) => Ok(f(&evaluated)),
                None => Ok(ctx.resolve_call(name, &evaluated)),
            }
        }

        Expression::LogicalAnd { left, right } => {
            let l = operand_value(left, ctx);
            if l.as_bool() == Some(false) {
                return Ok(ConstantValue::bool_(false));
            }
            let r = operand_value(right, ctx);
            if r.as_bool() == Some(false) {
                return Ok(ConstantValue::bool_(false));
            }
            match (l.as_bool(), r.as_bool()) {
                (Some(true), Some(true)) => Ok(ConstantValue::bool_(true)),
                _ => Ok(ConstantValue::unknown()),
            }
        }

        Expression::LogicalOr { left, right } => {
            let l = operand_value(left, ctx);
            if l.as_bool() == Some(true) {
                return Ok(ConstantValue::bool_(true));
            }
            let r = operand_value(right, ctx);
            if r.as_bool() == Some(true) {
                return Ok(ConstantValue::bool_(true));
            }
            match (l.as_bool(), r.as_bool()) {
                (Some(false), Some(false)) => Ok(ConstantValue::bool_(false)),
                _ => Ok(ConstantValue::unknown()),
            }
        }

        Expression::Comparison { op, left, right } => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            Ok(compare(*op, &l, &r))
        }

        Expression::Multiplication { op, left, right } => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            Ok(multiply(*op, &l, &r))
        }

        Expression::Unary { op, inner } => {
            let v = evaluate(inner, ctx)?;
            Ok(match op {
                UnaryOp::Not => match v.as_bool() {
                    Some(b) => ConstantValue::bool_(!b),
                    None => ConstantValue::unknown(),
                },
                UnaryOp::Neg => match &v.kind {
                    ValueKind::Int(i) => ConstantValue::int(-i),
                    ValueKind::Float(f) => ConstantValue::float(-f),
                    _ => ConstantValue::unknown(),
                },
            })
        }

        Expression::Sequence { .. }
        | Expression::Repetition { .. }
        | Expression::Alternative { .. }
        | Expression::Terminal { .. }
        | Expression::Order(_) => Err(EngineError::evaluation(format!(
            "order expression '{}' cannot be evaluated as a guard",
            expr.to_text()
        ))),
    }
}

/// Evaluate a logical operand, degrading a malformed subtree in place
///
/// The Unknown stays local to the offending operand: a sound
/// short-circuit on the sibling still decides the connective.
fn operand_value(expr: &Expression, ctx: &dyn EvalContext) -> ConstantValue {
    match evaluate(expr, ctx) {
        Ok(value) => value,
        Err(err) => {
            warn!(expression = %expr, %err, "malformed operand; treating as unknown");
            ConstantValue::unknown()
        }
    }
}

/// Evaluate, degrading a malformed subtree to Unknown with a warning
///
/// This is the entry point the orchestration layer uses: one broken
/// guard never aborts the analysis of other guards or rules.
pub fn evaluate_or_unknown(expr: &Expression, ctx: &dyn EvalContext) -> ConstantValue {
    match evaluate(expr, ctx) {
        Ok(value) => value,
        Err(err) => {
            warn!(expression = %expr, %err, "guard evaluation failed; treating as unknown");
            ConstantValue::unknown()
        }
    }
}

fn literal_value(lit: &LiteralValue) -> ConstantValue {
    match lit {
        LiteralValue::Bool(b) => ConstantValue::bool_(*b),
        LiteralValue::Int(i) => ConstantValue::int(*i),
        LiteralValue::Float(f) => ConstantValue::float(*f),
        LiteralValue::Str(s) => ConstantValue::str_(s.clone()),
    }
}

/// Three-valued comparison
///
/// Operands must resolve to compatible kinds (numeric-numeric or
/// string-string); mismatched or unresolved operands yield Unknown.
fn compare(op: ComparisonOp, left: &ConstantValue, right: &ConstantValue) -> ConstantValue {
    if left.is_unknown() || right.is_unknown() {
        return ConstantValue::unknown();
    }
    match op {
        ComparisonOp::Eq => match left.same_value(right) {
            Some(eq) => ConstantValue::bool_(eq),
            None => ConstantValue::unknown(),
        },
        ComparisonOp::Neq => match left.same_value(right) {
            Some(eq) => ConstantValue::bool_(!eq),
            None => ConstantValue::unknown(),
        },
        ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge => {
            order_compare(op, left, right)
        }
        ComparisonOp::In => membership(left, right),
        ComparisonOp::Like => like_match(left, right),
    }
}

fn order_compare(op: ComparisonOp, left: &ConstantValue, right: &ConstantValue) -> ConstantValue {
    let ordering = match (&left.kind, &right.kind) {
        (ValueKind::Str(a), ValueKind::Str(b)) => a.partial_cmp(b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    let Some(ordering) = ordering else {
        return ConstantValue::unknown();
    };
    let holds = match op {
        ComparisonOp::Lt => ordering.is_lt(),
        ComparisonOp::Le => ordering.is_le(),
        ComparisonOp::Gt => ordering.is_gt(),
        ComparisonOp::Ge => ordering.is_ge(),
        _ => unreachable!("order_compare called with non-ordering op"),
    };
    ConstantValue::bool_(holds)
}

/// `x in [ a, b, c ]`
///
/// True as soon as one member matches; Unknown when no member matched
/// but at least one membership test was itself undecidable.
fn membership(left: &ConstantValue, right: &ConstantValue) -> ConstantValue {
    let Some(items) = right.as_list() else {
        return ConstantValue::unknown();
    };
    let mut saw_undecidable = false;
    for item in items {
        match left.same_value(item) {
            Some(true) => return ConstantValue::bool_(true),
            Some(false) => {}
            None => saw_undecidable = true,
        }
    }
    if saw_undecidable {
        ConstantValue::unknown()
    } else {
        ConstantValue::bool_(false)
    }
}

/// `x like "pattern"` — anchored regex match
fn like_match(left: &ConstantValue, right: &ConstantValue) -> ConstantValue {
    let (Some(text), Some(pattern)) = (left.as_str(), right.as_str()) else {
        return ConstantValue::unknown();
    };
    match Regex::new(&format!("^(?:{})$", pattern)) {
        Ok(re) => ConstantValue::bool_(re.is_match(text)),
        Err(err) => {
            debug!(pattern, %err, "invalid like-pattern");
            ConstantValue::unknown()
        }
    }
}

fn multiply(op: MulOp, left: &ConstantValue, right: &ConstantValue) -> ConstantValue {
    if let (ValueKind::Int(a), ValueKind::Int(b)) = (&left.kind, &right.kind) {
        let result = match op {
            MulOp::Times => a.checked_mul(*b),
            MulOp::Divide => a.checked_div(*b),
            MulOp::Mod => a.checked_rem(*b),
        };
        return match result {
            Some(v) => ConstantValue::int(v),
            None => ConstantValue::unknown(),
        };
    }
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => match op {
            MulOp::Times => ConstantValue::float(a * b),
            MulOp::Divide if b != 0.0 => ConstantValue::float(a / b),
            MulOp::Mod if b != 0.0 => ConstantValue::float(a % b),
            _ => ConstantValue::unknown(),
        },
        _ => ConstantValue::unknown(),
    }
}
