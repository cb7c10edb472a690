/*
 * Rule Evaluation Service
 *
 * Orchestrates the whole core: compiles one automaton per rule, finds
 * the instances each rule applies to, replays their traces through the
 * typestate tracker, evaluates guard expressions via the constant
 * resolver, and funnels everything through the finding collector.
 *
 * Isolation: rules are independent. A rule whose order expression fails
 * to compile is skipped with a warning while all other rules proceed;
 * a malformed guard degrades to Unknown for that guard only. Automata
 * are immutable after compilation and shared across workers, so rule
 * evaluation parallelizes across rayon workers while each instance is
 * stepped sequentially by exactly one worker.
 */

use crate::config::EngineConfig;
use crate::errors::Result;
use crate::features::constant_resolution::application::resolver::ConstantResolver;
use crate::features::constant_resolution::domain::ConstantValue;
use crate::features::expression::application::evaluator::evaluate_or_unknown;
use crate::features::expression::domain::Expression;
use crate::features::expression::ports::EvalContext;
use crate::features::order::application::compiler::compile_order;
use crate::features::order::domain::Automaton;
use crate::features::reporting::{FindingCollector, Report};
use crate::features::type_matching::is_sub_type_of;
use crate::features::typestate::application::tracker::TypestateTracker;
use crate::shared::models::{
    Finding, InstanceTrace, NodeId, ProgramGraph, Rule, Span, TraceStep,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rule-evaluation front door
pub struct RuleEvaluationService {
    config: EngineConfig,
}

/// Rule with its compiled automaton (None for guards-only rules)
struct CompiledRule<'r> {
    rule: &'r Rule,
    automaton: Option<Arc<Automaton>>,
}

impl RuleEvaluationService {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Evaluate every rule against the program graph
    ///
    /// Findings computed before the timeout fires are still returned.
    pub fn evaluate(&self, graph: &ProgramGraph, rules: &[Rule]) -> Report {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);
        let cancelled = move || deadline.map_or(false, |d| Instant::now() >= d);

        let resolver = ConstantResolver::new(graph, self.config.hop_budget);

        // One immutable automaton per rule; a malformed order expression
        // is fatal only to its own rule.
        let compiled: Vec<CompiledRule> = rules
            .par_iter()
            .map(|rule| match &rule.order {
                None => Some(CompiledRule {
                    rule,
                    automaton: None,
                }),
                Some(order) => match compile_order(&rule.name, order) {
                    Ok(automaton) => Some(CompiledRule {
                        rule,
                        automaton: Some(Arc::new(automaton)),
                    }),
                    Err(err) => {
                        warn!(rule = %rule.name, %err, "skipping rule");
                        None
                    }
                },
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        let skipped = rules.len() - compiled.len();

        // Rules evaluate in parallel; each instance is single-writer.
        let per_rule: Vec<Vec<Finding>> = compiled
            .par_iter()
            .map(|compiled| self.evaluate_rule(compiled, graph, &resolver, &cancelled))
            .collect();

        let mut collector = FindingCollector::new();
        for _ in 0..skipped {
            collector.record_skipped_rule();
        }
        for findings in per_rule {
            collector.add_all(findings);
        }

        info!(
            rules = rules.len(),
            skipped,
            findings = collector.findings().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rule evaluation finished"
        );
        collector.into_report(self.config.disable_good_findings)
    }

    fn evaluate_rule(
        &self,
        compiled: &CompiledRule,
        graph: &ProgramGraph,
        resolver: &ConstantResolver,
        cancelled: &(dyn Fn() -> bool + Sync),
    ) -> Vec<Finding> {
        let rule = compiled.rule;
        let mut findings = Vec::new();

        for trace in graph.traces() {
            if cancelled() {
                break;
            }
            let Some(role) = self.matching_role(rule, trace, graph) else {
                continue;
            };
            debug!(rule = %rule.name, variable = %trace.variable, role, "tracking instance");

            // Typestate: replay the trace when the rule declares an order
            if let Some(automaton) = &compiled.automaton {
                let order_text = rule
                    .order
                    .as_ref()
                    .map(Expression::to_text)
                    .unwrap_or_default();
                let tracker = TypestateTracker::new(
                    rule.name.clone(),
                    rule.primary_onfail().to_string(),
                    order_text,
                    Arc::clone(automaton),
                    self.config.typestate_mode,
                );
                let mut instance = tracker.new_instance(trace.variable.clone(), role.clone());
                findings.extend(tracker.replay(&mut instance, &trace.steps, &cancelled));
                if !cancelled() {
                    // live range ends with the trace
                    findings.extend(tracker.finish(&instance));
                }
            }

            // Guards: argument constraints evaluated per instance
            if !rule.guards.is_empty() {
                let ctx = GuardContext {
                    resolver,
                    bindings: self.role_bindings(rule, trace),
                    at: last_op_node(&trace.steps),
                };
                let location = last_op_span(&trace.steps);
                for guard in &rule.guards {
                    findings.push(self.guard_finding(rule, guard, &ctx, location.clone()));
                }
            }
        }

        findings
    }

    /// First entity role of the rule whose declared type the trace's
    /// type satisfies
    fn matching_role(
        &self,
        rule: &Rule,
        trace: &InstanceTrace,
        graph: &ProgramGraph,
    ) -> Option<String> {
        let observed = if trace.type_name.is_empty() {
            graph.declared_type(&trace.variable).to_string()
        } else {
            trace.type_name.clone()
        };
        rule.entities
            .iter()
            .find(|binding| is_sub_type_of(&observed, &binding.type_name))
            .map(|binding| binding.name.clone())
    }

    fn role_bindings(&self, rule: &Rule, trace: &InstanceTrace) -> FxHashMap<String, String> {
        rule.entities
            .iter()
            .map(|binding| (binding.name.clone(), trace.variable.clone()))
            .collect()
    }

    fn guard_finding(
        &self,
        rule: &Rule,
        guard: &Expression,
        ctx: &dyn EvalContext,
        location: Option<Span>,
    ) -> Finding {
        let value = evaluate_or_unknown(guard, ctx);
        let locations: Vec<Span> = location.into_iter().collect();
        match value.as_bool() {
            Some(true) => Finding::good(
                rule.name.clone(),
                rule.primary_onfail().to_string(),
                locations,
                format!("Verified: {}", guard.to_text()),
            ),
            Some(false) => Finding::problem(
                rule.name.clone(),
                rule.primary_onfail().to_string(),
                locations,
                format!("Violation against rule: {}", guard.to_text()),
            ),
            // Unverifiable code is flagged, not silently skipped
            None => Finding::problem(
                rule.name.clone(),
                rule.primary_onfail().to_string(),
                locations,
                format!("Rule could not be verified: {}", guard.to_text()),
            ),
        }
    }
}

/// Guard evaluation context over the program graph
///
/// Operand `role.attr` maps to the graph variable `<instance>.attr`
/// resolved at the instance's last observed operation.
struct GuardContext<'a, 'g> {
    resolver: &'a ConstantResolver<'g>,
    bindings: FxHashMap<String, String>,
    at: Option<NodeId>,
}

impl EvalContext for GuardContext<'_, '_> {
    fn resolve_operand(&self, name: &str) -> ConstantValue {
        let Some(at) = self.at else {
            return ConstantValue::unknown();
        };
        let variable = match name.split_once('.') {
            Some((role, attr)) => match self.bindings.get(role) {
                Some(instance_var) => format!("{}.{}", instance_var, attr),
                None => return ConstantValue::unknown(),
            },
            None => match self.bindings.get(name) {
                Some(instance_var) => instance_var.clone(),
                None => name.to_string(),
            },
        };
        self.resolver.resolve(&variable, at)
    }

    fn resolve_call(&self, _name: &str, _args: &[ConstantValue]) -> ConstantValue {
        // modeled return values need data-flow outside this core
        ConstantValue::unknown()
    }
}

fn last_op_node(steps: &[TraceStep]) -> Option<NodeId> {
    let mut last = None;
    for step in steps {
        match step {
            TraceStep::Op(ev) => {
                if ev.node.is_some() {
                    last = ev.node;
                }
            }
            TraceStep::Branch(arms) => {
                for arm in arms {
                    if let Some(node) = last_op_node(arm) {
                        last = Some(node);
                    }
                }
            }
            _ => {}
        }
    }
    last
}

fn last_op_span(steps: &[TraceStep]) -> Option<Span> {
    let mut last = None;
    for step in steps {
        match step {
            TraceStep::Op(ev) => last = Some(ev.span.clone()),
            TraceStep::Branch(arms) => {
                for arm in arms {
                    if let Some(span) = last_op_span(arm) {
                        last = Some(span);
                    }
                }
            }
            _ => {}
        }
    }
    last
}
