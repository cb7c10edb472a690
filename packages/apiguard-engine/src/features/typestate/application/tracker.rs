/*
 * Typestate Tracker
 *
 * Replays a tracked instance's operation trace against its rule's
 * compiled automaton.
 *
 * Semantics:
 * - Operations outside the automaton's alphabet never match a
 *   transition; they are ignored, not errors.
 * - If no edge matches from any active state, the instance moves to the
 *   explicit error sink and a violation finding is emitted immediately,
 *   citing the unmatched operation and the alphabet expected there.
 * - Passing through an accepting state never stops tracking.
 * - At a control-flow join, the merged state set is the union of the
 *   arms' post-states (the same subset merge as the epsilon closure),
 *   never an arbitrary arm.
 * - NFA mode is intraprocedural: operations inside a callee frame are
 *   invisible. WPDS mode pushes/pops at call boundaries and keeps
 *   tracking through them.
 *
 * Cancellation is checked between instance-steps, never mid-transition,
 * so a timeout yields a well-defined partial result.
 */

use crate::config::TypestateMode;
use crate::features::order::application::wpds::{Configuration, PushdownSystem};
use crate::features::order::domain::{Automaton, Symbol};
use crate::features::typestate::domain::TrackedInstance;
use crate::shared::models::{Finding, OpEvent, Span, TraceStep};
use std::sync::Arc;
use tracing::debug;

/// Cancellation probe; true means stop between steps
pub type CancelCheck<'a> = dyn Fn() -> bool + 'a;

/// Outcome of one tracking step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// At least one edge matched; state advanced
    Advanced,

    /// Operation outside the alphabet, or instance already in the sink
    Ignored,

    /// No edge matched; instance moved to the error sink
    Violation(Finding),
}

/// Per-rule typestate tracker, shared by every instance of the rule
pub struct TypestateTracker {
    pds: PushdownSystem,
    mode: TypestateMode,
    rule_name: String,
    onfail: String,
    order_text: String,
}

impl TypestateTracker {
    pub fn new(
        rule_name: impl Into<String>,
        onfail: impl Into<String>,
        order_text: impl Into<String>,
        automaton: Arc<Automaton>,
        mode: TypestateMode,
    ) -> Self {
        Self {
            pds: PushdownSystem::new(automaton),
            mode,
            rule_name: rule_name.into(),
            onfail: onfail.into(),
            order_text: order_text.into(),
        }
    }

    pub fn automaton(&self) -> &Automaton {
        self.pds.automaton()
    }

    /// Create a tracked instance at the automaton's start configuration
    pub fn new_instance(
        &self,
        variable: impl Into<String>,
        entity_role: impl Into<String>,
    ) -> TrackedInstance {
        TrackedInstance::new(
            self.rule_name.clone(),
            variable,
            entity_role,
            self.pds.initial(),
        )
    }

    /// Apply one observed operation to an instance
    pub fn step(&self, instance: &mut TrackedInstance, event: &OpEvent) -> StepOutcome {
        if instance.sink {
            // sink is absorbing; the violation was already reported
            return StepOutcome::Ignored;
        }

        let symbol = Symbol::new(instance.entity_role.clone(), event.op.clone());
        if !self.automaton().in_alphabet(&symbol) {
            debug!(op = %symbol, rule = %self.rule_name, "operation outside alphabet, ignored");
            return StepOutcome::Ignored;
        }

        let next = self.pds.step(&instance.config, &symbol);
        #[cfg(feature = "trace")]
        tracing::trace!(
            op = %symbol,
            from = ?instance.config.states,
            to = ?next.states,
            "typestate transition"
        );
        if next.states.is_empty() {
            let finding = self.violation_finding(instance, event);
            instance.sink = true;
            instance.config = next;
            return StepOutcome::Violation(finding);
        }

        instance.config = next;
        instance.history.push(event.clone());
        StepOutcome::Advanced
    }

    /// Merge two state branches of the same instance (join point)
    pub fn merge(&self, a: &Configuration, b: &Configuration) -> Configuration {
        self.pds.merge(a, b)
    }

    /// Replay a whole trace, collecting findings along the way
    ///
    /// Returns the findings produced so far even when cancelled.
    pub fn replay(
        &self,
        instance: &mut TrackedInstance,
        steps: &[TraceStep],
        cancel: &CancelCheck,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        self.walk(instance, steps, 0, &mut findings, cancel);
        findings
    }

    fn walk(
        &self,
        instance: &mut TrackedInstance,
        steps: &[TraceStep],
        depth: usize,
        findings: &mut Vec<Finding>,
        cancel: &CancelCheck,
    ) {
        let mut depth = depth;
        for step in steps {
            if cancel() {
                return;
            }
            match step {
                TraceStep::Op(event) => {
                    if self.mode == TypestateMode::Nfa && depth > 0 {
                        // intraprocedural backend: callee bodies invisible
                        continue;
                    }
                    if let StepOutcome::Violation(finding) = self.step(instance, event) {
                        findings.push(finding);
                    }
                }
                TraceStep::Branch(arms) => {
                    self.walk_branch(instance, arms, depth, findings, cancel);
                }
                TraceStep::CallEnter(frame) => match self.mode {
                    TypestateMode::Wpds => {
                        instance.config = self.pds.push(&instance.config, frame.clone());
                    }
                    TypestateMode::Nfa => depth += 1,
                },
                TraceStep::CallReturn(frame) => match self.mode {
                    TypestateMode::Wpds => {
                        instance.config = self.pds.pop(&instance.config, frame);
                    }
                    TypestateMode::Nfa => depth = depth.saturating_sub(1),
                },
            }
        }
    }

    fn walk_branch(
        &self,
        instance: &mut TrackedInstance,
        arms: &[Vec<TraceStep>],
        depth: usize,
        findings: &mut Vec<Finding>,
        cancel: &CancelCheck,
    ) {
        let fork_config = instance.config.clone();
        let fork_sink = instance.sink;
        let mut merged: Option<Configuration> = None;
        let mut any_live = false;

        for arm in arms {
            instance.config = fork_config.clone();
            instance.sink = fork_sink;
            self.walk(instance, arm, depth, findings, cancel);
            if !instance.sink {
                any_live = true;
            }
            merged = Some(match merged.take() {
                None => instance.config.clone(),
                Some(prev) => self.merge(&prev, &instance.config),
            });
        }

        if let Some(merged) = merged {
            instance.sink = !any_live || merged.states.is_empty();
            instance.config = merged;
        }
    }

    /// Finalize an instance at the end of its live range
    ///
    /// Always computes the true outcome; good-finding suppression is a
    /// presentation-time filter applied by the reporting boundary.
    pub fn finish(&self, instance: &TrackedInstance) -> Option<Finding> {
        if instance.sink {
            // violation already emitted when the sink was entered
            return None;
        }
        let locations: Vec<Span> = instance.last_span().cloned().into_iter().collect();
        if self.automaton().is_accepting(&instance.config.states) {
            Some(Finding::good(
                self.rule_name.clone(),
                self.onfail.clone(),
                locations,
                format!("Verified {}", self.order_text),
            ))
        } else {
            let expected = self.expected_text(&instance.config);
            Some(Finding::problem(
                self.rule_name.clone(),
                self.onfail.clone(),
                locations,
                format!(
                    "Incomplete call sequence for '{}': expected one of: {}",
                    instance.variable, expected
                ),
            ))
        }
    }

    fn violation_finding(&self, instance: &TrackedInstance, event: &OpEvent) -> Finding {
        let expected = self.expected_text(&instance.config);
        Finding::problem(
            self.rule_name.clone(),
            self.onfail.clone(),
            vec![event.span.clone()],
            format!(
                "Violation against Order: call to {}() is not allowed. Expected one of: {}",
                event.op, expected
            ),
        )
    }

    fn expected_text(&self, config: &Configuration) -> String {
        let expected = self.automaton().expected_symbols(&config.states);
        if expected.is_empty() {
            "<end of sequence>".to_string()
        } else {
            expected
                .iter()
                .map(Symbol::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expression::domain::{Expression as E, RepetitionOp};
    use crate::features::order::application::compiler::compile_order;

    fn never() -> impl Fn() -> bool {
        || false
    }

    fn tracker(order: E, mode: TypestateMode) -> TypestateTracker {
        let wrapped = E::Order(Box::new(order));
        let automaton = Arc::new(compile_order("TestRule", &wrapped).unwrap());
        TypestateTracker::new(
            "TestRule",
            "TestFail",
            wrapped.to_text(),
            automaton,
            mode,
        )
    }

    fn op(name: &str, line: usize) -> TraceStep {
        TraceStep::Op(OpEvent::new("cipher", name, Span::line("test.cpp", line)))
    }

    fn three_step() -> E {
        E::seq(
            E::seq(E::terminal("c", "init"), E::terminal("c", "encrypt")),
            E::terminal("c", "final"),
        )
    }

    #[test]
    fn test_exact_sequence_accepts_with_one_good_finding() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("init", 1), op("encrypt", 2), op("final", 3)];

        let findings = tracker.replay(&mut inst, &steps, &never());
        assert!(findings.is_empty());

        let finish = tracker.finish(&inst).expect("outcome expected");
        assert!(!finish.is_problem());
        assert_eq!(finish.rule_id, "TestRule");
    }

    #[test]
    fn test_missing_leading_operation_is_violation() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("encrypt", 5)];

        let findings = tracker.replay(&mut inst, &steps, &never());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].is_problem());
        assert!(findings[0].message.contains("encrypt()"));
        assert!(findings[0].message.contains("c.init()"));
        assert!(inst.sink);

        // sink means finish() adds nothing further
        assert!(tracker.finish(&inst).is_none());
    }

    #[test]
    fn test_sink_is_absorbing() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("encrypt", 5), op("final", 6), op("init", 7)];

        let findings = tracker.replay(&mut inst, &steps, &never());
        // exactly one violation, later operations are absorbed
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_alphabet_external_operation_ignored() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let ev = OpEvent::new("cipher", "set_debug_name", Span::line("test.cpp", 1));
        assert_eq!(tracker.step(&mut inst, &ev), StepOutcome::Ignored);
        assert!(!inst.sink);
    }

    #[test]
    fn test_incomplete_sequence_finding() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("init", 1)];
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert!(findings.is_empty());

        let finish = tracker.finish(&inst).expect("outcome expected");
        assert!(finish.is_problem());
        assert!(finish.message.contains("Incomplete call sequence"));
        assert!(finish.message.contains("c.encrypt()"));
    }

    #[test]
    fn test_accepting_state_does_not_stop_tracking() {
        // (update, finish)+ : accept after each round, may continue
        let order = E::rep(
            E::seq(E::terminal("c", "update"), E::terminal("c", "finish")),
            RepetitionOp::Plus,
        );
        let tracker = tracker(order, TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("update", 1), op("finish", 2), op("update", 3), op("finish", 4)];
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert!(findings.is_empty());
        assert!(!tracker.finish(&inst).unwrap().is_problem());
    }

    #[test]
    fn test_branch_merge_is_union_of_both_arms() {
        // order: c.init(), (c.encrypt() | c.decrypt()), c.final()
        let order = E::seq(
            E::seq(
                E::terminal("c", "init"),
                E::alt(E::terminal("c", "encrypt"), E::terminal("c", "decrypt")),
            ),
            E::terminal("c", "final"),
        );
        let tracker = tracker(order, TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");

        // if (...) cipher.encrypt() else cipher.decrypt()
        let steps = vec![
            op("init", 1),
            TraceStep::Branch(vec![vec![op("encrypt", 2)], vec![op("decrypt", 3)]]),
        ];
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert!(findings.is_empty());

        // merged set equals union of following X and following Y from S
        let after_fork = {
            let mut fresh = tracker.new_instance("cipher", "c");
            tracker.replay(&mut fresh, &[op("init", 1)], &never());
            let x = tracker
                .automaton()
                .step(&fresh.config.states, &Symbol::new("c", "encrypt"));
            let y = tracker
                .automaton()
                .step(&fresh.config.states, &Symbol::new("c", "decrypt"));
            let mut union = x;
            union.extend(y.into_iter());
            union
        };
        assert_eq!(inst.config.states, after_fork);

        // and both continuations remain viable
        let more = tracker.replay(&mut inst, &[op("final", 5)], &never());
        assert!(more.is_empty());
        assert!(!tracker.finish(&inst).unwrap().is_problem());
    }

    #[test]
    fn test_branch_with_one_dead_arm_keeps_live_arm() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![TraceStep::Branch(vec![
            vec![op("init", 1)],
            vec![op("final", 2)], // dead end, violation in this arm
        ])];
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert_eq!(findings.len(), 1);
        assert!(!inst.sink);

        // surviving arm continues normally
        let more = tracker.replay(&mut inst, &[op("encrypt", 3), op("final", 4)], &never());
        assert!(more.is_empty());
        assert!(!tracker.finish(&inst).unwrap().is_problem());
    }

    #[test]
    fn test_nfa_ignores_callee_operations() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![
            op("init", 1),
            TraceStep::CallEnter("helper".into()),
            op("encrypt", 10),
            TraceStep::CallReturn("helper".into()),
            op("final", 3),
        ];
        // encrypt happened inside the callee, so NFA sees init, final
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("final()"));
    }

    #[test]
    fn test_wpds_tracks_through_calls() {
        let tracker = tracker(three_step(), TypestateMode::Wpds);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![
            op("init", 1),
            TraceStep::CallEnter("helper".into()),
            op("encrypt", 10),
            TraceStep::CallReturn("helper".into()),
            op("final", 3),
        ];
        let findings = tracker.replay(&mut inst, &steps, &never());
        assert!(findings.is_empty());
        assert!(!tracker.finish(&inst).unwrap().is_problem());
        assert!(inst.config.stack.is_empty());
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let mut inst = tracker.new_instance("cipher", "c");
        let steps = vec![op("init", 1), op("encrypt", 2), op("final", 3)];

        use std::cell::Cell;
        let calls = Cell::new(0usize);
        let cancel = || {
            let n = calls.get();
            calls.set(n + 1);
            n >= 1 // cancel after the first step
        };
        tracker.replay(&mut inst, &steps, &cancel);
        assert_eq!(inst.history.len(), 1);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let tracker = tracker(three_step(), TypestateMode::Nfa);
        let steps = vec![op("encrypt", 5)];

        let mut a = tracker.new_instance("cipher", "c");
        let mut b = tracker.new_instance("cipher", "c");
        let fa = tracker.replay(&mut a, &steps, &never());
        let fb = tracker.replay(&mut b, &steps, &never());

        let ja = serde_json::to_string(&fa).unwrap();
        let jb = serde_json::to_string(&fb).unwrap();
        assert_eq!(ja, jb);
    }
}
