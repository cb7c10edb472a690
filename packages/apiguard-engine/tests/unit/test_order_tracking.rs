//! End-to-end order tracking: rule text through the parser, the
//! automaton compiler and the typestate tracker.

use apiguard_engine::config::TypestateMode;
use apiguard_engine::features::expression::parse_order;
use apiguard_engine::features::order::compile_order;
use apiguard_engine::features::typestate::TypestateTracker;
use apiguard_engine::shared::models::{OpEvent, Span, TraceStep};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn tracker(text: &str, mode: TypestateMode) -> TypestateTracker {
    let order = parse_order(text).expect("order text parses");
    let automaton = Arc::new(compile_order("BlockCiphers", &order).expect("order compiles"));
    TypestateTracker::new("BlockCiphers", "WrongUseOfBotan_CipherMode", order.to_text(), automaton, mode)
}

fn op(name: &str, line: usize) -> TraceStep {
    TraceStep::Op(OpEvent::new("cipher", name, Span::line("crypto.cpp", line)))
}

const PROTOCOL: &str = "order c.create(), c.init(), (c.start(), c.finish())+, c.reset()?";

#[test]
fn full_protocol_is_verified() {
    let tracker = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![
        op("create", 1),
        op("init", 2),
        op("start", 3),
        op("finish", 4),
        op("start", 5),
        op("finish", 6),
        op("reset", 7),
    ];
    let findings = tracker.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);

    let outcome = tracker.finish(&inst).expect("tracked instance finalizes");
    assert!(!outcome.is_problem());
    assert_eq!(outcome.rule_id, "BlockCiphers");
    assert_eq!(outcome.onfail_id, "WrongUseOfBotan_CipherMode");
}

#[test]
fn optional_tail_may_be_skipped() {
    let tracker = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![op("create", 1), op("init", 2), op("start", 3), op("finish", 4)];
    let findings = tracker.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);
    assert!(!tracker.finish(&inst).unwrap().is_problem());
}

#[test]
fn out_of_order_call_reports_expected_alternatives() {
    let tracker = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![op("create", 1), op("start", 2)];
    let findings = tracker.replay(&mut inst, &steps, &|| false);

    assert_eq!(findings.len(), 1);
    let finding = &findings[0];
    assert!(finding.is_problem());
    assert!(finding.message.contains("call to start() is not allowed"));
    assert!(finding.message.contains("c.init()"));
    assert_eq!(finding.locations[0].to_string(), "crypto.cpp:2:1");
}

#[test]
fn unrelated_methods_do_not_disturb_tracking() {
    let tracker = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![
        op("create", 1),
        op("set_debug_name", 2), // outside the alphabet
        op("init", 3),
        op("start", 4),
        op("finish", 5),
    ];
    let findings = tracker.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);
    assert!(!tracker.finish(&inst).unwrap().is_problem());
}

#[test]
fn stopping_midway_is_an_incomplete_sequence() {
    let tracker = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![op("create", 1), op("init", 2), op("start", 3)];
    let findings = tracker.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);

    let outcome = tracker.finish(&inst).unwrap();
    assert!(outcome.is_problem());
    assert!(outcome.message.contains("Incomplete call sequence for 'cipher'"));
    assert!(outcome.message.contains("c.finish()"));
}

#[test]
fn branch_arms_fork_and_rejoin() {
    let tracker = tracker(
        "order c.init(), (c.encrypt() | c.decrypt()), c.final()",
        TypestateMode::Nfa,
    );
    let mut inst = tracker.new_instance("cipher", "c");
    let steps = vec![
        op("init", 1),
        TraceStep::Branch(vec![vec![op("encrypt", 2)], vec![op("decrypt", 4)]]),
        op("final", 6),
    ];
    let findings = tracker.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);
    assert!(!tracker.finish(&inst).unwrap().is_problem());
}

#[test]
fn nfa_and_wpds_disagree_on_callee_operations() {
    let steps = vec![
        op("create", 1),
        op("init", 2),
        TraceStep::CallEnter("do_rounds".into()),
        op("start", 10),
        op("finish", 11),
        TraceStep::CallReturn("do_rounds".into()),
    ];

    // intraprocedural backend never sees the callee body
    let nfa = tracker(PROTOCOL, TypestateMode::Nfa);
    let mut inst = nfa.new_instance("cipher", "c");
    let findings = nfa.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);
    assert!(nfa.finish(&inst).unwrap().is_problem());

    // pushdown backend tracks through the call
    let wpds = tracker(PROTOCOL, TypestateMode::Wpds);
    let mut inst = wpds.new_instance("cipher", "c");
    let findings = wpds.replay(&mut inst, &steps, &|| false);
    assert_eq!(findings, vec![]);
    assert!(!wpds.finish(&inst).unwrap().is_problem());
}
