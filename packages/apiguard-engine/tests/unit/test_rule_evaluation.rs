//! Rule evaluation service scenarios over small program graphs.

use apiguard_engine::features::expression::{parse_order, ComparisonOp, Expression, LiteralValue};
use apiguard_engine::shared::models::AssignedValue;
use apiguard_engine::{
    EngineConfig, EntityBinding, InstanceTrace, OpEvent, ProgramGraph, ProgramNode,
    ProgramNodeKind, Rule, RuleEvaluationService, Span, TraceStep, TypestateMode,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

/// cipher.algorithm = <algorithm>; cipher.init(); cipher.encrypt(); cipher.final()
fn cipher_graph(algorithm: &str) -> ProgramGraph {
    let mut graph = ProgramGraph::new();
    let def = graph.add_node(ProgramNode::new(
        ProgramNodeKind::Assignment {
            target: "cipher.algorithm".into(),
            value: AssignedValue::StrLiteral(algorithm.into()),
        },
        Span::line("crypto.cpp", 2),
    ));
    let call = graph.add_node(ProgramNode::new(
        ProgramNodeKind::Call {
            callee: "cipher.final".into(),
            args: vec![],
        },
        Span::line("crypto.cpp", 5),
    ));
    graph.add_edge(def, call, apiguard_engine::shared::models::FlowEdge::Flow);
    graph.set_declared_type("cipher", "Botan::Cipher_Mode");

    graph.add_trace(InstanceTrace::new("cipher", "Botan::Cipher_Mode").with_steps(vec![
        TraceStep::Op(OpEvent::new("cipher", "init", Span::line("crypto.cpp", 3))),
        TraceStep::Op(OpEvent::new("cipher", "encrypt", Span::line("crypto.cpp", 4))),
        TraceStep::Op(OpEvent::new("cipher", "final", Span::line("crypto.cpp", 5)).at_node(call)),
    ]));
    graph
}

fn order_rule() -> Rule {
    let order = parse_order("order c.init(), c.encrypt(), c.final()").unwrap();
    Rule::new("BlockCipherOrder")
        .with_entity(EntityBinding::new("c", "Botan.Cipher_Mode"))
        .with_order(order)
        .with_onfail("WrongOrder")
}

fn algorithm_rule() -> Rule {
    Rule::new("UseApprovedAlgorithm")
        .with_entity(EntityBinding::new("c", "Botan.Cipher_Mode"))
        .with_guard(Expression::cmp(
            ComparisonOp::In,
            Expression::operand("c.algorithm"),
            Expression::LiteralList(vec![
                LiteralValue::Str("AES".into()),
                LiteralValue::Str("ChaCha20".into()),
            ]),
        ))
        .with_onfail("BadAlgorithm")
}

#[test]
fn order_and_guard_rules_evaluate_together() {
    let graph = cipher_graph("AES");
    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[order_rule(), algorithm_rule()]);

    assert_eq!(report.findings.len(), 2);
    assert!(report.findings.iter().all(|f| !f.is_problem()));
    assert!(!report.has_problems());
    assert_eq!(report.stats.good, 2);
    assert_eq!(report.stats.problems, 0);
}

#[test]
fn disallowed_algorithm_is_a_violation() {
    let graph = cipher_graph("DES");
    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[algorithm_rule()]);

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert!(finding.is_problem());
    assert_eq!(finding.onfail_id, "BadAlgorithm");
    assert!(finding.message.contains("c.algorithm in [ \"AES\", \"ChaCha20\" ]"));
}

#[test]
fn unresolvable_guard_is_flagged_not_skipped() {
    // no assignment to cipher.mode anywhere in the graph
    let graph = cipher_graph("AES");
    let rule = Rule::new("RequireAuthenticatedMode")
        .with_entity(EntityBinding::new("c", "Botan.Cipher_Mode"))
        .with_guard(Expression::cmp(
            ComparisonOp::Eq,
            Expression::operand("c.mode"),
            Expression::Literal(LiteralValue::Str("GCM".into())),
        ))
        .with_onfail("BadMode");

    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[rule]);
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].is_problem());
    assert!(report.findings[0].message.contains("could not be verified"));
}

#[test]
fn rules_only_apply_to_matching_types() {
    let mut graph = ProgramGraph::new();
    graph.add_trace(InstanceTrace::new("sock", "TcpSocket").with_steps(vec![TraceStep::Op(
        OpEvent::new("sock", "encrypt", Span::line("net.cpp", 1)),
    )]));
    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[order_rule(), algorithm_rule()]);
    assert_eq!(report.findings.len(), 0);
}

#[test]
fn identical_traces_deduplicate() {
    let mut graph = cipher_graph("AES");
    // a second instance with the very same trace and locations
    graph.add_trace(InstanceTrace::new("cipher", "Botan::Cipher_Mode").with_steps(vec![
        TraceStep::Op(OpEvent::new("cipher", "init", Span::line("crypto.cpp", 3))),
        TraceStep::Op(OpEvent::new("cipher", "encrypt", Span::line("crypto.cpp", 4))),
        TraceStep::Op(OpEvent::new("cipher", "final", Span::line("crypto.cpp", 5))),
    ]));

    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[order_rule()]);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.stats.duplicates, 1);
}

#[test]
fn good_findings_suppressed_at_the_boundary() {
    let graph = cipher_graph("DES");
    let config = EngineConfig::default().with_disable_good_findings(true);
    let service = RuleEvaluationService::new(config).unwrap();
    let report = service.evaluate(&graph, &[order_rule(), algorithm_rule()]);

    // the order confirmation is filtered, the violation survives
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].is_problem());
    assert_eq!(report.stats.good, 1);
    assert_eq!(report.stats.suppressed, 1);
}

#[test]
fn malformed_order_skips_only_its_rule() {
    let graph = cipher_graph("AES");
    let broken = Rule::new("Broken")
        .with_entity(EntityBinding::new("c", "Botan.Cipher_Mode"))
        .with_order(Expression::Order(Box::new(Expression::operand("x"))));

    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[broken, order_rule()]);
    assert_eq!(report.stats.skipped_rules, 1);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].rule_id, "BlockCipherOrder");
}

#[test]
fn expired_timeout_yields_partial_well_formed_report() {
    let graph = cipher_graph("AES");
    let config = EngineConfig::default().with_timeout(Duration::from_nanos(1));
    let service = RuleEvaluationService::new(config).unwrap();
    let report = service.evaluate(&graph, &[order_rule(), algorithm_rule()]);

    // the deadline fires before any instance is stepped
    assert_eq!(report.findings.len(), 0);
    assert!(report.to_json().is_ok());
}

#[test]
fn wpds_backend_produces_the_same_verdict_on_flat_traces() {
    let graph = cipher_graph("AES");
    let nfa = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let wpds = RuleEvaluationService::new(
        EngineConfig::default().with_typestate_mode(TypestateMode::Wpds),
    )
    .unwrap();

    let a = nfa.evaluate(&graph, &[order_rule()]).to_json().unwrap();
    let b = wpds.evaluate(&graph, &[order_rule()]).to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn report_serializes_findings_as_json_array() {
    let graph = cipher_graph("DES");
    let service = RuleEvaluationService::new(EngineConfig::default()).unwrap();
    let report = service.evaluate(&graph, &[algorithm_rule()]);
    let json = report.to_json().unwrap();
    assert!(json.trim_start().starts_with('['));
    assert!(json.contains("\"rule_id\": \"UseApprovedAlgorithm\""));
    assert!(json.contains("\"problem\": true"));
}
