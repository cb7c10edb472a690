//! Property tests for the order-expression renderer and parser.
//!
//! The canonical text of a well-formed order expression must re-parse
//! to an expression with the same canonical text and the same alphabet.
//! Tree identity is deliberately not required: `a, b, c` may re-parse
//! with different association, but its text form is a fixpoint.

use apiguard_engine::features::expression::{parse_order, Expression, RepetitionOp};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

fn terminal() -> impl Strategy<Value = Expression> {
    (ident(), ident()).prop_map(|(entity, op)| Expression::terminal(entity, op))
}

fn rep_op() -> impl Strategy<Value = RepetitionOp> {
    prop_oneof![
        Just(RepetitionOp::Star),
        Just(RepetitionOp::Plus),
        Just(RepetitionOp::Opt),
    ]
}

/// Grammar-respecting order expression bodies
///
/// The only structural restriction is that a repetition never wraps
/// another repetition directly (the grammar allows one postfix per
/// group). Everything else composes freely: the renderer groups a
/// sequence or alternative under a postfix, and a sequence under an
/// alternative, with explicit parentheses.
fn order_body() -> impl Strategy<Value = Expression> {
    terminal().prop_recursive(3, 24, 3, |inner| {
        let repeated = (inner.clone(), rep_op()).prop_map(|(expr, op)| {
            let expr = match expr {
                Expression::Repetition { inner, .. } => *inner,
                other => other,
            };
            Expression::rep(expr, op)
        });
        let alt = (inner.clone(), inner.clone())
            .prop_map(|(left, right)| Expression::alt(left, right));
        let seq = (inner.clone(), inner)
            .prop_map(|(left, right)| Expression::seq(left, right));
        prop_oneof![terminal(), repeated, alt, seq]
    })
}

fn alphabet(expr: &Expression) -> FxHashSet<(String, String)> {
    let mut symbols = FxHashSet::default();
    expr.collect_alphabet(&mut symbols);
    symbols
}

proptest! {
    #[test]
    fn canonical_text_is_a_parse_fixpoint(body in order_body()) {
        let order = Expression::Order(Box::new(body));
        let text = order.to_text();
        let reparsed = parse_order(&text).expect("canonical text parses");
        prop_assert_eq!(reparsed.to_text(), text);
    }

    #[test]
    fn reparsing_preserves_the_alphabet(body in order_body()) {
        let order = Expression::Order(Box::new(body));
        let reparsed = parse_order(&order.to_text()).expect("canonical text parses");
        prop_assert_eq!(alphabet(&reparsed), alphabet(&order));
    }

    #[test]
    fn parser_never_panics_on_arbitrary_input(text in "\\PC{0,40}") {
        let _ = parse_order(&text);
    }
}

#[test]
fn alternative_over_sequence_keeps_its_grouping() {
    use apiguard_engine::features::order::{compile_order, Symbol};

    // language {ab, c}; ungrouped text would mean {ab, ac}
    let order = Expression::Order(Box::new(Expression::alt(
        Expression::seq(Expression::terminal("c", "a"), Expression::terminal("c", "b")),
        Expression::terminal("c", "c"),
    )));
    let text = order.to_text();
    assert_eq!(text, "order (c.a(), c.b()) | c.c()");

    let reparsed = parse_order(&text).unwrap();
    assert_eq!(reparsed, order);

    // the lone operation c() is accepted by both trees
    let automaton = compile_order("t", &reparsed).unwrap();
    let states = automaton.step(&automaton.initial_states(), &Symbol::new("c", "c"));
    assert!(automaton.is_accepting(&states));
}

#[test]
fn nested_grouping_renders_with_minimal_parens() {
    let order = Expression::Order(Box::new(Expression::seq(
        Expression::terminal("c", "init"),
        Expression::rep(
            Expression::alt(
                Expression::terminal("c", "encrypt"),
                Expression::terminal("c", "decrypt"),
            ),
            RepetitionOp::Plus,
        ),
    )));
    assert_eq!(
        order.to_text(),
        "order c.init(), (c.encrypt() | c.decrypt())+"
    );
    assert_eq!(parse_order(&order.to_text()).unwrap(), order);
}
