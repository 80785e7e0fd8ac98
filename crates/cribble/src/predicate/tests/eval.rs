use crate::{
    predicate::tests::{eval_map, parse, record},
    predicate::{
        Context, EvalError, MapContext, Predicate, TestAtom, add_fact, evaluate, evaluate_facts,
    },
    value::Value,
};
use std::collections::BTreeMap;

#[test]
fn end_to_end_example() {
    let predicate = parse("age >= 18 && (status == 'active' || status == 'pending')");

    let adult = record(&[
        ("age", Value::Int(25)),
        ("status", Value::Text("pending".into())),
    ]);
    assert!(eval_map(&predicate, &adult));

    let minor = record(&[
        ("age", Value::Int(16)),
        ("status", Value::Text("active".into())),
    ]);
    assert!(!eval_map(&predicate, &minor));
}

#[test]
fn conjunction_short_circuits_in_operand_order() {
    // The second operand would raise a type mismatch; the first settles it.
    let predicate = parse("age == 99 && height > 10");
    let row = record(&[("age", Value::Int(1)), ("height", Value::Bool(true))]);
    assert!(!eval_map(&predicate, &row));

    let predicate = parse("age == 1 || height > 10");
    assert!(eval_map(&predicate, &row));
}

#[test]
fn equality_is_null_safe() {
    let row = record(&[("present", Value::Null)]);

    assert!(eval_map(&Predicate::equal_to("present", Value::Null), &row));
    assert!(eval_map(&Predicate::equal_to("absent", Value::Null), &row));
    assert!(!eval_map(&Predicate::equal_to("absent", 5i64), &row));

    // Cross-variant equality is a non-match, not an error.
    let row = record(&[("x", Value::Text("5".into()))]);
    assert!(!eval_map(&Predicate::equal_to("x", 5i64), &row));
}

#[test]
fn implicit_truthiness_checks_boolean_equality() {
    let row = record(&[("flag", Value::Bool(true))]);
    assert!(eval_map(&parse("flag"), &row));
    assert!(!eval_map(&parse("!flag"), &row));

    let row = record(&[("flag", Value::Int(1))]);
    assert!(!eval_map(&parse("flag"), &row), "non-bool is not truthy");
}

#[test]
fn ordering_mismatches_surface_as_errors() {
    let predicate = parse("age > 5");

    let missing = record(&[]);
    assert!(matches!(
        evaluate(&predicate, &MapContext, &missing),
        Err(EvalError::TypeMismatch { .. })
    ));

    let text = record(&[("age", Value::Text("old".into()))]);
    assert!(matches!(
        evaluate(&predicate, &MapContext, &text),
        Err(EvalError::TypeMismatch { .. })
    ));

    let boolean = record(&[("age", Value::Bool(true))]);
    assert!(matches!(
        evaluate(&predicate, &MapContext, &boolean),
        Err(EvalError::TypeMismatch { .. })
    ));
}

#[test]
fn like_is_false_for_absent_attributes() {
    let predicate = parse("matches(name, \"J*n\")");

    assert!(!eval_map(&predicate, &record(&[])));
    assert!(eval_map(
        &predicate,
        &record(&[("name", Value::Text("Jensen".into()))])
    ));
    assert!(!eval_map(
        &predicate,
        &record(&[("name", Value::Text("Karen".into()))])
    ));
}

#[test]
fn like_matches_plain_rendering_of_non_text() {
    let predicate = parse("matches(code, \"4?2\")");
    assert!(eval_map(&predicate, &record(&[("code", Value::Int(402))])));
    assert!(!eval_map(&predicate, &record(&[("code", Value::Int(43))])));
    assert!(!eval_map(&predicate, &record(&[("code", Value::Null)])));
}

#[test]
fn in_is_pure_set_membership() {
    let predicate = parse("contains(kind, {'a', 'b'})");

    assert!(eval_map(
        &predicate,
        &record(&[("kind", Value::Text("a".into()))])
    ));
    assert!(!eval_map(
        &predicate,
        &record(&[("kind", Value::Text("c".into()))])
    ));
    assert!(!eval_map(&predicate, &record(&[])));
}

///
/// FailingContext
///
/// Context whose lookups always fail, for propagation checks.
///

struct FailingContext;

impl Context for FailingContext {
    type Record = ();

    fn value(&self, _: &(), attribute: &str) -> Result<Option<Value>, EvalError> {
        Err(EvalError::lookup(attribute, "backing store unavailable"))
    }
}

#[test]
fn lookup_failures_propagate_unmodified() {
    let result = evaluate(&parse("a == 1"), &FailingContext, &());
    let Err(EvalError::Lookup { attribute, .. }) = result else {
        panic!("lookup failure must propagate");
    };
    assert_eq!(attribute, "a");
}

fn facts(entries: &[(&str, TestAtom)]) -> BTreeMap<String, std::collections::BTreeSet<TestAtom>> {
    let mut out = BTreeMap::new();
    for (attribute, atom) in entries {
        add_fact(&mut out, *attribute, atom.clone());
    }
    out
}

#[test]
fn fact_evaluation_breaks_ties_by_atom_kind() {
    let predicate = parse("x > 5");

    // An exact 5 is not greater than 5; a reported "greater than 5" is.
    assert!(!evaluate_facts(&predicate, &facts(&[("x", TestAtom::equal_to(5i64))])));
    assert!(evaluate_facts(&predicate, &facts(&[("x", TestAtom::greater_than(5i64))])));
    assert!(evaluate_facts(&predicate, &facts(&[("x", TestAtom::equal_to(7i64))])));
    assert!(!evaluate_facts(&predicate, &facts(&[("x", TestAtom::greater_than(3i64))])));

    let predicate = parse("x < 5");
    assert!(evaluate_facts(&predicate, &facts(&[("x", TestAtom::lesser_than(5i64))])));
    assert!(!evaluate_facts(&predicate, &facts(&[("x", TestAtom::lesser_than(9i64))])));
    assert!(evaluate_facts(&predicate, &facts(&[("x", TestAtom::exactly(4i64))])));
}

#[test]
fn like_facts_match_exact_values_or_identical_patterns() {
    let predicate = parse("matches(name, \"J*\")");

    assert!(evaluate_facts(
        &predicate,
        &facts(&[("name", TestAtom::exactly("Jon"))])
    ));
    assert!(!evaluate_facts(
        &predicate,
        &facts(&[("name", TestAtom::equal_to("Jon"))]),
        // EQUAL_TO carries equality-class knowledge only; patterns need
        // the literal value.
    ));
    assert!(evaluate_facts(
        &predicate,
        &facts(&[("name", TestAtom::like("J*"))])
    ));
    assert!(!evaluate_facts(
        &predicate,
        &facts(&[("name", TestAtom::like("K*"))])
    ));
}

#[test]
fn any_atom_in_the_set_satisfies_a_leaf() {
    let mut map = BTreeMap::new();
    add_fact(&mut map, "x", TestAtom::equal_to(1i64));
    add_fact(&mut map, "x", TestAtom::equal_to(9i64));

    assert!(evaluate_facts(&parse("x > 5"), &map));
    assert!(evaluate_facts(&parse("x < 5"), &map));
}

#[test]
#[should_panic(expected = "no test atoms supplied for attribute `y`")]
fn missing_fact_entries_fail_fast() {
    evaluate_facts(&parse("y == 1"), &facts(&[("x", TestAtom::equal_to(1i64))]));
}

#[test]
fn predicates_describe_their_own_atoms() {
    let predicate = parse("x > 5 && contains(kind, {'a', 'b'}) && matches(name, \"J*\")");
    let atoms = predicate.test_atoms();

    assert!(atoms["x"].contains(&TestAtom::greater_than(5i64)));
    assert!(atoms["kind"].contains(&TestAtom::equal_to("a")));
    assert!(atoms["kind"].contains(&TestAtom::equal_to("b")));
    assert!(atoms["name"].contains(&TestAtom::like("J*")));
}
