use crate::{
    predicate::tests::parse,
    predicate::{Predicate, simplify, simplify_fixed},
    trace::{AlgebraTraceSink, TraceEvent},
    value::Value,
};
use std::sync::Mutex;

fn simplified(input: &str) -> Predicate {
    simplify_fixed(&parse(input).canonical())
}

#[test]
#[should_panic(expected = "simplify requires canonical input")]
fn non_canonical_input_is_a_contract_breach() {
    let raw = Predicate::equal_to("a", 1i64);
    let _ = simplify(&raw);
}

#[test]
fn absorption_drops_the_larger_term() {
    assert_eq!(simplified("a || a && b"), parse("a").canonical());
    assert_eq!(
        simplified("x > 1 && y == 2 || x > 1"),
        parse("x > 1").canonical()
    );
}

#[test]
fn conjunction_ranges_fold_per_attribute() {
    assert_eq!(simplified("age > 10 && age > 15"), parse("age > 15"));
    assert_eq!(simplified("age > 10 && age <= 20 && age == 15"), parse("age == 15"));
    assert_eq!(simplified("age == 15 && age > 20"), Predicate::never());
    assert_eq!(simplified("age == 15 && age == 16"), Predicate::never());
    assert_eq!(simplified("age == 15 && age != 15"), Predicate::never());
    assert_eq!(simplified("age > 10 && age <= 10"), Predicate::never());
}

#[test]
fn range_merge_keeps_exactly_the_open_interval() {
    // 10 < age < 20, with the inclusive upper bound hollowed out by the
    // not-equal exclusion.
    let predicate = simplified("age > 10 && age <= 20 && age != 20");
    assert_eq!(predicate, parse("age > 10 && age < 20"));

    let satisfied = [11i64, 15, 19];
    let rejected = [9i64, 10, 20, 21];
    for value in satisfied {
        let row = super::record(&[("age", Value::Int(value))]);
        assert!(super::eval_map(&predicate, &row), "age {value} inside");
    }
    for value in rejected {
        let row = super::record(&[("age", Value::Int(value))]);
        assert!(!super::eval_map(&predicate, &row), "age {value} outside");
    }
}

#[test]
fn irrelevant_exclusions_are_dropped() {
    assert_eq!(simplified("age > 10 && age != 5"), parse("age > 10"));
    assert_eq!(simplified("age > 10 && age != 10"), parse("age > 10"));
}

#[test]
fn contradicting_literals_collapse_terms() {
    assert_eq!(
        simplified("matches(n, \"a*\") && !matches(n, \"a*\")"),
        Predicate::never()
    );
    assert_eq!(
        simplified("a && !a || x > 1"),
        parse("x > 1").canonical()
    );
}

#[test]
fn complementary_disjuncts_are_tautological() {
    assert_eq!(simplified("a || !a"), Predicate::always());
    assert_eq!(simplified("x > 5 || x <= 5"), Predicate::always());
}

#[test]
fn resolvent_merges_adjacent_terms() {
    assert_eq!(simplified("a && b || a && !b"), parse("a").canonical());
    assert_eq!(
        simplified("a && b && c || a && c && !b"),
        parse("a && c").canonical()
    );
}

#[test]
fn consensus_removes_redundant_negated_literals() {
    assert_eq!(
        simplified("a && z || !a && b && z"),
        simplified("a && z || b && z")
    );
}

#[test]
fn disjunct_ranges_merge_across_shared_residuals() {
    assert_eq!(
        simplified("x > 10 && x <= 20 && s == 'a' || x > 15 && x <= 30 && s == 'a'"),
        parse("x > 10 && x <= 30 && s == 'a'")
    );

    // Different residuals must not merge.
    let kept = simplified("x > 10 && s == 'a' || x > 5 && s == 'b'");
    assert_eq!(
        kept,
        parse("x > 10 && s == 'a' || x > 5 && s == 'b'").canonical()
    );
}

#[test]
fn touching_ranges_union_into_full_coverage() {
    assert_eq!(simplified("x > 5 && y || x <= 5 && y"), parse("y").canonical());
}

#[test]
fn mixed_variant_comparisons_stay_untouched() {
    let predicate = simplified("x == 5 && x > 'a'");
    assert_eq!(predicate, parse("x == 5 && x > 'a'").canonical());
}

#[test]
fn simplified_output_is_canonical_and_stable() {
    let once = simplified("a || a && b || x > 1 && x > 2");
    assert!(once.is_canonical());
    assert!(simplify_fixed(&once).same_shape(&once));
}

///
/// CountingSink
///

#[derive(Default)]
struct CountingSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl AlgebraTraceSink for CountingSink {
    fn on_event(&self, event: TraceEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

#[test]
fn trace_sink_observes_passes_and_rules() {
    use crate::predicate::simplify_fixed_with_trace;

    let sink = CountingSink::default();
    let _ = simplify_fixed_with_trace(&parse("a || a && b").canonical(), Some(&sink));

    let events = sink.events.lock().expect("sink lock");
    assert!(
        events
            .iter()
            .any(|event| matches!(event, TraceEvent::SimplifyRule { .. })),
        "at least one rule application should be traced"
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, TraceEvent::SimplifyPass { .. })),
        "pass summaries should be traced"
    );
}
