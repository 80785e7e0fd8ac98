use crate::{
    predicate::{MapContext, Predicate, evaluate, fingerprint, simplify_fixed, split},
    value::Value,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

const ATTRS: [&str; 3] = ["a", "b", "c"];

fn arb_attr() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ATTRS[0].to_string()),
        Just(ATTRS[1].to_string()),
        Just(ATTRS[2].to_string()),
    ]
}

fn arb_int_value() -> impl Strategy<Value = Value> {
    (-20i64..20).prop_map(Value::Int)
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        arb_int_value(),
        any::<bool>().prop_map(Value::Bool),
        "[a-c]{0,2}".prop_map(Value::Text),
        (-16i64..16).prop_map(|n| Value::Float(n as f64 / 4.0)),
        Just(Value::Null),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        Just(Predicate::always()),
        Just(Predicate::never()),
        (arb_attr(), arb_value()).prop_map(|(attr, value)| Predicate::equal_to(attr, value)),
        (arb_attr(), arb_int_value()).prop_map(|(attr, value)| {
            Predicate::greater_than(attr, value).expect("non-null")
        }),
        (arb_attr(), arb_int_value()).prop_map(|(attr, value)| {
            Predicate::lesser_than(attr, value).expect("non-null")
        }),
        (arb_attr(), "[ab?*]{0,3}").prop_map(|(attr, pattern)| {
            Predicate::matches(attr, pattern).expect("wildcard-only patterns compile")
        }),
        (arb_attr(), prop::collection::vec(arb_value(), 0..4))
            .prop_map(|(attr, values)| Predicate::is_in(attr, values)),
    ]
}

fn arb_predicate() -> impl Strategy<Value = Predicate> {
    arb_leaf().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|operands| Predicate::conjunction(operands).expect("arity >= 2")),
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|operands| Predicate::disjunction(operands).expect("arity >= 2")),
            inner.prop_map(Predicate::negation),
        ]
    })
}

fn arb_record() -> impl Strategy<Value = BTreeMap<String, Value>> {
    prop::collection::vec(prop::option::of(arb_value()), ATTRS.len()).prop_map(|values| {
        let mut record = BTreeMap::new();
        for (name, value) in ATTRS.iter().zip(values) {
            if let Some(value) = value {
                record.insert((*name).to_string(), value);
            }
        }
        record
    })
}

// Evaluation comparisons skip records that raise a type mismatch on
// either side: operand reordering legitimately changes which side trips
// the error first.
fn both_ok(
    left: &Predicate,
    right: &Predicate,
    record: &BTreeMap<String, Value>,
) -> Option<(bool, bool)> {
    let left = evaluate(left, &MapContext, record).ok()?;
    let right = evaluate(right, &MapContext, record).ok()?;

    Some((left, right))
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(predicate in arb_predicate()) {
        let canonical = predicate.canonical();
        prop_assert!(canonical.canonical().same_shape(&canonical));
    }

    #[test]
    fn canonicalization_preserves_evaluation(
        predicate in arb_predicate(),
        record in arb_record(),
    ) {
        let canonical = predicate.canonical();
        if let Some((left, right)) = both_ok(&predicate, &canonical, &record) {
            prop_assert_eq!(left, right);
        }
    }

    #[test]
    fn operand_order_is_canonically_irrelevant(
        left in arb_predicate(),
        right in arb_predicate(),
    ) {
        prop_assert_eq!(&left & &right, &right & &left);
        prop_assert_eq!(&left | &right, &right | &left);
    }

    #[test]
    fn simplification_preserves_evaluation(
        predicate in arb_predicate(),
        record in arb_record(),
    ) {
        let simplified = simplify_fixed(&predicate.canonical());
        prop_assert!(simplified.is_canonical());
        if let Some((left, right)) = both_ok(&predicate, &simplified, &record) {
            prop_assert_eq!(left, right);
        }
    }

    #[test]
    fn split_union_matches_the_input(
        predicate in arb_predicate(),
        record in arb_record(),
    ) {
        // Splits past the combination ceiling and records that trip a
        // type mismatch on either side have nothing to check.
        if let (Ok(parts), Ok(whole)) = (
            split(&predicate),
            evaluate(&predicate, &MapContext, &record),
        ) {
            let evaluated: Result<Vec<bool>, _> = parts
                .iter()
                .map(|part| evaluate(part, &MapContext, &record))
                .collect();
            if let Ok(values) = evaluated {
                prop_assert_eq!(whole, values.into_iter().any(|value| value));
            }
        }
    }

    #[test]
    fn rendering_round_trips(predicate in arb_predicate()) {
        let rendered = predicate.to_string();
        let reparsed: Predicate = rendered.parse().expect("rendered syntax reparses");
        prop_assert_eq!(&reparsed, &predicate, "rendered `{}`", rendered);
    }

    #[test]
    fn fingerprints_agree_with_canonical_equality(
        left in arb_predicate(),
        right in arb_predicate(),
    ) {
        prop_assert_eq!(fingerprint(&left), fingerprint(&left.canonical()));
        prop_assert_eq!(left == right, fingerprint(&left) == fingerprint(&right));
    }
}

///
/// Targeted coverage for the exclusion-reconciliation heuristic: single
/// attribute, integer constraints, brute-force comparison over the whole
/// relevant domain.
///

#[derive(Clone, Debug)]
enum IntConstraint {
    Eq(i64),
    Ne(i64),
    Gt(i64),
    Le(i64),
}

fn arb_constraint() -> impl Strategy<Value = IntConstraint> {
    let bound = -5i64..5;
    prop_oneof![
        bound.clone().prop_map(IntConstraint::Eq),
        bound.clone().prop_map(IntConstraint::Ne),
        bound.clone().prop_map(IntConstraint::Gt),
        bound.prop_map(IntConstraint::Le),
    ]
}

fn constraint_predicate(constraint: &IntConstraint) -> Predicate {
    match constraint {
        IntConstraint::Eq(v) => Predicate::equal_to("a", *v),
        IntConstraint::Ne(v) => Predicate::not_equal_to("a", *v),
        IntConstraint::Gt(v) => Predicate::greater_than("a", *v).expect("non-null"),
        IntConstraint::Le(v) => Predicate::at_most("a", *v).expect("non-null"),
    }
}

proptest! {
    #[test]
    fn exclusion_reconciliation_is_equivalence_preserving(
        constraints in prop::collection::vec(arb_constraint(), 1..6),
    ) {
        let operands: Vec<Predicate> = constraints.iter().map(constraint_predicate).collect();
        let predicate = match operands.len() {
            1 => operands.into_iter().next().expect("non-empty"),
            _ => Predicate::conjunction(operands).expect("arity >= 2"),
        };
        let simplified = simplify_fixed(&predicate.canonical());

        for probe in -7i64..=7 {
            let mut record = BTreeMap::new();
            record.insert("a".to_string(), Value::Int(probe));
            let before = evaluate(&predicate, &MapContext, &record).expect("int probes");
            let after = evaluate(&simplified, &MapContext, &record).expect("int probes");
            prop_assert_eq!(before, after, "probe {} diverged", probe);
        }
    }
}
