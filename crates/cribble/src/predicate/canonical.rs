use crate::{
    combine::CartesianProduct,
    predicate::ast::{Predicate, PredicateKind},
    value::Value,
};

///
/// Canonicalizer
///
/// Rewrites a predicate into canonical disjunctive-normal form: negation
/// pushed onto atomic nodes, same-kind compounds flattened, conjunctions
/// fully distributed over disjunctions, operands deterministically sorted
/// and deduplicated at every level. `LesserThan` is rewritten away so
/// `GreaterThan` is the only ordering primitive in canonical form and
/// equivalent inequalities share one representation.
///

// Entry point behind `Predicate::canonical`; nodes flagged by this pass
// are their own canonical form.
pub(crate) fn canonicalize(predicate: &Predicate) -> Predicate {
    if predicate.is_canonical() {
        return predicate.clone();
    }

    match predicate.kind() {
        PredicateKind::Constant(value) => Predicate::constant(*value),

        PredicateKind::EqualTo { .. }
        | PredicateKind::GreaterThan { .. }
        | PredicateKind::Like { .. }
        | PredicateKind::In { .. } => Predicate::from_kind_canonical(predicate.kind().clone()),

        // x < v  ==  !(x == v || x > v); only one ordering primitive
        // survives canonicalization.
        PredicateKind::LesserThan { attribute, value } => {
            canonical_negation(&equal_or_greater(attribute, value))
        }

        PredicateKind::Negation(operand) => canonical_negation(operand),

        PredicateKind::Conjunction(operands) => canonical_conjunction(operands),
        PredicateKind::Disjunction(operands) => canonical_disjunction(operands),
    }
}

/// Deterministic operand order: disjunctions first, then negations, then
/// everything else; rendered text breaks ties within a rank.
fn canonical_sort_key(predicate: &Predicate) -> (u8, String) {
    let rank = match predicate.kind() {
        PredicateKind::Disjunction(_) => 0,
        PredicateKind::Negation(_) => 1,
        _ => 2,
    };

    (rank, predicate.to_string())
}

fn equal_or_greater(attribute: &str, value: &Value) -> Predicate {
    let equal = Predicate::from_kind(PredicateKind::EqualTo {
        attribute: attribute.to_string(),
        value: value.clone(),
    });
    let greater = Predicate::from_kind(PredicateKind::GreaterThan {
        attribute: attribute.to_string(),
        value: value.clone(),
    });

    Predicate::from_kind(PredicateKind::Disjunction(vec![equal, greater]))
}

// Push one negation inward until it wraps an atomic node.
fn canonical_negation(operand: &Predicate) -> Predicate {
    match operand.kind() {
        // Double negation collapses.
        PredicateKind::Negation(inner) => inner.canonical(),

        PredicateKind::Constant(value) => Predicate::constant(!value),

        // De Morgan, then re-canonicalize the flipped compound.
        PredicateKind::Conjunction(operands) => {
            canonical_disjunction(&negated_operands(operands))
        }
        PredicateKind::Disjunction(operands) => {
            canonical_conjunction(&negated_operands(operands))
        }

        // !(x < v)  ==  x == v || x > v
        PredicateKind::LesserThan { attribute, value } => {
            equal_or_greater(attribute, value).canonical()
        }

        PredicateKind::EqualTo { .. }
        | PredicateKind::GreaterThan { .. }
        | PredicateKind::Like { .. }
        | PredicateKind::In { .. } => Predicate::from_kind_canonical(PredicateKind::Negation(
            Predicate::from_kind_canonical(operand.kind().clone()),
        )),
    }
}

fn negated_operands(operands: &[Predicate]) -> Vec<Predicate> {
    operands
        .iter()
        .map(|operand| Predicate::negation(operand.clone()))
        .collect()
}

// Canonicalize, flatten, and fold a disjunction's operands.
fn canonical_disjunction(operands: &[Predicate]) -> Predicate {
    let mut out = Vec::new();

    for operand in operands {
        let canonical = operand.canonical();
        match canonical.kind() {
            PredicateKind::Constant(true) => return Predicate::always(),
            PredicateKind::Constant(false) => {}
            PredicateKind::Disjunction(nested) => out.extend(nested.iter().cloned()),
            _ => out.push(canonical),
        }
    }

    finish_compound(out, false)
}

// Canonicalize a conjunction: flatten, fold constants, then distribute
// over any disjunction operands into sum-of-products.
fn canonical_conjunction(operands: &[Predicate]) -> Predicate {
    let mut disjunctions: Vec<Vec<Predicate>> = Vec::new();
    let mut literals = Vec::new();

    for operand in operands {
        let canonical = operand.canonical();
        match canonical.kind() {
            PredicateKind::Constant(false) => return Predicate::never(),
            PredicateKind::Constant(true) => {}
            PredicateKind::Conjunction(nested) => literals.extend(nested.iter().cloned()),
            PredicateKind::Disjunction(nested) => disjunctions.push(nested.clone()),
            _ => literals.push(canonical),
        }
    }

    if disjunctions.is_empty() {
        return finish_compound(literals, true);
    }

    // Sum-of-products expansion: one term per combination of disjunction
    // arms, each joined with the shared literals. The operands of a
    // canonical disjunction contain no further disjunctions, so the inner
    // rebuild cannot recurse back here.
    let mut terms = Vec::new();
    for selection in CartesianProduct::new(&disjunctions) {
        let mut term = literals.clone();
        term.extend(selection.into_iter().cloned());
        terms.push(canonical_conjunction(&term));
    }

    canonical_disjunction(&terms)
}

// Sort, deduplicate, and wrap flattened compound operands.
fn finish_compound(mut operands: Vec<Predicate>, conjunction: bool) -> Predicate {
    if operands.is_empty() {
        // The neutral element: an emptied conjunction is vacuously true,
        // an emptied disjunction unsatisfiable.
        return Predicate::constant(conjunction);
    }

    operands.sort_by_cached_key(canonical_sort_key);
    operands.dedup_by(|a, b| a.same_shape(b));

    if operands.len() == 1 {
        return operands.remove(0);
    }

    let kind = if conjunction {
        PredicateKind::Conjunction(operands)
    } else {
        PredicateKind::Disjunction(operands)
    };

    Predicate::from_kind_canonical(kind)
}
