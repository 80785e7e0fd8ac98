use crate::{
    predicate::ast::{Predicate, PredicateKind},
    range::Range,
    trace::{AlgebraTraceSink, SimplifyRule, TraceEvent, emit},
    value::Value,
};
use std::collections::BTreeMap;

///
/// Simplifier
///
/// Algebraic simplification over canonical input. Conjunctions fold their
/// per-attribute comparisons through `Range` intersection; disjunctions
/// merge compatible ranges across terms and apply the absorption,
/// resolvent, and consensus laws. The result is logically equivalent and
/// itself canonical.
///

// Bound-exclusion reconciliation is a bounded heuristic, not a fixed
// point: after a bound shift the remaining exclusions get one re-check.
const EXCLUSION_PASSES: usize = 2;

impl Predicate {
    /// Canonicalize and simplify to a fixed point.
    #[must_use]
    pub fn simplified(&self) -> Self {
        simplify_fixed(&self.canonical())
    }
}

/// One simplification pass.
///
/// PANICS: the input must be canonical; anything else is a caller
/// contract breach.
#[must_use]
pub fn simplify(predicate: &Predicate) -> Predicate {
    simplify_with_trace(predicate, None)
}

/// One simplification pass with an attached trace sink.
pub fn simplify_with_trace(
    predicate: &Predicate,
    sink: Option<&dyn AlgebraTraceSink>,
) -> Predicate {
    assert!(
        predicate.is_canonical(),
        "simplify requires canonical input"
    );

    let out = match predicate.kind() {
        PredicateKind::Disjunction(terms) => simplify_disjunction(terms, sink),
        PredicateKind::Conjunction(_) => simplify_term(predicate, sink),
        _ => predicate.clone(),
    };

    out.canonical()
}

/// Re-simplify until nothing changes, bounded by `MAX_SIMPLIFY_PASSES`.
#[must_use]
pub fn simplify_fixed(predicate: &Predicate) -> Predicate {
    simplify_fixed_with_trace(predicate, None)
}

/// Fixed-point simplification with an attached trace sink.
pub fn simplify_fixed_with_trace(
    predicate: &Predicate,
    sink: Option<&dyn AlgebraTraceSink>,
) -> Predicate {
    let mut current = predicate.clone();

    for pass in 0..crate::MAX_SIMPLIFY_PASSES {
        let next = simplify_with_trace(&current, sink);
        emit(
            sink,
            TraceEvent::SimplifyPass {
                pass: pass as u32,
                terms_before: term_count(&current),
                terms_after: term_count(&next),
            },
        );

        let stable = next.same_shape(&current);
        current = next;
        if stable {
            break;
        }
    }

    current
}

fn term_count(predicate: &Predicate) -> usize {
    match predicate.kind() {
        PredicateKind::Disjunction(terms) => terms.len(),
        _ => 1,
    }
}

// The literal complement: X <-> !X.
fn complement_of(literal: &Predicate) -> Predicate {
    match literal.kind() {
        PredicateKind::Negation(inner) => inner.clone(),
        _ => Predicate::negation(literal.clone()),
    }
}

fn is_complement(left: &Predicate, right: &Predicate) -> bool {
    match (left.kind(), right.kind()) {
        (PredicateKind::Negation(inner), _) => inner.same_shape(right),
        (_, PredicateKind::Negation(inner)) => inner.same_shape(left),
        _ => false,
    }
}

///
/// FoldSource
///
/// One conjunct's contribution to an attribute's range.
///

enum FoldSource {
    Point(Value),
    Above(Value),
    AtMost(Value),
    Exclude(Value),
}

impl FoldSource {
    const fn value(&self) -> &Value {
        match self {
            Self::Point(v) | Self::Above(v) | Self::AtMost(v) | Self::Exclude(v) => v,
        }
    }
}

// Classify one literal as range-foldable. Only ordered values fold;
// Like, In, boolean equality, and null checks stay as-is.
fn fold_source(literal: &Predicate) -> Option<(String, FoldSource)> {
    match literal.kind() {
        PredicateKind::EqualTo { attribute, value } if value.is_ordered() => {
            Some((attribute.clone(), FoldSource::Point(value.clone())))
        }
        PredicateKind::GreaterThan { attribute, value } if value.is_ordered() => {
            Some((attribute.clone(), FoldSource::Above(value.clone())))
        }
        PredicateKind::Negation(inner) => match inner.kind() {
            PredicateKind::GreaterThan { attribute, value } if value.is_ordered() => {
                Some((attribute.clone(), FoldSource::AtMost(value.clone())))
            }
            PredicateKind::EqualTo { attribute, value } if value.is_ordered() => {
                Some((attribute.clone(), FoldSource::Exclude(value.clone())))
            }
            _ => None,
        },
        _ => None,
    }
}

///
/// FoldOutcome
///

enum FoldOutcome {
    Literals(Vec<Predicate>),
    Unsatisfiable,
}

// Intersect one attribute's fold sources and re-derive the minimal
// literal set. `None` exclusions survive as residual `!=` literals.
fn fold_attribute(
    attribute: &str,
    sources: &[FoldSource],
    sink: Option<&dyn AlgebraTraceSink>,
) -> FoldOutcome {
    let mut range = Range::full();
    let mut exclusions: Vec<Value> = Vec::new();

    for source in sources {
        let constraint = match source {
            FoldSource::Point(v) => Range::point(v.clone()),
            FoldSource::Above(v) => Range::greater_than(v.clone()),
            FoldSource::AtMost(v) => Range::at_most(v.clone()),
            FoldSource::Exclude(v) => {
                exclusions.push(v.clone());
                continue;
            }
        };

        match range.and(&constraint) {
            Some(next) => range = next,
            None => return FoldOutcome::Unsatisfiable,
        }
    }

    for _ in 0..EXCLUSION_PASSES {
        let mut changed = false;
        let mut kept = Vec::new();

        for value in exclusions.drain(..) {
            if !range.contains(&value) {
                // Already outside the range; the exclusion is irrelevant.
                emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::ExclusionFold });
                changed = true;
                continue;
            }
            if range.as_point().is_some() {
                // The exclusion hollows out an exact match.
                return FoldOutcome::Unsatisfiable;
            }
            if range.min() == Some(&value) && range.include_min() {
                match range.exclude_min() {
                    Some(next) => {
                        range = next;
                        changed = true;
                        continue;
                    }
                    None => return FoldOutcome::Unsatisfiable,
                }
            }
            if range.max() == Some(&value) && range.include_max() {
                match range.exclude_max() {
                    Some(next) => {
                        range = next;
                        changed = true;
                        continue;
                    }
                    None => return FoldOutcome::Unsatisfiable,
                }
            }
            kept.push(value);
        }

        exclusions = kept;
        if !changed {
            break;
        }
    }

    if sources.len() >= 2 {
        emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::RangeFold });
    }

    FoldOutcome::Literals(range_literals(attribute, &range, &exclusions))
}

// Express a range as canonical-form literals: `==` for a point, `>` for
// the open lower bound, `!(>)` for the upper bound with `!=` marking an
// excluded boundary or residual exclusion.
fn range_literals(attribute: &str, range: &Range, exclusions: &[Value]) -> Vec<Predicate> {
    if let Some(point) = range.as_point() {
        return vec![Predicate::equal_to(attribute, point.clone())];
    }

    let mut out = Vec::new();
    if let Some(min) = range.min() {
        // Conjunction folds can only produce open or point lower bounds.
        debug_assert!(!range.include_min(), "non-point inclusive lower bound");
        out.push(Predicate::from_kind(PredicateKind::GreaterThan {
            attribute: attribute.to_string(),
            value: min.clone(),
        }));
    }
    if let Some(max) = range.max() {
        out.push(Predicate::negation(Predicate::from_kind(
            PredicateKind::GreaterThan {
                attribute: attribute.to_string(),
                value: max.clone(),
            },
        )));
        if !range.include_max() {
            out.push(Predicate::not_equal_to(attribute, max.clone()));
        }
    }
    for value in exclusions {
        out.push(Predicate::not_equal_to(attribute, value.clone()));
    }

    out
}

// Simplify one canonical term (a conjunction of literals, or a lone
// literal, which passes through untouched).
fn simplify_term(term: &Predicate, sink: Option<&dyn AlgebraTraceSink>) -> Predicate {
    let PredicateKind::Conjunction(literals) = term.kind() else {
        return term.clone();
    };

    // A literal alongside its exact negation contradicts the whole term.
    for (index, literal) in literals.iter().enumerate() {
        for other in &literals[index + 1..] {
            if is_complement(literal, other) {
                emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::Complement });
                return Predicate::never();
            }
        }
    }

    let mut groups: BTreeMap<String, Vec<FoldSource>> = BTreeMap::new();
    let mut rest: Vec<Predicate> = Vec::new();

    for literal in literals {
        match fold_source(literal) {
            Some((attribute, source)) => groups.entry(attribute).or_default().push(source),
            None => rest.push(literal.clone()),
        }
    }

    let mut out = rest;
    for (attribute, sources) in &groups {
        // Two different exact values on one attribute can never co-hold,
        // comparable or not.
        let mut point: Option<&Value> = None;
        let mut conflicting = false;
        for source in sources {
            if let FoldSource::Point(value) = source {
                match point {
                    Some(seen) if seen != value => conflicting = true,
                    _ => point = Some(value),
                }
            }
        }
        if conflicting {
            return Predicate::never();
        }

        // Mixed-variant comparisons have no shared order; leave those
        // literals untouched rather than guessing.
        let rank = sources[0].value().canonical_rank();
        if sources.iter().any(|s| s.value().canonical_rank() != rank) {
            out.extend(rebuild_sources(attribute, sources));
            continue;
        }

        match fold_attribute(attribute, sources, sink) {
            FoldOutcome::Unsatisfiable => return Predicate::never(),
            FoldOutcome::Literals(derived) => out.extend(derived),
        }
    }

    join_conjunction(out)
}

// Reconstruct the original literals for an attribute that was skipped.
fn rebuild_sources(attribute: &str, sources: &[FoldSource]) -> Vec<Predicate> {
    sources
        .iter()
        .map(|source| match source {
            FoldSource::Point(v) => Predicate::equal_to(attribute, v.clone()),
            FoldSource::Above(v) => Predicate::from_kind(PredicateKind::GreaterThan {
                attribute: attribute.to_string(),
                value: v.clone(),
            }),
            FoldSource::AtMost(v) => Predicate::negation(Predicate::from_kind(
                PredicateKind::GreaterThan {
                    attribute: attribute.to_string(),
                    value: v.clone(),
                },
            )),
            FoldSource::Exclude(v) => Predicate::not_equal_to(attribute, v.clone()),
        })
        .collect()
}

fn join_conjunction(mut literals: Vec<Predicate>) -> Predicate {
    match literals.len() {
        0 => Predicate::always(),
        1 => literals.remove(0),
        _ => Predicate::from_kind(PredicateKind::Conjunction(literals)),
    }
}

///
/// Term
///
/// One disjunct viewed as a literal set, keyed by rendering (the same
/// deterministic key the canonical order uses). The key view drives the
/// subset and complement checks behind the redundancy laws.
///

#[derive(Clone)]
struct Term {
    literals: BTreeMap<String, Predicate>,
}

impl Term {
    fn from_predicate(predicate: &Predicate) -> Self {
        let mut literals = BTreeMap::new();
        match predicate.kind() {
            PredicateKind::Conjunction(operands) => {
                for operand in operands {
                    literals.insert(operand.to_string(), operand.clone());
                }
            }
            _ => {
                literals.insert(predicate.to_string(), predicate.clone());
            }
        }

        Self { literals }
    }

    fn from_literals(literals: Vec<Predicate>) -> Self {
        Self {
            literals: literals
                .into_iter()
                .map(|literal| (literal.to_string(), literal))
                .collect(),
        }
    }

    fn is_true(&self) -> bool {
        self.literals.is_empty()
    }

    fn is_subset_of(&self, other: &Self) -> bool {
        self.literals
            .keys()
            .all(|key| other.literals.contains_key(key))
    }

    fn to_predicate(&self) -> Predicate {
        join_conjunction(self.literals.values().cloned().collect())
    }
}

// Simplify a canonical disjunction: simplify each term, then run the
// complement, absorption, resolvent, consensus, and range-merge rules
// until no pair matches.
fn simplify_disjunction(
    operands: &[Predicate],
    sink: Option<&dyn AlgebraTraceSink>,
) -> Predicate {
    let mut simplified = Vec::new();
    for operand in operands {
        let term = simplify_term(operand, sink);
        match term.kind() {
            PredicateKind::Constant(true) => return Predicate::always(),
            PredicateKind::Constant(false) => {}
            _ => simplified.push(term),
        }
    }

    // A disjunct next to its exact negation satisfies every record.
    for (index, term) in simplified.iter().enumerate() {
        for other in &simplified[index + 1..] {
            if is_complement(term, other) {
                emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::Complement });
                return Predicate::always();
            }
        }
    }

    let mut terms: Vec<Term> = simplified.iter().map(Term::from_predicate).collect();

    loop {
        let mut changed = false;

        changed |= absorption_pass(&mut terms, sink);
        changed |= resolvent_pass(&mut terms, sink);
        changed |= consensus_pass(&mut terms, sink);
        changed |= range_merge_pass(&mut terms, sink);

        if terms.iter().any(Term::is_true) {
            return Predicate::always();
        }
        if !changed {
            break;
        }
    }

    let rebuilt: Vec<Predicate> = terms.iter().map(Term::to_predicate).collect();
    match rebuilt.len() {
        0 => Predicate::never(),
        1 => rebuilt.into_iter().next().unwrap_or_else(Predicate::never),
        _ => Predicate::from_kind(PredicateKind::Disjunction(rebuilt)),
    }
}

// Absorption: when one term's literal set contains another's, the larger
// term is redundant. Identical terms collapse the same way.
fn absorption_pass(terms: &mut Vec<Term>, sink: Option<&dyn AlgebraTraceSink>) -> bool {
    let mut changed = false;
    let mut index = 0;

    while index < terms.len() {
        let absorbed = (0..terms.len()).any(|other| {
            other != index
                && terms[other].is_subset_of(&terms[index])
                // Break ties between identical sets by keeping the earlier.
                && (!terms[index].is_subset_of(&terms[other]) || other < index)
        });

        if absorbed {
            emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::Absorption });
            terms.remove(index);
            changed = true;
        } else {
            index += 1;
        }
    }

    changed
}

// Resolvent: AB | A!B collapses to A.
fn resolvent_pass(terms: &mut Vec<Term>, sink: Option<&dyn AlgebraTraceSink>) -> bool {
    for left in 0..terms.len() {
        for right in left + 1..terms.len() {
            let only_left: Vec<&String> = terms[left]
                .literals
                .keys()
                .filter(|key| !terms[right].literals.contains_key(*key))
                .collect();
            let only_right: Vec<&String> = terms[right]
                .literals
                .keys()
                .filter(|key| !terms[left].literals.contains_key(*key))
                .collect();

            if only_left.len() != 1 || only_right.len() != 1 {
                continue;
            }

            let pivot = &terms[left].literals[only_left[0]];
            let dual = &terms[right].literals[only_right[0]];
            if !is_complement(pivot, dual) {
                continue;
            }

            emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::Resolvent });
            let pivot_key = only_left[0].clone();
            let mut merged = terms[left].clone();
            merged.literals.remove(&pivot_key);
            terms.remove(right);
            terms[left] = merged;
            return true;
        }
    }

    false
}

// Consensus: AZ | !A B Z drops the now-redundant !A from the second term.
fn consensus_pass(terms: &mut [Term], sink: Option<&dyn AlgebraTraceSink>) -> bool {
    let found = find_consensus(terms);

    if let Some((right, dual_key)) = found {
        emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::Consensus });
        terms[right].literals.remove(&dual_key);
        return true;
    }

    false
}

fn find_consensus(terms: &[Term]) -> Option<(usize, String)> {
    for left in 0..terms.len() {
        for right in 0..terms.len() {
            if left == right {
                continue;
            }

            for (key, literal) in &terms[left].literals {
                let dual_key = complement_of(literal).to_string();
                if !terms[right].literals.contains_key(&dual_key) {
                    continue;
                }

                let rest_covered = terms[left]
                    .literals
                    .keys()
                    .filter(|other| *other != key)
                    .all(|other| terms[right].literals.contains_key(other));
                if rest_covered {
                    return Some((right, dual_key));
                }
            }
        }
    }

    None
}

// Partition one term into the foldable constraints of one attribute and
// the residual literal keys. `None` when any literal of the attribute is
// not cleanly foldable into a single range.
fn attribute_range(term: &Term, attribute: &str) -> Option<(Range, Vec<String>)> {
    let mut range = Range::full();
    let mut residual = Vec::new();
    let mut rank: Option<u8> = None;
    let mut folded = 0usize;

    for (key, literal) in &term.literals {
        match fold_source(literal) {
            Some((owner, source)) if owner == attribute => {
                let value_rank = source.value().canonical_rank();
                if *rank.get_or_insert(value_rank) != value_rank {
                    return None;
                }
                let constraint = match source {
                    FoldSource::Point(v) => Range::point(v),
                    FoldSource::Above(v) => Range::greater_than(v),
                    FoldSource::AtMost(v) => Range::at_most(v),
                    // Residual exclusions do not merge across disjuncts.
                    FoldSource::Exclude(_) => return None,
                };
                range = range.and(&constraint)?;
                folded += 1;
            }
            _ => residual.push(key.clone()),
        }
    }

    (folded > 0).then_some((range, residual))
}

// A merged range must be expressible as conjunction literals again: a
// point, or an open/unbounded lower bound.
fn expressible(range: &Range) -> bool {
    range.as_point().is_some() || range.min().is_none() || !range.include_min()
}

// Range merge: two terms equal except for one attribute's range union
// into a single term when the union is one expressible range.
fn range_merge_pass(terms: &mut Vec<Term>, sink: Option<&dyn AlgebraTraceSink>) -> bool {
    for left in 0..terms.len() {
        let attributes: Vec<String> = terms[left]
            .literals
            .values()
            .filter_map(|literal| fold_source(literal).map(|(attribute, _)| attribute))
            .collect();

        for attribute in attributes {
            let Some((left_range, left_residual)) = attribute_range(&terms[left], &attribute)
            else {
                continue;
            };

            for right in 0..terms.len() {
                if left == right {
                    continue;
                }
                let Some((right_range, right_residual)) =
                    attribute_range(&terms[right], &attribute)
                else {
                    continue;
                };
                if left_residual != right_residual {
                    continue;
                }

                let Some(union) = left_range.or(&right_range) else {
                    continue;
                };
                if !expressible(&union) {
                    continue;
                }

                emit(sink, TraceEvent::SimplifyRule { rule: SimplifyRule::RangeMerge });
                let mut literals: Vec<Predicate> = left_residual
                    .iter()
                    .map(|key| terms[left].literals[key].clone())
                    .collect();
                literals.extend(range_literals(&attribute, &union, &[]));

                let merged = Term::from_literals(literals);
                let (keep, drop) = if left < right { (left, right) } else { (right, left) };
                terms.remove(drop);
                terms[keep] = merged;
                return true;
            }
        }
    }

    false
}
