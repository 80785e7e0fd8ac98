use crate::{
    combine::{CartesianProduct, product_len},
    predicate::ast::{Predicate, PredicateKind},
    trace::{AlgebraTraceSink, TraceEvent, emit},
};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// Splitter
///
/// Expands a predicate into a set of simpler predicates whose disjunction
/// is logically equivalent to the input: `In` explodes into one `EqualTo`
/// per member, disjunctions split operand-wise, and conjunctions take the
/// full cross-product of their operands' splits. The cross-product is
/// multiplicative, so each expansion is guarded by
/// `MAX_SPLIT_COMBINATIONS`.
///

///
/// SplitError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SplitError {
    #[error("splitting would enumerate {combinations} combinations (limit {limit})")]
    TooManyCombinations { combinations: usize, limit: usize },
}

/// Split a predicate into union-equivalent parts, deduplicated by
/// canonical equality.
pub fn split(predicate: &Predicate) -> Result<Vec<Predicate>, SplitError> {
    split_with_trace(predicate, None)
}

/// Split with an attached trace sink.
pub fn split_with_trace(
    predicate: &Predicate,
    sink: Option<&dyn AlgebraTraceSink>,
) -> Result<Vec<Predicate>, SplitError> {
    let parts = split_inner(predicate, sink)?;

    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        if seen.insert(part.canonical().to_string()) {
            out.push(part);
        }
    }

    Ok(out)
}

fn split_inner(
    predicate: &Predicate,
    sink: Option<&dyn AlgebraTraceSink>,
) -> Result<Vec<Predicate>, SplitError> {
    match predicate.kind() {
        PredicateKind::Constant(_)
        | PredicateKind::EqualTo { .. }
        | PredicateKind::GreaterThan { .. }
        | PredicateKind::LesserThan { .. }
        | PredicateKind::Like { .. } => Ok(vec![predicate.clone()]),

        PredicateKind::In { attribute, values } => Ok(values
            .iter()
            .map(|value| Predicate::equal_to(attribute.clone(), value.clone()))
            .collect()),

        PredicateKind::Disjunction(operands) => {
            let mut out = Vec::new();
            for operand in operands {
                out.extend(split_inner(operand, sink)?);
            }
            Ok(out)
        }

        PredicateKind::Conjunction(operands) => {
            let mut sets = Vec::with_capacity(operands.len());
            for operand in operands {
                sets.push(split_inner(operand, sink)?);
            }

            let combinations = product_len(&sets);
            if combinations > crate::MAX_SPLIT_COMBINATIONS {
                return Err(SplitError::TooManyCombinations {
                    combinations,
                    limit: crate::MAX_SPLIT_COMBINATIONS,
                });
            }
            emit(
                sink,
                TraceEvent::SplitExpansion {
                    operands: sets.len(),
                    combinations,
                },
            );

            let mut out = Vec::with_capacity(combinations);
            for selection in CartesianProduct::new(&sets) {
                let term: Vec<Predicate> = selection.into_iter().cloned().collect();
                out.push(Predicate::from_kind(PredicateKind::Conjunction(term)));
            }
            Ok(out)
        }

        PredicateKind::Negation(inner) => split_negation(inner, sink),
    }
}

// Distribute a negation before splitting: De Morgan over compounds, a
// conjunction of exclusions for `In`, the operand itself for a double
// negation.
fn split_negation(
    inner: &Predicate,
    sink: Option<&dyn AlgebraTraceSink>,
) -> Result<Vec<Predicate>, SplitError> {
    match inner.kind() {
        PredicateKind::Negation(operand) => split_inner(operand, sink),

        PredicateKind::Constant(value) => Ok(vec![Predicate::constant(!value)]),

        // !(a || b) == !a && !b: one conjunction, split as such.
        PredicateKind::Disjunction(operands) => {
            let negated: Vec<Predicate> = operands
                .iter()
                .map(|operand| Predicate::negation(operand.clone()))
                .collect();
            split_inner(
                &Predicate::from_kind(PredicateKind::Conjunction(negated)),
                sink,
            )
        }

        // !(a && b) == !a || !b: the union of the negated operand splits.
        PredicateKind::Conjunction(operands) => {
            let mut out = Vec::new();
            for operand in operands {
                out.extend(split_negation(operand, sink)?);
            }
            Ok(out)
        }

        // Not-in is one conjunction of per-member exclusions; member sets
        // have at least two values by construction.
        PredicateKind::In { attribute, values } => {
            let exclusions: Vec<Predicate> = values
                .iter()
                .map(|value| Predicate::not_equal_to(attribute.clone(), value.clone()))
                .collect();
            Ok(vec![Predicate::from_kind(PredicateKind::Conjunction(
                exclusions,
            ))])
        }

        PredicateKind::EqualTo { .. }
        | PredicateKind::GreaterThan { .. }
        | PredicateKind::LesserThan { .. }
        | PredicateKind::Like { .. } => Ok(vec![Predicate::negation(inner.clone())]),
    }
}
