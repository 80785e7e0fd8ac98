use crate::{
    predicate::ast::{Predicate, PredicateKind},
    predicate::atom::{AtomKind, FactMap, TestAtom},
    value::{Value, strict_order_cmp},
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// EvalError
///

#[derive(Debug, ThisError)]
pub enum EvalError {
    /// The caller's attribute accessor failed; the source error passes
    /// through unmodified.
    #[error("attribute `{attribute}` lookup failed")]
    Lookup {
        attribute: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An ordering comparison met a value it cannot order. Surfaced, not
    /// swallowed: silently returning false would hide a schema mismatch.
    #[error("attribute `{attribute}`: ordering comparison expects {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl EvalError {
    /// Wrap a caller-side lookup failure for propagation.
    pub fn lookup(
        attribute: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Lookup {
            attribute: attribute.into(),
            source: source.into(),
        }
    }
}

///
/// Context
///
/// Caller-supplied attribute accessor. The engine never interprets
/// attribute name structure; dotted or nested names are opaque strings
/// resolved entirely by the implementation. `None` means the record has no
/// such attribute. The accessor is assumed side-effect-free and may be
/// re-entered once per attribute reference in the tree.
///

pub trait Context {
    type Record: ?Sized;

    fn value(&self, record: &Self::Record, attribute: &str) -> Result<Option<Value>, EvalError>;
}

///
/// MapContext
///
/// Context over plain `BTreeMap<String, Value>` records.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MapContext;

impl Context for MapContext {
    type Record = BTreeMap<String, Value>;

    fn value(&self, record: &Self::Record, attribute: &str) -> Result<Option<Value>, EvalError> {
        Ok(record.get(attribute).cloned())
    }
}

/// Evaluate a predicate against one record through a context.
///
/// Conjunctions and disjunctions short-circuit in operand order. Lookup
/// failures and ordering type mismatches surface as errors; everything
/// else is a plain boolean.
pub fn evaluate<C: Context>(
    predicate: &Predicate,
    context: &C,
    record: &C::Record,
) -> Result<bool, EvalError> {
    match predicate.kind() {
        PredicateKind::Constant(value) => Ok(*value),

        PredicateKind::Conjunction(operands) => {
            for operand in operands {
                if !evaluate(operand, context, record)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        PredicateKind::Disjunction(operands) => {
            for operand in operands {
                if evaluate(operand, context, record)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        PredicateKind::Negation(operand) => Ok(!evaluate(operand, context, record)?),

        // Null-safe: an absent attribute behaves as null, and cross-variant
        // equality is false rather than an error.
        PredicateKind::EqualTo { attribute, value } => {
            let actual = context.value(record, attribute)?.unwrap_or(Value::Null);
            Ok(actual == *value)
        }

        PredicateKind::GreaterThan { attribute, value } => {
            Ok(ordered_cmp(context, record, attribute, value)?.is_gt())
        }

        PredicateKind::LesserThan { attribute, value } => {
            Ok(ordered_cmp(context, record, attribute, value)?.is_lt())
        }

        // An absent attribute is defined as a non-match, not an error.
        PredicateKind::Like { attribute, pattern } => {
            let matched = context
                .value(record, attribute)?
                .and_then(|actual| actual.render_plain())
                .is_some_and(|text| pattern.matches(&text));
            Ok(matched)
        }

        PredicateKind::In { attribute, values } => {
            let matched = context
                .value(record, attribute)?
                .is_some_and(|actual| values.contains(&actual));
            Ok(matched)
        }
    }
}

fn ordered_cmp<C: Context>(
    context: &C,
    record: &C::Record,
    attribute: &str,
    value: &Value,
) -> Result<Ordering, EvalError> {
    let Some(actual) = context.value(record, attribute)? else {
        return Err(EvalError::TypeMismatch {
            attribute: attribute.to_string(),
            expected: value.kind_name(),
            found: "missing",
        });
    };

    strict_order_cmp(&actual, value).ok_or_else(|| EvalError::TypeMismatch {
        attribute: attribute.to_string(),
        expected: value.kind_name(),
        found: actual.kind_name(),
    })
}

/// Evaluate a predicate against pre-digested facts instead of a live
/// record. A leaf is satisfied when any atom of its attribute's set
/// satisfies it.
///
/// PANICS: referencing an attribute with no fact entry is a caller
/// contract breach and fails fast.
#[must_use]
pub fn evaluate_facts(predicate: &Predicate, facts: &FactMap) -> bool {
    match predicate.kind() {
        PredicateKind::Constant(value) => *value,

        PredicateKind::Conjunction(operands) => operands
            .iter()
            .all(|operand| evaluate_facts(operand, facts)),

        PredicateKind::Disjunction(operands) => operands
            .iter()
            .any(|operand| evaluate_facts(operand, facts)),

        PredicateKind::Negation(operand) => !evaluate_facts(operand, facts),

        PredicateKind::EqualTo { attribute, .. }
        | PredicateKind::GreaterThan { attribute, .. }
        | PredicateKind::LesserThan { attribute, .. }
        | PredicateKind::Like { attribute, .. }
        | PredicateKind::In { attribute, .. } => atoms_for(facts, attribute)
            .iter()
            .any(|atom| leaf_matches_atom(predicate.kind(), atom)),
    }
}

fn atoms_for<'a>(facts: &'a FactMap, attribute: &str) -> &'a std::collections::BTreeSet<TestAtom> {
    facts.get(attribute).unwrap_or_else(|| {
        panic!("no test atoms supplied for attribute `{attribute}`");
    })
}

// Atom-type-aware leaf comparison: the predicate's operand value against
// the atom's value, with the atom kind deciding which outcomes are
// certain. Uncertain knowledge evaluates to false.
fn leaf_matches_atom(kind: &PredicateKind, atom: &TestAtom) -> bool {
    match kind {
        PredicateKind::EqualTo { value, .. } => match atom.kind() {
            AtomKind::EqualTo | AtomKind::Exactly => atom.value() == value,
            _ => false,
        },

        PredicateKind::GreaterThan { value, .. } => match atom.kind() {
            AtomKind::EqualTo | AtomKind::Exactly => {
                strict_order_cmp(atom.value(), value).is_some_and(Ordering::is_gt)
            }
            // "x > a" certainly implies "x > v" only when a >= v.
            AtomKind::GreaterThan => {
                strict_order_cmp(atom.value(), value).is_some_and(Ordering::is_ge)
            }
            _ => false,
        },

        PredicateKind::LesserThan { value, .. } => match atom.kind() {
            AtomKind::EqualTo | AtomKind::Exactly => {
                strict_order_cmp(atom.value(), value).is_some_and(Ordering::is_lt)
            }
            AtomKind::LesserThan => {
                strict_order_cmp(atom.value(), value).is_some_and(Ordering::is_le)
            }
            _ => false,
        },

        // A pattern only matches the literal value of an EXACTLY atom, or
        // a LIKE atom carrying the identical pattern.
        PredicateKind::Like { pattern, .. } => match atom.kind() {
            AtomKind::Exactly => atom
                .value()
                .render_plain()
                .is_some_and(|text| pattern.matches(&text)),
            AtomKind::Like => matches!(atom.value(), Value::Text(source) if source == pattern.source()),
            _ => false,
        },

        PredicateKind::In { values, .. } => match atom.kind() {
            AtomKind::EqualTo | AtomKind::Exactly => values.contains(atom.value()),
            _ => false,
        },

        _ => false,
    }
}
