use crate::{
    predicate::ast::{Predicate, PredicateKind},
    value::{Value, canonical_cmp},
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

///
/// AtomKind
///
/// How a fact describes an attribute's value. `EqualTo` carries
/// equality-class knowledge; `Exactly` carries the literal value itself and
/// is therefore the only equality fact a wildcard pattern may match against.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum AtomKind {
    EqualTo = 0x01,
    GreaterThan = 0x02,
    LesserThan = 0x03,
    Like = 0x04,
    Exactly = 0x05,
}

///
/// TestAtom
///
/// One pre-digested fact: "the attribute is reported as {kind} {value}".
/// A record summary carries a set of these per attribute so predicates can
/// be evaluated without re-accessing the source record.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestAtom {
    kind: AtomKind,
    value: Value,
}

/// Per-attribute fact sets describing one summarized record.
pub type FactMap = BTreeMap<String, BTreeSet<TestAtom>>;

impl TestAtom {
    #[must_use]
    pub const fn new(kind: AtomKind, value: Value) -> Self {
        Self { kind, value }
    }

    #[must_use]
    pub fn equal_to(value: impl Into<Value>) -> Self {
        Self::new(AtomKind::EqualTo, value.into())
    }

    #[must_use]
    pub fn greater_than(value: impl Into<Value>) -> Self {
        Self::new(AtomKind::GreaterThan, value.into())
    }

    #[must_use]
    pub fn lesser_than(value: impl Into<Value>) -> Self {
        Self::new(AtomKind::LesserThan, value.into())
    }

    #[must_use]
    pub fn like(pattern_source: impl Into<String>) -> Self {
        Self::new(AtomKind::Like, Value::Text(pattern_source.into()))
    }

    #[must_use]
    pub fn exactly(value: impl Into<Value>) -> Self {
        Self::new(AtomKind::Exactly, value.into())
    }

    #[must_use]
    pub const fn kind(&self) -> AtomKind {
        self.kind
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }
}

impl Ord for TestAtom {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| canonical_cmp(&self.value, &other.value))
    }
}

impl PartialOrd for TestAtom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Insert one fact into a map under construction.
pub fn add_fact(facts: &mut FactMap, attribute: impl Into<String>, atom: TestAtom) {
    facts.entry(attribute.into()).or_default().insert(atom);
}

// Collect the per-attribute facts a predicate's leaves mention. Negation
// context is ignored on purpose: the map records which facts the tree
// talks about, not their polarity.
pub(crate) fn derive_atoms(predicate: &Predicate) -> FactMap {
    let mut out = FactMap::new();
    walk(predicate, &mut out);
    out
}

fn walk(predicate: &Predicate, out: &mut FactMap) {
    match predicate.kind() {
        PredicateKind::Conjunction(operands) | PredicateKind::Disjunction(operands) => {
            for operand in operands {
                walk(operand, out);
            }
        }
        PredicateKind::Negation(operand) => walk(operand, out),
        PredicateKind::EqualTo { attribute, value } => {
            add_fact(out, attribute.clone(), TestAtom::equal_to(value.clone()));
        }
        PredicateKind::GreaterThan { attribute, value } => {
            add_fact(out, attribute.clone(), TestAtom::greater_than(value.clone()));
        }
        PredicateKind::LesserThan { attribute, value } => {
            add_fact(out, attribute.clone(), TestAtom::lesser_than(value.clone()));
        }
        PredicateKind::Like { attribute, pattern } => {
            add_fact(out, attribute.clone(), TestAtom::like(pattern.source()));
        }
        PredicateKind::In { attribute, values } => {
            for value in values {
                add_fact(out, attribute.clone(), TestAtom::equal_to(value.clone()));
            }
        }
        PredicateKind::Constant(_) => {}
    }
}
