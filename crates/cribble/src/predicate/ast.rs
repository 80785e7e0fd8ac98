use crate::{
    pattern::{LikePattern, PatternError},
    predicate::atom::{FactMap, derive_atoms},
    predicate::canonical::canonicalize,
    value::{Value, canonical_cmp},
};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, Not};
use std::sync::{Arc, LazyLock, OnceLock};
use thiserror::Error as ThisError;

///
/// Predicate AST
///
/// Pure representation of attribute filters. This layer contains no
/// evaluation, canonicalization, or simplification logic; those are
/// separate passes over the tree. Nodes are immutable after construction
/// and cheap to clone (one shared allocation per node).
///

///
/// ConstructError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConstructError {
    #[error("{kind} requires at least one operand")]
    EmptyCompound { kind: &'static str },

    #[error("`{attribute}`: ordering comparison value must not be null")]
    NullOrderingValue { attribute: String },
}

///
/// PredicateKind
///
/// The closed set of node kinds. Readable through `Predicate::kind` for
/// matching and serialization; construction always goes through the
/// `Predicate` constructors so arity and degeneration invariants hold.
///

#[derive(Clone, Debug)]
pub enum PredicateKind {
    /// Ordered operands, len >= 2 after construction-time collapse.
    Conjunction(Vec<Predicate>),
    /// Ordered operands, len >= 2 after construction-time collapse.
    Disjunction(Vec<Predicate>),
    Negation(Predicate),
    EqualTo { attribute: String, value: Value },
    GreaterThan { attribute: String, value: Value },
    LesserThan { attribute: String, value: Value },
    Like { attribute: String, pattern: LikePattern },
    /// Sorted, deduplicated, len >= 2 (smaller sets degenerate).
    In { attribute: String, values: Vec<Value> },
    Constant(bool),
}

struct Node {
    kind: PredicateKind,
    /// Set when this node was produced by the canonicalizer; such nodes
    /// are their own canonical form and never populate the cache below.
    is_canonical: bool,
    canonical_form: OnceLock<Predicate>,
    attributes: OnceLock<BTreeSet<String>>,
    atoms: OnceLock<FactMap>,
}

///
/// Predicate
///

#[derive(Clone)]
pub struct Predicate {
    node: Arc<Node>,
}

static ALWAYS: LazyLock<Predicate> =
    LazyLock::new(|| Predicate::from_kind_canonical(PredicateKind::Constant(true)));
static NEVER: LazyLock<Predicate> =
    LazyLock::new(|| Predicate::from_kind_canonical(PredicateKind::Constant(false)));

impl Predicate {
    pub(crate) fn from_kind(kind: PredicateKind) -> Self {
        Self {
            node: Arc::new(Node {
                kind,
                is_canonical: false,
                canonical_form: OnceLock::new(),
                attributes: OnceLock::new(),
                atoms: OnceLock::new(),
            }),
        }
    }

    /// Wrap a node produced by the canonicalizer; it is its own canonical
    /// form, so `canonical()` short-circuits without a cache slot.
    pub(crate) fn from_kind_canonical(kind: PredicateKind) -> Self {
        Self {
            node: Arc::new(Node {
                kind,
                is_canonical: true,
                canonical_form: OnceLock::new(),
                attributes: OnceLock::new(),
                atoms: OnceLock::new(),
            }),
        }
    }

    /// The constant-true predicate.
    #[must_use]
    pub fn always() -> Self {
        ALWAYS.clone()
    }

    /// The constant-false predicate.
    #[must_use]
    pub fn never() -> Self {
        NEVER.clone()
    }

    #[must_use]
    pub fn constant(value: bool) -> Self {
        if value { Self::always() } else { Self::never() }
    }

    /// Build a conjunction. One operand collapses to itself; zero operands
    /// are a construction error.
    pub fn conjunction(mut operands: Vec<Self>) -> Result<Self, ConstructError> {
        match operands.len() {
            0 => Err(ConstructError::EmptyCompound {
                kind: "conjunction",
            }),
            1 => Ok(operands.remove(0)),
            _ => Ok(Self::from_kind(PredicateKind::Conjunction(operands))),
        }
    }

    /// Build a disjunction. One operand collapses to itself; zero operands
    /// are a construction error.
    pub fn disjunction(mut operands: Vec<Self>) -> Result<Self, ConstructError> {
        match operands.len() {
            0 => Err(ConstructError::EmptyCompound {
                kind: "disjunction",
            }),
            1 => Ok(operands.remove(0)),
            _ => Ok(Self::from_kind(PredicateKind::Disjunction(operands))),
        }
    }

    #[must_use]
    pub fn negation(operand: Self) -> Self {
        Self::from_kind(PredicateKind::Negation(operand))
    }

    #[must_use]
    pub fn equal_to(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::from_kind(PredicateKind::EqualTo {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// `attribute != value` sugar.
    #[must_use]
    pub fn not_equal_to(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::negation(Self::equal_to(attribute, value))
    }

    pub fn greater_than(
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        let (attribute, value) = ordered_operands(attribute, value)?;

        Ok(Self::from_kind(PredicateKind::GreaterThan {
            attribute,
            value,
        }))
    }

    pub fn lesser_than(
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        let (attribute, value) = ordered_operands(attribute, value)?;

        Ok(Self::from_kind(PredicateKind::LesserThan {
            attribute,
            value,
        }))
    }

    /// `attribute >= value` sugar: the negation of `LesserThan`.
    pub fn at_least(
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        Ok(Self::negation(Self::lesser_than(attribute, value)?))
    }

    /// `attribute <= value` sugar: the negation of `GreaterThan`.
    pub fn at_most(
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ConstructError> {
        Ok(Self::negation(Self::greater_than(attribute, value)?))
    }

    #[must_use]
    pub fn like(attribute: impl Into<String>, pattern: LikePattern) -> Self {
        Self::from_kind(PredicateKind::Like {
            attribute: attribute.into(),
            pattern,
        })
    }

    /// `Like` from a wildcard source string.
    pub fn matches(
        attribute: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<Self, PatternError> {
        Ok(Self::like(attribute, LikePattern::new(pattern)?))
    }

    /// Set membership. One member degenerates to `EqualTo`; an empty set
    /// can never match and degenerates to the constant-false predicate.
    #[must_use]
    pub fn is_in(attribute: impl Into<String>, values: Vec<Value>) -> Self {
        let mut values = values;
        values.sort_by(canonical_cmp);
        values.dedup();

        match values.len() {
            0 => Self::never(),
            1 => Self::equal_to(attribute, values.remove(0)),
            _ => Self::from_kind(PredicateKind::In {
                attribute: attribute.into(),
                values,
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &PredicateKind {
        &self.node.kind
    }

    /// Number of predicate operands, for external tree walkers.
    #[must_use]
    pub fn operand_count(&self) -> usize {
        match self.kind() {
            PredicateKind::Conjunction(operands) | PredicateKind::Disjunction(operands) => {
                operands.len()
            }
            PredicateKind::Negation(_) => 1,
            _ => 0,
        }
    }

    /// Predicate operand by index, for external tree walkers.
    #[must_use]
    pub fn operand(&self, index: usize) -> Option<&Self> {
        match self.kind() {
            PredicateKind::Conjunction(operands) | PredicateKind::Disjunction(operands) => {
                operands.get(index)
            }
            PredicateKind::Negation(operand) if index == 0 => Some(operand),
            _ => None,
        }
    }

    /// Whether this node was produced by the canonicalizer.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.node.is_canonical
    }

    /// Canonical disjunctive-normal form, computed at most once per
    /// instance. Canonical equality is the basis of `Eq` and `Hash`.
    #[must_use]
    pub fn canonical(&self) -> Self {
        if self.node.is_canonical {
            return self.clone();
        }

        self.node
            .canonical_form
            .get_or_init(|| canonicalize(self))
            .clone()
    }

    /// Every attribute name referenced anywhere in the tree.
    pub fn attributes(&self) -> &BTreeSet<String> {
        self.node.attributes.get_or_init(|| {
            let mut out = BTreeSet::new();
            collect_attributes(self, &mut out);
            out
        })
    }

    /// The per-attribute fact set this predicate mentions, usable as the
    /// fact map of a record known to satisfy each leaf.
    pub fn test_atoms(&self) -> &FactMap {
        self.node.atoms.get_or_init(|| derive_atoms(self))
    }

    /// Structural node-for-node comparison, with no canonicalization.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }

        match (self.kind(), other.kind()) {
            (PredicateKind::Conjunction(a), PredicateKind::Conjunction(b))
            | (PredicateKind::Disjunction(a), PredicateKind::Disjunction(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
            }
            (PredicateKind::Negation(a), PredicateKind::Negation(b)) => a.same_shape(b),
            (
                PredicateKind::EqualTo {
                    attribute: a,
                    value: av,
                },
                PredicateKind::EqualTo {
                    attribute: b,
                    value: bv,
                },
            )
            | (
                PredicateKind::GreaterThan {
                    attribute: a,
                    value: av,
                },
                PredicateKind::GreaterThan {
                    attribute: b,
                    value: bv,
                },
            )
            | (
                PredicateKind::LesserThan {
                    attribute: a,
                    value: av,
                },
                PredicateKind::LesserThan {
                    attribute: b,
                    value: bv,
                },
            ) => a == b && av == bv,
            (
                PredicateKind::Like {
                    attribute: a,
                    pattern: ap,
                },
                PredicateKind::Like {
                    attribute: b,
                    pattern: bp,
                },
            ) => a == b && ap == bp,
            (
                PredicateKind::In {
                    attribute: a,
                    values: av,
                },
                PredicateKind::In {
                    attribute: b,
                    values: bv,
                },
            ) => a == b && av == bv,
            (PredicateKind::Constant(a), PredicateKind::Constant(b)) => a == b,
            _ => false,
        }
    }

    // Hash the node structure; used on canonical forms only.
    fn hash_shape<H: Hasher>(&self, state: &mut H) {
        match self.kind() {
            PredicateKind::Conjunction(operands) => {
                state.write_u8(0x01);
                state.write_usize(operands.len());
                for operand in operands {
                    operand.hash_shape(state);
                }
            }
            PredicateKind::Disjunction(operands) => {
                state.write_u8(0x02);
                state.write_usize(operands.len());
                for operand in operands {
                    operand.hash_shape(state);
                }
            }
            PredicateKind::Negation(operand) => {
                state.write_u8(0x03);
                operand.hash_shape(state);
            }
            PredicateKind::EqualTo { attribute, value } => {
                state.write_u8(0x04);
                attribute.hash(state);
                value.hash(state);
            }
            PredicateKind::GreaterThan { attribute, value } => {
                state.write_u8(0x05);
                attribute.hash(state);
                value.hash(state);
            }
            PredicateKind::LesserThan { attribute, value } => {
                state.write_u8(0x06);
                attribute.hash(state);
                value.hash(state);
            }
            PredicateKind::Like { attribute, pattern } => {
                state.write_u8(0x07);
                attribute.hash(state);
                pattern.hash(state);
            }
            PredicateKind::In { attribute, values } => {
                state.write_u8(0x08);
                attribute.hash(state);
                state.write_usize(values.len());
                for value in values {
                    value.hash(state);
                }
            }
            PredicateKind::Constant(value) => {
                state.write_u8(0x09);
                value.hash(state);
            }
        }
    }
}

fn ordered_operands(
    attribute: impl Into<String>,
    value: impl Into<Value>,
) -> Result<(String, Value), ConstructError> {
    let attribute = attribute.into();
    let value = value.into();
    if value.is_null() {
        return Err(ConstructError::NullOrderingValue { attribute });
    }

    Ok((attribute, value))
}

fn collect_attributes(predicate: &Predicate, out: &mut BTreeSet<String>) {
    match predicate.kind() {
        PredicateKind::Conjunction(operands) | PredicateKind::Disjunction(operands) => {
            for operand in operands {
                collect_attributes(operand, out);
            }
        }
        PredicateKind::Negation(operand) => collect_attributes(operand, out),
        PredicateKind::EqualTo { attribute, .. }
        | PredicateKind::GreaterThan { attribute, .. }
        | PredicateKind::LesserThan { attribute, .. }
        | PredicateKind::Like { attribute, .. }
        | PredicateKind::In { attribute, .. } => {
            out.insert(attribute.clone());
        }
        PredicateKind::Constant(_) => {}
    }
}

impl PartialEq for Predicate {
    /// Predicates are equal iff their canonical forms are structurally
    /// identical node-for-node.
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }

        self.canonical().same_shape(&other.canonical())
    }
}

impl Eq for Predicate {}

impl Hash for Predicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash_shape(state);
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.kind(), f)
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_kind(PredicateKind::Conjunction(vec![self, rhs]))
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        Predicate::from_kind(PredicateKind::Conjunction(vec![self.clone(), rhs.clone()]))
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_kind(PredicateKind::Disjunction(vec![self, rhs]))
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        Predicate::from_kind(PredicateKind::Disjunction(vec![self.clone(), rhs.clone()]))
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::negation(self)
    }
}

impl Not for &Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Predicate::negation(self.clone())
    }
}
