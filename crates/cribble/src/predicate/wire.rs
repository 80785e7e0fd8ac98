use crate::{
    pattern::{LikePattern, PatternError},
    predicate::ast::{ConstructError, Predicate, PredicateKind},
    value::Value,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error as ThisError;

///
/// WireError
///
/// Decode failures: the wire shape is structurally valid serde data that
/// violates a construction invariant.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum WireError {
    #[error(transparent)]
    Construct(#[from] ConstructError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

///
/// PredicateWire
///
/// Serde shape for predicates: variant tag plus operand list, nothing
/// else. Decoding rebuilds through the public constructors so arity
/// collapse and `In` degeneration are re-established on the way in.
///

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum PredicateWire {
    Conjunction(Vec<Self>),
    Disjunction(Vec<Self>),
    Negation(Box<Self>),
    EqualTo { attribute: String, value: Value },
    GreaterThan { attribute: String, value: Value },
    LesserThan { attribute: String, value: Value },
    Like { attribute: String, pattern: String },
    In { attribute: String, values: Vec<Value> },
    Constant(bool),
}

impl PredicateWire {
    fn from_predicate(predicate: &Predicate) -> Self {
        match predicate.kind() {
            PredicateKind::Conjunction(operands) => {
                Self::Conjunction(operands.iter().map(Self::from_predicate).collect())
            }
            PredicateKind::Disjunction(operands) => {
                Self::Disjunction(operands.iter().map(Self::from_predicate).collect())
            }
            PredicateKind::Negation(operand) => {
                Self::Negation(Box::new(Self::from_predicate(operand)))
            }
            PredicateKind::EqualTo { attribute, value } => Self::EqualTo {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            PredicateKind::GreaterThan { attribute, value } => Self::GreaterThan {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            PredicateKind::LesserThan { attribute, value } => Self::LesserThan {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            PredicateKind::Like { attribute, pattern } => Self::Like {
                attribute: attribute.clone(),
                pattern: pattern.source().to_string(),
            },
            PredicateKind::In { attribute, values } => Self::In {
                attribute: attribute.clone(),
                values: values.clone(),
            },
            PredicateKind::Constant(value) => Self::Constant(*value),
        }
    }

    // Decode recursively, re-running construction invariants.
    fn into_predicate(self) -> Result<Predicate, WireError> {
        match self {
            Self::Conjunction(operands) => {
                let operands = operands
                    .into_iter()
                    .map(Self::into_predicate)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Predicate::conjunction(operands)?)
            }
            Self::Disjunction(operands) => {
                let operands = operands
                    .into_iter()
                    .map(Self::into_predicate)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Predicate::disjunction(operands)?)
            }
            Self::Negation(operand) => Ok(Predicate::negation(operand.into_predicate()?)),
            Self::EqualTo { attribute, value } => Ok(Predicate::equal_to(attribute, value)),
            Self::GreaterThan { attribute, value } => {
                Ok(Predicate::greater_than(attribute, value)?)
            }
            Self::LesserThan { attribute, value } => Ok(Predicate::lesser_than(attribute, value)?),
            Self::Like { attribute, pattern } => {
                Ok(Predicate::like(attribute, LikePattern::new(pattern)?))
            }
            Self::In { attribute, values } => Ok(Predicate::is_in(attribute, values)),
            Self::Constant(value) => Ok(Predicate::constant(value)),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PredicateWire::from_predicate(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PredicateWire::deserialize(deserializer)?
            .into_predicate()
            .map_err(serde::de::Error::custom)
    }
}
