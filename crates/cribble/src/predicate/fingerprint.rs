use crate::{
    predicate::ast::{Predicate, PredicateKind},
    value::Value,
};
use sha2::{Digest, Sha256};

/// Stable structural digest of a predicate's canonical form.
///
/// Equal predicates (canonical equality) produce equal digests across
/// processes, unlike `Hash`, which depends on the process hasher.
#[must_use]
pub fn fingerprint(predicate: &Predicate) -> [u8; 32] {
    let canonical = predicate.canonical();
    let mut hasher = Sha256::new();
    hash_predicate(&mut hasher, &canonical);

    hasher.finalize().into()
}

// Hash predicate structure into the digest stream.
fn hash_predicate(hasher: &mut Sha256, predicate: &Predicate) {
    match predicate.kind() {
        PredicateKind::Constant(false) => write_tag(hasher, 0x21),
        PredicateKind::Constant(true) => write_tag(hasher, 0x22),
        PredicateKind::Conjunction(operands) => {
            write_tag(hasher, 0x23);
            write_len_u32(hasher, operands.len());
            for operand in operands {
                hash_predicate(hasher, operand);
            }
        }
        PredicateKind::Disjunction(operands) => {
            write_tag(hasher, 0x24);
            write_len_u32(hasher, operands.len());
            for operand in operands {
                hash_predicate(hasher, operand);
            }
        }
        PredicateKind::Negation(operand) => {
            write_tag(hasher, 0x25);
            hash_predicate(hasher, operand);
        }
        PredicateKind::EqualTo { attribute, value } => {
            write_tag(hasher, 0x26);
            write_str(hasher, attribute);
            write_value(hasher, value);
        }
        PredicateKind::GreaterThan { attribute, value } => {
            write_tag(hasher, 0x27);
            write_str(hasher, attribute);
            write_value(hasher, value);
        }
        PredicateKind::LesserThan { attribute, value } => {
            write_tag(hasher, 0x28);
            write_str(hasher, attribute);
            write_value(hasher, value);
        }
        PredicateKind::Like { attribute, pattern } => {
            write_tag(hasher, 0x29);
            write_str(hasher, attribute);
            write_str(hasher, pattern.source());
        }
        PredicateKind::In { attribute, values } => {
            write_tag(hasher, 0x2a);
            write_str(hasher, attribute);
            write_len_u32(hasher, values.len());
            for value in values {
                write_value(hasher, value);
            }
        }
    }
}

// Encode one value with a variant tag and fixed-width payload.
fn write_value(hasher: &mut Sha256, value: &Value) {
    write_tag(hasher, value.canonical_rank());
    match value {
        Value::Null => {}
        Value::Bool(v) => write_tag(hasher, u8::from(*v)),
        Value::Int(v) => hasher.update(v.to_be_bytes()),
        Value::Float(v) => hasher.update(v.to_bits().to_be_bytes()),
        Value::Text(v) => write_str(hasher, v),
    }
}

// Encode one string with length prefix into the digest stream.
fn write_str(hasher: &mut Sha256, value: &str) {
    write_len_u32(hasher, value.len());
    hasher.update(value.as_bytes());
}

// Encode a platform-sized length as u32 with deterministic saturation.
fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}
