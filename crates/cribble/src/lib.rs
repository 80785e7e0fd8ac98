//! Cribble: a predicate algebra engine over named-attribute comparisons —
//! canonical disjunctive-normal forms, range-based algebraic
//! simplification, and case-splitting for record filters.
#![warn(unreachable_pub)]

pub(crate) mod combine;

pub mod pattern;
pub mod predicate;
pub mod range;
pub mod trace;
pub mod value;

///
/// CONSTANTS
///

/// Ceiling for fixed-point simplification passes.
///
/// Each pass strictly shrinks operand counts or range widths, so the
/// ceiling exists only to cap pathological inputs, not ordinary ones.
pub const MAX_SIMPLIFY_PASSES: usize = 8;

/// Ceiling for one split cross-product expansion.
///
/// Splitting a conjunction multiplies the operand split sizes; anything
/// past this bound surfaces as a recoverable `SplitError`.
pub const MAX_SPLIT_COMBINATIONS: usize = 4096;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, free functions, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        pattern::LikePattern,
        predicate::{AtomKind, Context, FactMap, Predicate, PredicateKind, TestAtom},
        range::Range,
        value::Value,
    };
}
