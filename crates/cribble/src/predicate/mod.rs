mod ast;
mod atom;
mod canonical;
mod eval;
mod fingerprint;
mod parse;
mod render;
mod simplify;
mod split;
mod wire;

#[cfg(test)]
mod tests;

pub use ast::{ConstructError, Predicate, PredicateKind};
pub use atom::{AtomKind, FactMap, TestAtom, add_fact};
pub use eval::{Context, EvalError, MapContext, evaluate, evaluate_facts};
pub use fingerprint::fingerprint;
pub use parse::{ParseError, parse};
pub use simplify::{simplify, simplify_fixed, simplify_fixed_with_trace, simplify_with_trace};
pub use split::{SplitError, split, split_with_trace};
pub use wire::WireError;
