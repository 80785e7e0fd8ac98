//! Algebra tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! rewrite semantics.

///
/// AlgebraTraceSink
///

pub trait AlgebraTraceSink: Send + Sync {
    fn on_event(&self, event: TraceEvent);
}

///
/// SimplifyRule
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SimplifyRule {
    RangeFold,
    ExclusionFold,
    Absorption,
    Resolvent,
    Consensus,
    Complement,
    RangeMerge,
}

///
/// TraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// One fixed-point simplifier pass completed.
    SimplifyPass {
        pass: u32,
        terms_before: usize,
        terms_after: usize,
    },
    /// One redundancy or folding rule fired.
    SimplifyRule { rule: SimplifyRule },
    /// The splitter expanded one conjunction cross-product.
    SplitExpansion { operands: usize, combinations: usize },
}

// Forward events only when a sink is attached.
pub(crate) fn emit(sink: Option<&dyn AlgebraTraceSink>, event: TraceEvent) {
    if let Some(sink) = sink {
        sink.on_event(event);
    }
}
