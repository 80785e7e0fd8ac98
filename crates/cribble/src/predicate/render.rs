use crate::{
    predicate::ast::{Predicate, PredicateKind},
    value::Value,
};
use std::fmt;

///
/// String rendering
///
/// Every predicate renders to the same infix syntax the parser accepts, so
/// rendering doubles as the canonical-order tie-break key. Negation is
/// pushed to the leaves while printing (De Morgan), negated comparisons
/// print as their dual operator, and parentheses appear only where the
/// grammar needs them: a disjunction operand inside a conjunction.
///

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, false)
    }
}

fn render(predicate: &Predicate, f: &mut fmt::Formatter<'_>, negated: bool) -> fmt::Result {
    match predicate.kind() {
        PredicateKind::Constant(value) => write!(f, "{}", value ^ negated),

        PredicateKind::Negation(operand) => render(operand, f, !negated),

        // A negated conjunction prints as the disjunction of negated
        // operands, and vice versa.
        PredicateKind::Conjunction(operands) => {
            if negated {
                render_disjunction(operands, f, true)
            } else {
                render_conjunction(operands, f, false)
            }
        }
        PredicateKind::Disjunction(operands) => {
            if negated {
                render_conjunction(operands, f, true)
            } else {
                render_disjunction(operands, f, false)
            }
        }

        PredicateKind::EqualTo { attribute, value } => match value {
            // Implicit truthiness: `attr == true` prints as the bare name.
            Value::Bool(true) if negated => write!(f, "!{attribute}"),
            Value::Bool(true) => write!(f, "{attribute}"),
            _ if negated => write!(f, "{attribute} != {value}"),
            _ => write!(f, "{attribute} == {value}"),
        },

        PredicateKind::GreaterThan { attribute, value } => {
            let op = if negated { "<=" } else { ">" };
            write!(f, "{attribute} {op} {value}")
        }

        PredicateKind::LesserThan { attribute, value } => {
            let op = if negated { ">=" } else { "<" };
            write!(f, "{attribute} {op} {value}")
        }

        PredicateKind::Like { attribute, pattern } => {
            if negated {
                write!(f, "!")?;
            }
            write!(f, "matches({attribute}, \"")?;
            for ch in pattern.source().chars() {
                match ch {
                    '"' => write!(f, "\\\"")?,
                    '\\' => write!(f, "\\\\")?,
                    other => write!(f, "{other}")?,
                }
            }
            write!(f, "\")")
        }

        PredicateKind::In { attribute, values } => {
            if negated {
                write!(f, "!")?;
            }
            write!(f, "contains({attribute}, {{")?;
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, "}})")
        }
    }
}

fn render_conjunction(
    operands: &[Predicate],
    f: &mut fmt::Formatter<'_>,
    negate_operands: bool,
) -> fmt::Result {
    for (index, operand) in operands.iter().enumerate() {
        if index > 0 {
            write!(f, " && ")?;
        }
        // `&&` binds tighter than `||`, so only a disjunction-shaped
        // operand needs wrapping.
        if renders_as_disjunction(operand, negate_operands) {
            write!(f, "(")?;
            render(operand, f, negate_operands)?;
            write!(f, ")")?;
        } else {
            render(operand, f, negate_operands)?;
        }
    }

    Ok(())
}

fn render_disjunction(
    operands: &[Predicate],
    f: &mut fmt::Formatter<'_>,
    negate_operands: bool,
) -> fmt::Result {
    for (index, operand) in operands.iter().enumerate() {
        if index > 0 {
            write!(f, " || ")?;
        }
        render(operand, f, negate_operands)?;
    }

    Ok(())
}

// Whether a node's rendering has `||` at the top level, accounting for the
// De Morgan flip a pending negation applies.
fn renders_as_disjunction(predicate: &Predicate, negated: bool) -> bool {
    match predicate.kind() {
        PredicateKind::Disjunction(_) => !negated,
        PredicateKind::Conjunction(_) => negated,
        PredicateKind::Negation(operand) => renders_as_disjunction(operand, !negated),
        _ => false,
    }
}
