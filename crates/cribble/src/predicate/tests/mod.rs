mod eval;
mod property;
mod simplify;

use crate::{
    predicate::{MapContext, Predicate, evaluate},
    value::Value,
};
use std::collections::BTreeMap;

// One record literal for map-context evaluation.
pub(crate) fn record(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

// Evaluate against a map record, failing the test on evaluation errors.
pub(crate) fn eval_map(predicate: &Predicate, record: &BTreeMap<String, Value>) -> bool {
    evaluate(predicate, &MapContext, record).expect("evaluation should not error")
}

pub(crate) fn parse(input: &str) -> Predicate {
    crate::predicate::parse(input).expect("test input should parse")
}
