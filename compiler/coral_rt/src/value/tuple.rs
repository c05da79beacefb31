//! Tuple payload.

use super::heap::HeapPayload;
use super::{Kind, Value};
use crate::stack::ensure_sufficient_stack;

/// A pair of values. The tuple co-owns both children.
#[derive(Debug, PartialEq)]
pub struct TupleData {
    pub(crate) first: Value,
    pub(crate) second: Value,
}

impl TupleData {
    pub fn first(&self) -> &Value {
        &self.first
    }

    pub fn second(&self) -> &Value {
        &self.second
    }
}

impl HeapPayload for TupleData {
    const KIND: Kind = Kind::Tuple;
}

impl Drop for TupleData {
    fn drop(&mut self) {
        // Releasing a child may free a nested tuple, which recurses back here.
        let first = std::mem::replace(&mut self.first, Value::Bool(false));
        let second = std::mem::replace(&mut self.second, Value::Bool(false));
        ensure_sufficient_stack(move || drop((first, second)));
    }
}
