//! Value-level narrowing.
//!
//! Each function returns the part of a value consistent with one outcome of
//! a test, or `Impossible` when no part is. Which test applies to which
//! variable is decided by the evaluator's condition analysis.

use crate::{Instance, Value};

/// Narrow by truthiness: `polarity` true keeps what can be truthy.
pub fn narrow_truthiness(value: &Value, polarity: bool) -> Value {
    if polarity {
        value.narrow_for_truthy()
    } else {
        value.narrow_for_falsey()
    }
}

/// Narrow by `value == target`.
///
/// On the true side, members that cannot equal `target` are dropped and
/// same-class members of unknown value become `target` itself. On the false
/// side, members definitely equal to `target` are dropped. A target that is
/// not a single known instance narrows nothing.
pub fn narrow_equal(value: &Value, target: &Value, polarity: bool) -> Value {
    let Value::Instance(target) = target else {
        return value.clone();
    };
    if !target.value_known() {
        return value.clone();
    }
    value.map_members(|m| match (m.equality(target), polarity) {
        (Some(true), true) => Value::Instance(*m),
        (None, true) => Value::Instance(*target),
        (Some(false), true) | (Some(true), false) => Value::Impossible,
        (_, false) => Value::Instance(*m),
    })
}

/// Narrow by `value.nil?`.
pub fn narrow_nil(value: &Value, polarity: bool) -> Value {
    value.retain(|m: &Instance| (m.class == crate::ClassId::NIL) == polarity)
}
