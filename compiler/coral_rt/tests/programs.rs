//! End-to-end scenarios shaped like compiled programs.
//!
//! Native entry points below follow the code generator's conventions:
//! globals are borrowed, arguments are owned and released by the callee,
//! and the result is a fresh reference.

#![allow(clippy::unwrap_used, reason = "tests use unwrap for concise assertions")]

use pretty_assertions::assert_eq;

use coral_rt::ffi::{
    coral_add, coral_decref, coral_div, coral_function_call, coral_function_new,
    coral_function_set_global, coral_incref, coral_int_new, coral_int_value, coral_kind,
    coral_repr, coral_str_data, coral_str_len, coral_str_new, coral_tuple_first,
    coral_tuple_new, coral_tuple_second,
};
use coral_rt::{
    did_fail, enter_capture_mode, leave_capture_mode, reset_fatal_state, take_fatal_message,
    Kind, RawValue, RtResult, RuntimeError, SlotArray, Value,
};

// -- Helpers --

fn literal(text: &'static str) -> Option<RawValue> {
    coral_str_new(text.as_ptr(), text.len(), false)
}

fn text_of(value: Option<RawValue>) -> String {
    let data = coral_str_data(value);
    let len = coral_str_len(value);
    // SAFETY: `value` is a live string of `len` bytes
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn repr_text(value: Option<RawValue>) -> String {
    let repr = coral_repr(value);
    let text = text_of(repr);
    coral_decref(repr);
    text
}

fn call(function: Option<RawValue>, args: &[Option<RawValue>]) -> Option<RawValue> {
    coral_function_call(function, args.len(), args.as_ptr())
}

// -- Entry points --

/// `x => x + n` with `n` in global 0.
extern "C" fn add_captured(
    globals: *const Option<RawValue>,
    args: *const Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: one borrowed global, one owned argument
    unsafe {
        let x = *args;
        let sum = coral_add(x, *globals);
        coral_decref(x);
        sum
    }
}

/// `(f, x) => f(x)`. Both references move into the inner call.
extern "C" fn apply(
    _globals: *const Option<RawValue>,
    args: *const Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: two owned arguments
    let (f, x) = unsafe { (*args, *args.add(1)) };
    call(f, &[x])
}

/// Sum of a `(head, tail)` list terminated by any non-tuple.
extern "C" fn sum_list(
    _globals: *const Option<RawValue>,
    args: *const Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: one owned argument
    let list = unsafe { *args };
    let mut total = 0;
    let mut node = list;
    while coral_kind(node) == Kind::Tuple as u8 {
        total += coral_int_value(coral_tuple_first(node));
        node = coral_tuple_second(node);
    }
    coral_decref(list);
    Some(coral_int_new(total))
}

/// `x => x / 0`
extern "C" fn divide_by_zero(
    _globals: *const Option<RawValue>,
    args: *const Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: one owned argument
    let x = unsafe { *args };
    let quotient = coral_div(x, Some(coral_int_new(0)));
    coral_decref(x);
    quotient
}

fn make_adder(n: Option<RawValue>) -> Option<RawValue> {
    let adder = coral_function_new(1, 1, Some(add_captured));
    coral_function_set_global(adder, 0, n);
    adder
}

// -- Closures --

#[test]
fn closure_keeps_its_capture_across_calls() {
    let adder = make_adder(Some(coral_int_new(5)));

    coral_incref(adder);
    let first = call(adder, &[Some(coral_int_new(10))]);
    let second = call(adder, &[Some(coral_int_new(-5))]);

    assert_eq!(coral_int_value(first), 15);
    assert_eq!(coral_int_value(second), 0);
}

#[test]
fn captured_string_outlives_the_creator_reference() {
    let suffix = literal("!");
    let shout = make_adder(suffix);
    coral_decref(suffix);

    let result = call(shout, &[Some(coral_int_new(3))]);
    assert_eq!(text_of(result), "3!");
    coral_decref(result);
}

#[test]
fn higher_order_call() {
    let adder = make_adder(Some(coral_int_new(5)));
    let apply = coral_function_new(0, 2, Some(apply));

    let result = call(apply, &[adder, Some(coral_int_new(1))]);
    assert_eq!(coral_int_value(result), 6);
}

#[test]
fn failing_body_surfaces_as_null_result() {
    let divide = coral_function_new(0, 1, Some(divide_by_zero));

    reset_fatal_state();
    enter_capture_mode();
    let result = call(divide, &[Some(coral_int_new(1))]);
    leave_capture_mode();

    assert_eq!(result, None);
    assert!(did_fail());
    assert_eq!(
        take_fatal_message().as_deref(),
        Some("coral_function_call: function returned no value")
    );
}

// -- Data --

#[test]
fn list_of_tuples() {
    let tail = coral_tuple_new(Some(coral_int_new(3)), Some(RawValue::from_bool(false)));
    let middle = coral_tuple_new(Some(coral_int_new(2)), tail);
    let list = coral_tuple_new(Some(coral_int_new(1)), middle);
    coral_decref(tail);
    coral_decref(middle);

    assert_eq!(repr_text(list), "(1, (2, (3, false)))");

    let sum = coral_function_new(0, 1, Some(sum_list));
    let total = call(sum, &[list]);
    assert_eq!(coral_int_value(total), 6);
}

#[test]
fn string_building() {
    let hello = literal("Hello, ");
    let name = literal("Coral");
    let partial = coral_add(hello, name);
    let bang = literal("!");
    let greeting = coral_add(partial, bang);
    for handle in [hello, name, partial, bang] {
        coral_decref(handle);
    }

    assert_eq!(text_of(greeting), "Hello, Coral!");
    assert_eq!(repr_text(greeting), "\"Hello, Coral!\"");
    coral_decref(greeting);
}

// -- Owned layer --

fn factorial_body(globals: &SlotArray<Value>, args: SlotArray<Value>) -> RtResult<Option<Value>> {
    let missing = RuntimeError::NullValue {
        operation: "factorial",
    };
    let n = args.get(0)?.ok_or(missing.clone())?.as_int()?;
    if n <= 1 {
        return Ok(Some(Value::int(1)));
    }
    let this = globals.get(0)?.cloned().ok_or(missing)?;
    let rest = this.call(vec![Value::int(n - 1)])?;
    Ok(Some(Value::int(n * rest.as_int()?)))
}

#[test]
fn recursion_through_a_global() -> RtResult<()> {
    let factorial = Value::function(1, 1, factorial_body);
    // The self reference is a cycle and is never reclaimed.
    factorial.set_global(0, factorial.clone())?;

    assert_eq!(factorial.clone().call(vec![Value::int(10)])?, Value::int(3_628_800));
    assert_eq!(factorial.call(vec![Value::int(0)])?, Value::int(1));
    Ok(())
}

fn rebind_self(globals: &SlotArray<Value>, _args: SlotArray<Value>) -> RtResult<Option<Value>> {
    let this = globals.get(0)?.cloned().ok_or(RuntimeError::GlobalsBusy)?;
    this.set_global(0, Value::int(0))?;
    Ok(Some(Value::bool(true)))
}

#[test]
fn rebinding_globals_during_a_call_is_rejected() -> RtResult<()> {
    let function = Value::function(1, 0, rebind_self);
    function.set_global(0, function.clone())?;

    assert_eq!(function.call(Vec::new()), Err(RuntimeError::GlobalsBusy));
    Ok(())
}
