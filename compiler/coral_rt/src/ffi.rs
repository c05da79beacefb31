//! C ABI entry points called by generated code.
//!
//! Every value crosses the boundary as a [`RawValue`] handle;
//! `Option<RawValue>` is the nullable form and reads as a plain pointer
//! from C. Any error is handed to [`report_fatal`], which terminates the
//! process (or, in capture mode, makes the function return null / zero).
//!
//! # Ownership
//!
//! - Constructors and operators return an owned handle.
//! - Operands, accessors and introspection borrow their arguments.
//! - `coral_tuple_new` and `coral_function_set_global` add a reference for
//!   what they store, so the caller keeps its own.
//! - `coral_function_call` consumes the callee and every argument.
//! - Tuple and string accessors return borrowed results, valid while the
//!   owning value is alive.
//!
//! # Safety
//!
//! Handles and pointers are trusted: generated code only passes live
//! handles it owns or borrows per the rules above. The functions are not
//! `unsafe` because they are ABI entry points, not Rust API.

use std::ffi::{c_char, CStr};
use std::io;

use crate::error::{RtResult, RuntimeError};
use crate::fatal::check;
use crate::function::NativeFn;
use crate::operators::{evaluate_binary, BinaryOp};
use crate::raw::RawValue;
use crate::repr::{write_line, UNKNOWN_REPR};
use crate::slots::SlotArray;
use crate::value::{Kind, Value};

fn non_null(operation: &'static str, value: Option<RawValue>) -> RtResult<RawValue> {
    value.ok_or(RuntimeError::NullValue { operation })
}

/// Run `f` on the value behind a borrowed, non-null handle.
///
/// # Safety
///
/// `value` must be a live handle.
unsafe fn borrowed<R>(
    operation: &'static str,
    value: Option<RawValue>,
    f: impl FnOnce(&Value) -> RtResult<R>,
) -> RtResult<R> {
    non_null(operation, value)?.with_value(f)?
}

/// Take ownership of the value behind a non-null handle.
///
/// # Safety
///
/// `value` must be a live handle whose reference the caller gives up.
unsafe fn owned(operation: &'static str, value: Option<RawValue>) -> RtResult<Value> {
    non_null(operation, value)?.into_value()
}

// ── Immediates and kinds ─────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn coral_int_new(n: i64) -> RawValue {
    RawValue::from_int(n)
}

#[no_mangle]
pub extern "C" fn coral_int_value(value: Option<RawValue>) -> i64 {
    // SAFETY: generated code passes a live handle
    let result = unsafe { borrowed("coral_int_value", value, Value::as_int) };
    check("coral_int_value", result).unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn coral_bool_new(b: bool) -> RawValue {
    RawValue::from_bool(b)
}

#[no_mangle]
pub extern "C" fn coral_bool_value(value: Option<RawValue>) -> bool {
    // SAFETY: generated code passes a live handle
    let result = unsafe { borrowed("coral_bool_value", value, Value::as_bool) };
    check("coral_bool_value", result).unwrap_or_default()
}

/// Kind code of a value (see [`Kind`]). Unrecognized codes are returned as
/// read; the invalid tag reads as 0.
#[no_mangle]
pub extern "C" fn coral_kind(value: Option<RawValue>) -> u8 {
    let result = non_null("coral_kind", value).map(|raw| {
        // SAFETY: generated code passes a live handle
        unsafe { raw.kind_code() }
    });
    check("coral_kind", result).unwrap_or_default()
}

// ── Reference counting ───────────────────────────────────────────────────

#[no_mangle]
pub extern "C" fn coral_incref(value: Option<RawValue>) {
    let result = non_null("coral_incref", value).and_then(|raw| {
        // SAFETY: generated code passes a live handle
        unsafe { raw.incref() }
    });
    check("coral_incref", result);
}

#[no_mangle]
pub extern "C" fn coral_decref(value: Option<RawValue>) {
    let result = non_null("coral_decref", value).and_then(|raw| {
        // SAFETY: the caller gives up the reference it owns
        unsafe { raw.decref() }
    });
    check("coral_decref", result);
}

/// Current refcount of a heap value; 0 for immediates.
#[no_mangle]
pub extern "C" fn coral_rc_count(value: Option<RawValue>) -> usize {
    let result = non_null("coral_rc_count", value).and_then(|raw| {
        // SAFETY: generated code passes a live handle
        unsafe { raw.ref_count() }
    });
    check("coral_rc_count", result)
        .flatten()
        .unwrap_or_default()
}

// ── Introspection ────────────────────────────────────────────────────────

fn kind_name(kind: Option<Kind>) -> &'static CStr {
    match kind {
        Some(Kind::Bool) => c"bool",
        Some(Kind::Int) => c"int",
        Some(Kind::Str) => c"string",
        Some(Kind::Tuple) => c"tuple",
        Some(Kind::Function) => c"function",
        None => c"unknown",
    }
}

/// Static NUL-terminated type label; never freed.
#[no_mangle]
pub extern "C" fn coral_type_name(value: Option<RawValue>) -> *const c_char {
    let result = non_null("coral_type_name", value).map(|raw| {
        // SAFETY: generated code passes a live handle
        kind_name(unsafe { raw.kind() }.ok())
    });
    check("coral_type_name", result).map_or(std::ptr::null(), CStr::as_ptr)
}

/// Repr of a borrowed handle. Undecodable kinds repr as `unknown`.
///
/// # Safety
///
/// `raw` must be a live handle.
unsafe fn repr_raw(raw: RawValue) -> RtResult<Value> {
    if raw.kind().is_err() {
        return Ok(Value::string_static(UNKNOWN_REPR));
    }
    raw.with_value(Value::repr)?
}

/// New string holding the repr of a value.
#[no_mangle]
pub extern "C" fn coral_repr(value: Option<RawValue>) -> Option<RawValue> {
    let result = non_null("coral_repr", value).and_then(|raw| {
        // SAFETY: generated code passes a live handle
        unsafe { repr_raw(raw) }
    });
    check("coral_repr", result).map(Value::into_raw)
}

/// Write the repr of a value and a newline to stdout.
#[no_mangle]
pub extern "C" fn coral_print(value: Option<RawValue>) {
    let result = non_null("coral_print", value)
        .and_then(|raw| {
            // SAFETY: generated code passes a live handle
            unsafe { repr_raw(raw) }
        })
        .and_then(|repr| write_line(&mut io::stdout().lock(), &repr));
    check("coral_print", result);
}

// ── Strings ──────────────────────────────────────────────────────────────

/// Allocate a zeroed buffer of `len` bytes for an owned string.
///
/// Fill it, then pass it with the same `len` to `coral_str_new` with
/// `owned = true`, which takes the buffer over.
#[no_mangle]
pub extern "C" fn coral_str_alloc(len: usize) -> *mut u8 {
    Box::into_raw(vec![0u8; len].into_boxed_slice()).cast::<u8>()
}

/// Create a string over `len` bytes at `data`.
///
/// With `owned`, `data` must come from `coral_str_alloc(len)` and is freed
/// with the string. Without it, `data` must be static and is never freed.
#[no_mangle]
pub extern "C" fn coral_str_new(data: *const u8, len: usize, owned: bool) -> Option<RawValue> {
    let result = if data.is_null() {
        Err(RuntimeError::NullValue {
            operation: "coral_str_new",
        })
    } else if owned {
        // SAFETY: `data` came from `coral_str_alloc(len)`, which boxed a slice
        // of exactly `len` bytes; ownership moves back here
        let buffer =
            unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(data.cast_mut(), len)) };
        Ok(Value::string(buffer.into_vec()))
    } else {
        // SAFETY: borrowed strings point at static data of `len` bytes
        let bytes: &'static [u8] = unsafe { std::slice::from_raw_parts(data, len) };
        Ok(Value::string_literal(bytes))
    };
    check("coral_str_new", result).map(Value::into_raw)
}

/// Create a string holding a copy of `len` bytes at `data`.
#[no_mangle]
pub extern "C" fn coral_str_new_copy(data: *const u8, len: usize) -> Option<RawValue> {
    let result = if len == 0 {
        Ok(Value::string(Vec::new()))
    } else if data.is_null() {
        Err(RuntimeError::NullValue {
            operation: "coral_str_new_copy",
        })
    } else {
        // SAFETY: the caller passes `len` readable bytes
        Ok(Value::string_copy(unsafe {
            std::slice::from_raw_parts(data, len)
        }))
    };
    check("coral_str_new_copy", result).map(Value::into_raw)
}

/// Borrowed pointer to a string's bytes. Not NUL-terminated; see
/// `coral_str_len`.
#[no_mangle]
pub extern "C" fn coral_str_data(value: Option<RawValue>) -> *const u8 {
    // SAFETY: generated code passes a live handle; the bytes live as long
    // as the string does
    let result = unsafe { borrowed("coral_str_data", value, |v| v.as_bytes().map(<[u8]>::as_ptr)) };
    check("coral_str_data", result).unwrap_or(std::ptr::null())
}

#[no_mangle]
pub extern "C" fn coral_str_len(value: Option<RawValue>) -> usize {
    // SAFETY: generated code passes a live handle
    let result = unsafe { borrowed("coral_str_len", value, |v| v.as_bytes().map(<[u8]>::len)) };
    check("coral_str_len", result).unwrap_or_default()
}

// ── Tuples ───────────────────────────────────────────────────────────────

/// Owned copy of a borrowed, non-null handle.
///
/// # Safety
///
/// `value` must be a live handle.
unsafe fn cloned(operation: &'static str, value: Option<RawValue>) -> RtResult<Value> {
    non_null(operation, value)?.to_value()
}

/// New tuple; adds a reference to both elements.
#[no_mangle]
pub extern "C" fn coral_tuple_new(
    first: Option<RawValue>,
    second: Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: generated code passes live handles
    let result = unsafe {
        cloned("coral_tuple_new", first)
            .and_then(|first| Ok(Value::tuple(first, cloned("coral_tuple_new", second)?)))
    };
    check("coral_tuple_new", result).map(Value::into_raw)
}

/// Borrowed first element of a tuple.
#[no_mangle]
pub extern "C" fn coral_tuple_first(tuple: Option<RawValue>) -> Option<RawValue> {
    // SAFETY: generated code passes a live handle; the element lives as
    // long as the tuple does
    let result = unsafe { borrowed("coral_tuple_first", tuple, |v| v.first().map(Value::as_raw)) };
    check("coral_tuple_first", result)
}

/// Borrowed second element of a tuple.
#[no_mangle]
pub extern "C" fn coral_tuple_second(tuple: Option<RawValue>) -> Option<RawValue> {
    // SAFETY: as for `coral_tuple_first`
    let result = unsafe { borrowed("coral_tuple_second", tuple, |v| v.second().map(Value::as_raw)) };
    check("coral_tuple_second", result)
}

// ── Operators ────────────────────────────────────────────────────────────

fn binary(
    operation: &'static str,
    op: BinaryOp,
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    let result = non_null(operation, left).and_then(|left| {
        // SAFETY: generated code passes live handles
        unsafe {
            borrowed(operation, right, |right| {
                left.with_value(|left| evaluate_binary(op, left, right))?
            })
        }
    });
    check(operation, result).map(Value::into_raw)
}

#[no_mangle]
pub extern "C" fn coral_add(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_add", BinaryOp::Add, left, right)
}

#[no_mangle]
pub extern "C" fn coral_sub(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_sub", BinaryOp::Sub, left, right)
}

#[no_mangle]
pub extern "C" fn coral_mul(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_mul", BinaryOp::Mul, left, right)
}

#[no_mangle]
pub extern "C" fn coral_div(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_div", BinaryOp::Div, left, right)
}

#[no_mangle]
pub extern "C" fn coral_mod(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_mod", BinaryOp::Mod, left, right)
}

#[no_mangle]
pub extern "C" fn coral_less_than(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_less_than", BinaryOp::Lt, left, right)
}

#[no_mangle]
pub extern "C" fn coral_less_or_equal(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_less_or_equal", BinaryOp::LtEq, left, right)
}

#[no_mangle]
pub extern "C" fn coral_greater_than(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_greater_than", BinaryOp::Gt, left, right)
}

#[no_mangle]
pub extern "C" fn coral_greater_or_equal(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_greater_or_equal", BinaryOp::GtEq, left, right)
}

#[no_mangle]
pub extern "C" fn coral_and(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_and", BinaryOp::And, left, right)
}

#[no_mangle]
pub extern "C" fn coral_or(left: Option<RawValue>, right: Option<RawValue>) -> Option<RawValue> {
    binary("coral_or", BinaryOp::Or, left, right)
}

#[no_mangle]
pub extern "C" fn coral_equals(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_equals", BinaryOp::Eq, left, right)
}

#[no_mangle]
pub extern "C" fn coral_not_equals(
    left: Option<RawValue>,
    right: Option<RawValue>,
) -> Option<RawValue> {
    binary("coral_not_equals", BinaryOp::NotEq, left, right)
}

// ── Functions ────────────────────────────────────────────────────────────

/// New closure with `globals_capacity` empty global slots.
#[no_mangle]
pub extern "C" fn coral_function_new(
    globals_capacity: usize,
    arity: u16,
    entry: Option<NativeFn>,
) -> Option<RawValue> {
    let result = entry
        .map(|entry| Value::native_function(globals_capacity, arity, entry))
        .ok_or(RuntimeError::NullValue {
            operation: "coral_function_new",
        });
    check("coral_function_new", result).map(Value::into_raw)
}

/// Store `value` in global slot `index`; adds a reference to `value`.
#[no_mangle]
pub extern "C" fn coral_function_set_global(
    function: Option<RawValue>,
    index: usize,
    value: Option<RawValue>,
) {
    const OPERATION: &str = "coral_function_set_global";
    // SAFETY: generated code passes live handles
    let result = unsafe {
        cloned(OPERATION, value)
            .and_then(|value| borrowed(OPERATION, function, |f| f.set_global(index, value)))
    };
    check(OPERATION, result);
}

/// Call `function` with `argc` arguments read from `args`.
///
/// Consumes the reference to `function` and to every argument; the
/// arguments are handed to the entry point, which releases them.
#[no_mangle]
pub extern "C" fn coral_function_call(
    function: Option<RawValue>,
    argc: usize,
    args: *const Option<RawValue>,
) -> Option<RawValue> {
    // SAFETY: the caller gives up its references and passes `argc`
    // readable handles
    let result = unsafe { call_raw(function, argc, args) };
    check(CALL, result).map(Value::into_raw)
}

const CALL: &str = "coral_function_call";

/// # Safety
///
/// As for [`coral_function_call`]: `function` and the `argc` handles at
/// `args` are live and owned by the caller.
unsafe fn call_raw(
    function: Option<RawValue>,
    argc: usize,
    args: *const Option<RawValue>,
) -> RtResult<Value> {
    let callee = owned(CALL, function)?;
    let handles: &[Option<RawValue>] = match argc {
        0 => &[],
        _ if args.is_null() => return Err(RuntimeError::NullValue { operation: CALL }),
        _ => std::slice::from_raw_parts(args, argc),
    };
    let args = handles
        .iter()
        .map(|&handle| owned(CALL, handle))
        .collect::<RtResult<Vec<_>>>()?;
    callee.call(args)
}

// ── Slot arrays ──────────────────────────────────────────────────────────

/// Borrow a slot array through its opaque pointer.
///
/// # Safety
///
/// `slots` must be null or come from `coral_slots_new` and not yet be
/// released or destroyed.
unsafe fn slots_mut<'a>(
    operation: &'static str,
    slots: *mut SlotArray<RawValue>,
) -> RtResult<&'a mut SlotArray<RawValue>> {
    slots.as_mut().ok_or(RuntimeError::NullValue { operation })
}

/// Reclaim a slot array through its opaque pointer.
///
/// # Safety
///
/// As for [`slots_mut`]; the pointer is invalid afterwards.
unsafe fn slots_box(
    operation: &'static str,
    slots: *mut SlotArray<RawValue>,
) -> RtResult<Box<SlotArray<RawValue>>> {
    if slots.is_null() {
        Err(RuntimeError::NullValue { operation })
    } else {
        Ok(Box::from_raw(slots))
    }
}

/// New slot array with `capacity` empty slots.
#[no_mangle]
pub extern "C" fn coral_slots_new(capacity: usize) -> *mut SlotArray<RawValue> {
    Box::into_raw(Box::new(SlotArray::new(capacity)))
}

/// Append a handle. Stores it as is: no reference is added.
#[no_mangle]
pub extern "C" fn coral_slots_push(slots: *mut SlotArray<RawValue>, value: Option<RawValue>) {
    let result = non_null("coral_slots_push", value).and_then(|value| {
        // SAFETY: `slots` came from `coral_slots_new`
        unsafe { slots_mut("coral_slots_push", slots) }?.push(value)
    });
    check("coral_slots_push", result);
}

/// Write slot `index`. Stores the handle as is; the previous occupant is
/// overwritten without being released.
#[no_mangle]
pub extern "C" fn coral_slots_set(
    slots: *mut SlotArray<RawValue>,
    index: usize,
    value: Option<RawValue>,
) {
    let result = non_null("coral_slots_set", value).and_then(|value| {
        // SAFETY: `slots` came from `coral_slots_new`
        let slots = unsafe { slots_mut("coral_slots_set", slots) }?;
        slots.set(index, value).map(|_overwritten| ())
    });
    check("coral_slots_set", result);
}

/// Borrowed handle in slot `index`; null for an empty slot.
#[no_mangle]
pub extern "C" fn coral_slots_get(
    slots: *mut SlotArray<RawValue>,
    index: usize,
) -> Option<RawValue> {
    // SAFETY: `slots` came from `coral_slots_new`
    let result = unsafe { slots_mut("coral_slots_get", slots) }
        .and_then(|s| s.get(index).map(|slot| slot.copied()));
    check("coral_slots_get", result).flatten()
}

#[no_mangle]
pub extern "C" fn coral_slots_len(slots: *mut SlotArray<RawValue>) -> usize {
    // SAFETY: `slots` came from `coral_slots_new`
    let result = unsafe { slots_mut("coral_slots_len", slots) }.map(|s| s.len());
    check("coral_slots_len", result).unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn coral_slots_capacity(slots: *mut SlotArray<RawValue>) -> usize {
    // SAFETY: `slots` came from `coral_slots_new`
    let result = unsafe { slots_mut("coral_slots_capacity", slots) }.map(|s| s.capacity());
    check("coral_slots_capacity", result).unwrap_or_default()
}

/// Base of the slot storage, as passed to native entry points; null when
/// the capacity is 0.
#[no_mangle]
pub extern "C" fn coral_slots_data(slots: *mut SlotArray<RawValue>) -> *const Option<RawValue> {
    // SAFETY: `slots` came from `coral_slots_new`
    let result = unsafe { slots_mut("coral_slots_data", slots) }.map(|s| s.as_ptr());
    check("coral_slots_data", result).unwrap_or(std::ptr::null())
}

/// Release every populated slot, then free the array.
#[no_mangle]
pub extern "C" fn coral_slots_release(slots: *mut SlotArray<RawValue>) {
    // SAFETY: `slots` came from `coral_slots_new`; every populated slot owns
    // one reference
    let result = unsafe { slots_box("coral_slots_release", slots).and_then(|s| s.release()) };
    check("coral_slots_release", result);
}

/// Free the array without touching its contents.
#[no_mangle]
pub extern "C" fn coral_slots_destroy(slots: *mut SlotArray<RawValue>) {
    // SAFETY: `slots` came from `coral_slots_new`
    let result = unsafe { slots_box("coral_slots_destroy", slots) }.map(|s| s.destroy());
    check("coral_slots_destroy", result);
}
