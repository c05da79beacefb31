use pretty_assertions::assert_eq;

use super::*;
use crate::error::RuntimeError;

// ── Kinds ───────────────────────────────────────────────────────────────

#[test]
fn kind_codes_match_header_bytes() {
    assert_eq!(Kind::Bool as u8, 1);
    assert_eq!(Kind::Int as u8, 2);
    assert_eq!(Kind::Str as u8, 3);
    assert_eq!(Kind::Tuple as u8, 4);
    assert_eq!(Kind::Function as u8, 5);
}

#[test]
fn kind_from_code_round_trips() {
    for kind in [Kind::Bool, Kind::Int, Kind::Str, Kind::Tuple, Kind::Function] {
        assert_eq!(Kind::from_code(kind as u8), Some(kind));
    }
    assert_eq!(Kind::from_code(0), None);
    assert_eq!(Kind::from_code(6), None);
    assert_eq!(Kind::from_code(0xff), None);
}

#[test]
fn type_names() {
    assert_eq!(Value::int(0).type_name(), "int");
    assert_eq!(Value::bool(true).type_name(), "bool");
    assert_eq!(Value::string_static("").type_name(), "string");
    assert_eq!(
        Value::tuple(Value::int(1), Value::int(2)).type_name(),
        "tuple"
    );
}

// ── Immediates ──────────────────────────────────────────────────────────

#[test]
fn immediates_have_no_refcount() {
    let n = Value::int(42);
    let b = Value::bool(false);
    assert!(n.is_immediate());
    assert!(b.is_immediate());
    assert_eq!(n.ref_count(), None);
    assert_eq!(b.ref_count(), None);
    assert_eq!(n.as_int(), Ok(42));
    assert_eq!(b.as_bool(), Ok(false));
}

#[test]
fn accessor_on_wrong_kind_is_type_mismatch() {
    let err = Value::bool(true).as_int().unwrap_err();
    assert_eq!(
        err,
        RuntimeError::TypeMismatch {
            expected: "int",
            found: "bool",
        }
    );
    let err = Value::int(3).as_bytes().unwrap_err();
    assert_eq!(err.to_string(), "expected string, got int");
    assert!(Value::int(3).first().is_err());
}

// ── Strings ─────────────────────────────────────────────────────────────

#[test]
fn static_string_is_borrowed() {
    let s = Value::string_static("hello");
    assert_eq!(s.as_bytes(), Ok(&b"hello"[..]));
    assert!(!s.as_string().unwrap().is_owned());
    assert_eq!(s.ref_count(), Some(1));
}

#[test]
fn runtime_string_owns_its_buffer() {
    let s = Value::string(String::from("built"));
    let data = s.as_string().unwrap();
    assert!(data.is_owned());
    assert_eq!(data.len(), 5);
    assert!(!data.is_empty());
}

#[test]
fn string_copy_is_independent_of_source() {
    let mut source = b"abc".to_vec();
    let s = Value::string_copy(&source);
    source[0] = b'z';
    assert_eq!(s.as_bytes(), Ok(&b"abc"[..]));
}

#[test]
fn empty_string() {
    let s = Value::string_static("");
    assert!(s.as_string().unwrap().is_empty());
}

// ── Tuples and refcounts ────────────────────────────────────────────────

#[test]
fn tuple_co_owns_children() {
    let s = Value::string_static("shared");
    let pair = Value::tuple(Value::int(1), s.clone());
    assert_eq!(s.ref_count(), Some(2));
    assert_eq!(pair.first(), Ok(&Value::int(1)));
    assert_eq!(pair.second(), Ok(&s));
    drop(pair);
    assert_eq!(s.ref_count(), Some(1));
}

#[test]
fn tuple_may_hold_same_value_twice() {
    let s = Value::string_static("twice");
    let pair = Value::tuple(s.clone(), s.clone());
    assert_eq!(s.ref_count(), Some(3));
    drop(pair);
    assert_eq!(s.ref_count(), Some(1));
}

#[test]
fn clone_and_drop_track_count() {
    let t = Value::tuple(Value::bool(true), Value::bool(false));
    let c1 = t.clone();
    let c2 = t.clone();
    assert_eq!(t.ref_count(), Some(3));
    drop(c1);
    drop(c2);
    assert_eq!(t.ref_count(), Some(1));
}

#[test]
fn deeply_nested_tuple_drops_without_overflow() {
    let mut v = Value::int(0);
    for i in 0..200_000 {
        v = Value::tuple(Value::int(i), v);
    }
    drop(v);
}

// ── Equality ────────────────────────────────────────────────────────────

#[test]
fn structural_equality() {
    assert_eq!(Value::string_static("a"), Value::string(*b"a"));
    assert_ne!(Value::int(1), Value::bool(true));
    assert_eq!(
        Value::tuple(Value::int(1), Value::string_static("x")),
        Value::tuple(Value::int(1), Value::string_static("x")),
    );
}

#[test]
fn debug_output() {
    let v = Value::tuple(Value::int(1), Value::string_static("x"));
    assert_eq!(format!("{v:?}"), "Tuple(Int(1), Str(\"x\"))");
}
