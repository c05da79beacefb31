use pretty_assertions::assert_eq;

use super::*;
use crate::error::RuntimeError;

fn repr_text(value: &Value) -> String {
    let repr = value.repr().unwrap();
    String::from_utf8(repr.as_bytes().unwrap().to_vec()).unwrap()
}

#[test]
fn int_repr_is_decimal() {
    assert_eq!(repr_text(&Value::int(0)), "0");
    assert_eq!(repr_text(&Value::int(1234)), "1234");
    assert_eq!(repr_text(&Value::int(-56)), "-56");
    assert_eq!(repr_text(&Value::int(i64::MIN)), "-9223372036854775808");
}

#[test]
fn bool_repr() {
    assert_eq!(repr_text(&Value::bool(true)), "true");
    assert_eq!(repr_text(&Value::bool(false)), "false");
}

#[test]
fn string_repr_is_quoted_verbatim() {
    assert_eq!(repr_text(&Value::string_static("hi")), "\"hi\"");
    assert_eq!(repr_text(&Value::string_static("a\"b")), "\"a\"b\"");
    assert_eq!(repr_text(&Value::string_static("")), "\"\"");
}

#[test]
fn tuple_repr_recurses() {
    let pair = Value::tuple(Value::int(1), Value::int(2));
    assert_eq!(repr_text(&pair), "(1, 2)");

    let nested = Value::tuple(
        Value::string_static("x"),
        Value::tuple(Value::bool(false), Value::int(-3)),
    );
    assert_eq!(repr_text(&nested), "(\"x\", (false, -3))");
}

#[test]
fn function_repr_is_placeholder() {
    let f = Value::native_function(0, 0, noop);
    assert_eq!(repr_text(&f), "<#closure>");
}

extern "C" fn noop(
    _globals: *const Option<crate::raw::RawValue>,
    _args: *const Option<crate::raw::RawValue>,
) -> Option<crate::raw::RawValue> {
    None
}

#[test]
fn repr_is_a_fresh_string() {
    let s = Value::string_static("same");
    let repr = s.repr().unwrap();
    assert_eq!(repr.ref_count(), Some(1));
    assert_eq!(s.ref_count(), Some(1));
}

// ── Depth guard ─────────────────────────────────────────────────────────

fn nested(depth: usize) -> Value {
    let mut v = Value::int(0);
    for _ in 0..depth {
        v = Value::tuple(v, Value::int(0));
    }
    v
}

#[test]
fn nesting_within_limit_succeeds() {
    let v = nested(3);
    let repr = v.repr_with_limit(3).unwrap();
    assert_eq!(repr.as_bytes().unwrap(), b"(((0, 0), 0), 0)");
}

#[test]
fn nesting_past_limit_fails() {
    let v = nested(4);
    assert_eq!(
        v.repr_with_limit(3),
        Err(RuntimeError::DepthExceeded { limit: 3 })
    );
}

#[test]
fn deep_nesting_grows_the_stack() {
    let v = nested(50_000);
    let repr = v.repr_with_limit(50_000).unwrap();
    let bytes = repr.as_bytes().unwrap();
    assert_eq!(bytes.len(), 5 * 50_000 + 1);
    assert!(bytes.starts_with(&[b'('; 50_000]));
    assert!(bytes[50_000..].starts_with(b"0, 0)"));
    assert!(bytes.ends_with(b", 0)"));
}

// ── Output ──────────────────────────────────────────────────────────────

#[test]
fn print_writes_repr_and_newline() {
    let mut out = Vec::new();
    Value::tuple(Value::string_static("a"), Value::int(1))
        .print_to(&mut out)
        .unwrap();
    assert_eq!(out, b"(\"a\", 1)\n");
}

#[test]
fn display_matches_repr() {
    let v = Value::tuple(Value::int(7), Value::string_static("s"));
    assert_eq!(v.to_string(), "(7, \"s\")");
}

#[test]
fn lossy_repr_truncates_past_limit() {
    assert_eq!(lossy_repr(&nested(4), 3), "(((...");
    assert_eq!(lossy_repr(&nested(2), 3), "((0, 0), 0)");
}

#[test]
fn display_past_configured_depth_does_not_fail() {
    let limit = RuntimeConfig::global().max_depth;
    let text = nested(limit + 1).to_string();
    assert!(text.ends_with("..."));
    assert_eq!(text.len(), limit + 3);
}
