//! Human-readable value forms and `print`.
//!
//! | Kind       | Repr                          |
//! |------------|-------------------------------|
//! | `Int`      | decimal, `-` when negative    |
//! | `Bool`     | `true` / `false`              |
//! | `String`   | contents in double quotes, unescaped |
//! | `Tuple`    | `(first, second)`             |
//! | `Function` | `<#closure>`                  |
//!
//! Handles whose kind cannot be decoded repr as `unknown` at the ABI rather
//! than failing, since repr also feeds diagnostics.

use std::fmt;
use std::io::{self, Write};

use crate::config::RuntimeConfig;
use crate::error::RtResult;
use crate::stack::DepthGuard;
use crate::value::Value;

/// Repr of every function value.
pub const FUNCTION_REPR: &str = "<#closure>";

/// Repr of a handle with an unrecognized kind.
pub const UNKNOWN_REPR: &str = "unknown";

impl Value {
    /// Repr as a new string value, nesting bounded by the configured depth.
    pub fn repr(&self) -> RtResult<Value> {
        self.repr_with_limit(RuntimeConfig::global().max_depth)
    }

    /// Repr with an explicit tuple nesting limit.
    pub fn repr_with_limit(&self, max_depth: usize) -> RtResult<Value> {
        match self {
            Value::Bool(b) => Ok(Value::string_static(bool_repr(*b))),
            _ => {
                let mut out = Vec::new();
                write_repr(self, &mut out, &mut DepthGuard::new(max_depth))?;
                Ok(Value::string(out))
            }
        }
    }

    /// Write the repr and a newline to stdout.
    pub fn print(&self) -> RtResult<()> {
        self.print_to(&mut io::stdout().lock())
    }

    pub fn print_to(&self, out: &mut impl Write) -> RtResult<()> {
        write_line(out, &self.repr()?)
    }
}

/// Write a repr string followed by a newline.
pub(crate) fn write_line(out: &mut impl Write, repr: &Value) -> RtResult<()> {
    out.write_all(repr.as_bytes()?)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn bool_repr(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn write_repr(value: &Value, out: &mut Vec<u8>, guard: &mut DepthGuard) -> RtResult<()> {
    match value {
        Value::Int(n) => write!(out, "{n}")?,
        Value::Bool(b) => out.extend_from_slice(bool_repr(*b).as_bytes()),
        Value::Str(s) => {
            out.push(b'"');
            out.extend_from_slice(s.as_bytes());
            out.push(b'"');
        }
        Value::Tuple(t) => guard.descend(|guard| {
            out.push(b'(');
            write_repr(t.first(), out, guard)?;
            out.extend_from_slice(b", ");
            write_repr(t.second(), out, guard)?;
            out.push(b')');
            Ok(())
        })?,
        Value::Function(_) => out.extend_from_slice(FUNCTION_REPR.as_bytes()),
    }
    Ok(())
}

/// Marks where lossy repr text stopped at the depth limit.
const TRUNCATED: &[u8] = b"...";

/// Repr text for diagnostics. Never fails: nesting past `max_depth` is cut
/// off and marked with `...`.
fn lossy_repr(value: &Value, max_depth: usize) -> String {
    let mut out = Vec::new();
    if write_repr(value, &mut out, &mut DepthGuard::new(max_depth)).is_err() {
        out.extend_from_slice(TRUNCATED);
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Repr text, lossily decoded and truncated past the configured depth.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&lossy_repr(self, RuntimeConfig::global().max_depth))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for concise assertions")]
mod tests;
