//! Binary operators.
//!
//! Every operator borrows both operands and returns a new owned value.
//! Dispatch is a plain match over the operand kinds: the kind set is closed.
//!
//! Integer arithmetic wraps on overflow (two's complement); only a zero
//! divisor is an error. `and` and `or` see two already evaluated operands,
//! so any short-circuiting happens before the runtime is reached.

use crate::error::{RtResult, RuntimeError};
use crate::value::Value;

/// A binary operator of the language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Eq,
    NotEq,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 13] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Mod,
        BinaryOp::Lt,
        BinaryOp::LtEq,
        BinaryOp::Gt,
        BinaryOp::GtEq,
        BinaryOp::And,
        BinaryOp::Or,
        BinaryOp::Eq,
        BinaryOp::NotEq,
    ];

    /// Source spelling, used in diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
        }
    }
}

/// Evaluate `left op right`.
pub fn evaluate_binary(op: BinaryOp, left: &Value, right: &Value) -> RtResult<Value> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => sub(left, right),
        BinaryOp::Mul => mul(left, right),
        BinaryOp::Div => div(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Lt => less_than(left, right),
        BinaryOp::LtEq => less_or_equal(left, right),
        BinaryOp::Gt => greater_than(left, right),
        BinaryOp::GtEq => greater_or_equal(left, right),
        BinaryOp::And => and(left, right),
        BinaryOp::Or => or(left, right),
        BinaryOp::Eq => equals(left, right),
        BinaryOp::NotEq => not_equals(left, right),
    }
}

// Addition and concatenation

/// `+`: integer sum, or concatenation when a string is involved.
///
/// At least one operand must be an int or a string. A string partners with
/// a string or an int (rendered in decimal on its side); an int partners
/// with an int or a string.
pub fn add(left: &Value, right: &Value) -> RtResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        (Value::Str(a), Value::Str(b)) => Ok(concat(a.as_bytes(), b.as_bytes())),
        (Value::Str(a), Value::Int(b)) => Ok(concat(a.as_bytes(), b.to_string().as_bytes())),
        (Value::Int(a), Value::Str(b)) => Ok(concat(a.to_string().as_bytes(), b.as_bytes())),
        (Value::Str(_), other) | (other, Value::Str(_)) => {
            Err(RuntimeError::type_mismatch("int", other.type_name()))
        }
        (Value::Int(_), other) | (other, Value::Int(_)) => {
            Err(RuntimeError::type_mismatch("string", other.type_name()))
        }
        _ => Err(RuntimeError::InvalidOperands {
            op: BinaryOp::Add.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn concat(left: &[u8], right: &[u8]) -> Value {
    let mut bytes = Vec::with_capacity(left.len() + right.len());
    bytes.extend_from_slice(left);
    bytes.extend_from_slice(right);
    Value::string(bytes)
}

// Integer arithmetic

pub fn sub(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Int(a.wrapping_sub(b)))
}

pub fn mul(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Int(a.wrapping_mul(b)))
}

/// Truncating division. `i64::MIN / -1` wraps to `i64::MIN`.
pub fn div(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    if b == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Int(a.wrapping_div(b)))
}

/// Remainder of truncating division; takes the sign of the dividend.
pub fn modulo(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    if b == 0 {
        return Err(RuntimeError::ModuloByZero);
    }
    Ok(Value::Int(a.wrapping_rem(b)))
}

fn int_operands(left: &Value, right: &Value) -> RtResult<(i64, i64)> {
    Ok((left.as_int()?, right.as_int()?))
}

// Comparison

pub fn less_than(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Bool(a < b))
}

pub fn less_or_equal(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Bool(a <= b))
}

pub fn greater_than(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Bool(a > b))
}

pub fn greater_or_equal(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = int_operands(left, right)?;
    Ok(Value::Bool(a >= b))
}

// Logic

pub fn and(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = (left.as_bool()?, right.as_bool()?);
    Ok(Value::Bool(a && b))
}

pub fn or(left: &Value, right: &Value) -> RtResult<Value> {
    let (a, b) = (left.as_bool()?, right.as_bool()?);
    Ok(Value::Bool(a || b))
}

// Equality

/// `==` for two ints, two bools, or two strings. Strings are equal when
/// they hold the same bytes.
pub fn equals(left: &Value, right: &Value) -> RtResult<Value> {
    let equal = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a.len() == b.len() && a.as_bytes() == b.as_bytes(),
        _ => {
            return Err(RuntimeError::EqualityNotApplicable {
                left: left.type_name(),
                right: right.type_name(),
            })
        }
    };
    Ok(Value::Bool(equal))
}

/// `!=`: the negation of [`equals`], with the same operand rules.
pub fn not_equals(left: &Value, right: &Value) -> RtResult<Value> {
    let equal = equals(left, right)?.as_bool()?;
    Ok(Value::Bool(!equal))
}
