//! Runtime values.
//!
//! # Representation
//!
//! `Int` and `Bool` are immediates: stored inline, never allocated, never
//! reference counted. `Str`, `Tuple` and `Function` are heap values behind a
//! [`Heap`] pointer whose strong count is the value's refcount. Cloning a
//! `Value` is `incref`, dropping it is `decref`.
//!
//! Every constructor returns a value with a single owner. Moving a value into
//! a container (tuple, closure globals, call arguments) hands that ownership
//! to the container.
//!
//! ```text
//! let s = Value::string_static("hi");               // borrowed literal
//! let pair = Value::tuple(Value::int(1), s.clone()); // tuple co-owns `s`
//! ```
//!
//! # Cycles
//!
//! Reference counting alone reclaims memory. Tuples are immutable and cannot
//! form a cycle, but a closure whose globals reach the closure itself can.
//! Such a cycle is never reclaimed.

mod heap;
mod string;
mod tuple;

use std::fmt;

pub use heap::{Heap, HeapPayload};
pub use string::StrData;
pub use tuple::TupleData;

pub(crate) use heap::header_kind;

use crate::error::{RtResult, RuntimeError};
use crate::function::{EntryPoint, FunctionData, NativeEntry, NativeFn};

/// Kind of a value. The discriminants are the header codes seen at the ABI.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool = 1,
    Int = 2,
    Str = 3,
    Tuple = 4,
    Function = 5,
}

impl Kind {
    /// Decode a header kind byte.
    pub fn from_code(code: u8) -> Option<Kind> {
        match code {
            1 => Some(Kind::Bool),
            2 => Some(Kind::Int),
            3 => Some(Kind::Str),
            4 => Some(Kind::Tuple),
            5 => Some(Kind::Function),
            _ => None,
        }
    }

    /// Human label used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Str => "string",
            Kind::Tuple => "tuple",
            Kind::Function => "function",
        }
    }

    /// Whether values of this kind live inline rather than on the heap.
    pub fn is_immediate(self) -> bool {
        matches!(self, Kind::Int | Kind::Bool)
    }
}

/// Label for a kind code no [`Kind`] matches.
pub const UNKNOWN_TYPE_NAME: &str = "unknown";

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// Integer (immediate).
    Int(i64),
    /// Boolean (immediate).
    Bool(bool),
    /// Byte string.
    Str(Heap<StrData>),
    /// Pair of values.
    Tuple(Heap<TupleData>),
    /// Closure: native entry point plus captured globals.
    Function(Heap<FunctionData>),
}

// Factory Methods

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a string that owns its buffer.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Str(Heap::new(StrData::owned(bytes.into())))
    }

    /// Create a string over a static literal. The buffer is never freed.
    pub fn string_static(text: &'static str) -> Self {
        Self::string_literal(text.as_bytes())
    }

    /// Byte-slice form of [`Value::string_static`].
    pub fn string_literal(bytes: &'static [u8]) -> Self {
        Value::Str(Heap::new(StrData::borrowed(bytes)))
    }

    /// Create a string holding a copy of `bytes`.
    pub fn string_copy(bytes: &[u8]) -> Self {
        Self::string(bytes.to_vec())
    }

    /// Create a tuple. The tuple takes over both references.
    pub fn tuple(first: Value, second: Value) -> Self {
        Value::Tuple(Heap::new(TupleData { first, second }))
    }

    /// Create a closure with `globals_capacity` empty global slots.
    pub fn function(globals_capacity: usize, arity: u16, entry: impl EntryPoint + 'static) -> Self {
        Value::Function(Heap::new(FunctionData::new(
            globals_capacity,
            arity,
            Box::new(entry),
        )))
    }

    /// Create a closure whose entry point is a C-ABI function.
    pub fn native_function(globals_capacity: usize, arity: u16, entry: NativeFn) -> Self {
        Self::function(globals_capacity, arity, NativeEntry::new(entry))
    }
}

// Introspection and Accessors

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Bool(_) => Kind::Bool,
            Value::Str(_) => Kind::Str,
            Value::Tuple(_) => Kind::Tuple,
            Value::Function(_) => Kind::Function,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_immediate(&self) -> bool {
        self.kind().is_immediate()
    }

    /// Number of owners of a heap value; `None` for immediates.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::Int(_) | Value::Bool(_) => None,
            Value::Str(s) => Some(Heap::ref_count(s)),
            Value::Tuple(t) => Some(Heap::ref_count(t)),
            Value::Function(f) => Some(Heap::ref_count(f)),
        }
    }

    pub fn as_int(&self) -> RtResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(RuntimeError::type_mismatch("int", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> RtResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(RuntimeError::type_mismatch("bool", other.type_name())),
        }
    }

    pub fn as_string(&self) -> RtResult<&StrData> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(RuntimeError::type_mismatch("string", other.type_name())),
        }
    }

    /// Borrow the bytes of a string. Valid as long as `self` is alive.
    pub fn as_bytes(&self) -> RtResult<&[u8]> {
        self.as_string().map(StrData::as_bytes)
    }

    pub fn as_tuple(&self) -> RtResult<&TupleData> {
        match self {
            Value::Tuple(t) => Ok(t),
            other => Err(RuntimeError::type_mismatch("tuple", other.type_name())),
        }
    }

    /// Borrow the first element of a tuple.
    pub fn first(&self) -> RtResult<&Value> {
        self.as_tuple().map(TupleData::first)
    }

    /// Borrow the second element of a tuple.
    pub fn second(&self) -> RtResult<&Value> {
        self.as_tuple().map(TupleData::second)
    }

    pub fn as_function(&self) -> RtResult<&FunctionData> {
        match self {
            Value::Function(f) => Ok(f),
            other => Err(RuntimeError::type_mismatch("function", other.type_name())),
        }
    }
}

// Trait Implementations

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::Tuple(t) => write!(f, "Tuple({:?}, {:?})", t.first, t.second),
            Value::Function(func) => write!(f, "Function(arity {})", func.arity()),
        }
    }
}

/// Structural equality for tests and host code. Functions compare by
/// identity. This is not the language's `==`; see [`crate::operators::equals`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Tuple(a), Value::Tuple(b)) => **a == **b,
            (Value::Function(a), Value::Function(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for concise assertions")]
mod tests;
