//! Machine-word value handles for the C ABI.
//!
//! Generated code passes every value as one pointer-sized word. The low two
//! bits select the representation:
//!
//! ```text
//!   ...payload...  01   Int:  signed integer shifted left by 2
//!   ...payload...  10   Bool: 0 or 1 shifted left by 2
//!   ...address...  00   heap: pointer to the kind byte of a heap allocation
//!   ...........    11   invalid
//! ```
//!
//! Immediates therefore never touch memory, and a heap handle reveals its
//! kind through the header byte written by [`crate::value::Heap`]. The null
//! word is not a value; `Option<RawValue>` is the nullable handle seen by C.
//!
//! # Integer range
//!
//! The tag costs two bits, so an `Int` handle carries 62 bits. Encoding an
//! integer outside [`INT_MIN`]..=[`INT_MAX`] silently wraps into that range.

use std::fmt;
use std::mem::ManuallyDrop;
use std::num::NonZeroUsize;

use crate::error::{RtResult, RuntimeError};
use crate::function::FunctionData;
use crate::value::{header_kind, Heap, Kind, StrData, TupleData, Value};

pub const TAG_MASK: usize = 0b11;
pub const TAG_POINTER: usize = 0b00;
pub const TAG_INT: usize = 0b01;
pub const TAG_BOOL: usize = 0b10;
pub const TAG_SHIFT: u32 = 2;

/// Smallest integer representable in an `Int` handle.
pub const INT_MIN: i64 = -(1 << 61);
/// Largest integer representable in an `Int` handle.
pub const INT_MAX: i64 = (1 << 61) - 1;

/// Kind code reported for a word with the invalid tag.
const INVALID_TAG_CODE: u8 = 0;

const _: () = assert!(usize::BITS == 64, "handle encoding assumes 64-bit words");

/// A tagged value handle. Owned or borrowed as documented per operation.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawValue(NonZeroUsize);

impl RawValue {
    /// Encode an integer, wrapping it into the 62-bit range.
    pub fn from_int(n: i64) -> Self {
        // Bit 0 is the int tag, so the word is never zero.
        RawValue(NonZeroUsize::MIN | ((n as usize) << TAG_SHIFT))
    }

    pub fn from_bool(b: bool) -> Self {
        let bits = (usize::from(b) << TAG_SHIFT) | TAG_BOOL;
        // SAFETY: the bool tag sets bit 1
        RawValue(unsafe { NonZeroUsize::new_unchecked(bits) })
    }

    /// Rebuild a handle from a word received over the ABI.
    pub fn from_bits(bits: usize) -> Option<Self> {
        NonZeroUsize::new(bits).map(RawValue)
    }

    pub(crate) fn from_heap(ptr: *const u8) -> Self {
        debug_assert_eq!(ptr as usize & TAG_MASK, TAG_POINTER);
        // SAFETY: heap pointers come from `Rc` and are never null
        RawValue(unsafe { NonZeroUsize::new_unchecked(ptr as usize) })
    }

    /// The encoded machine word.
    pub fn bits(self) -> usize {
        self.0.get()
    }

    pub fn tag(self) -> usize {
        self.bits() & TAG_MASK
    }

    pub fn is_immediate(self) -> bool {
        matches!(self.tag(), TAG_INT | TAG_BOOL)
    }

    /// Decode an `Int` handle without touching memory.
    pub fn as_int(self) -> Option<i64> {
        // Arithmetic shift restores the sign.
        (self.tag() == TAG_INT).then(|| (self.bits() as i64) >> TAG_SHIFT)
    }

    /// Decode a `Bool` handle without touching memory.
    pub fn as_bool(self) -> Option<bool> {
        (self.tag() == TAG_BOOL).then(|| (self.bits() >> TAG_SHIFT) != 0)
    }

    fn heap_ptr(self) -> Option<*const u8> {
        (self.tag() == TAG_POINTER).then(|| self.bits() as *const u8)
    }

    /// Kind code of the handle: the tag for immediates, the header byte for
    /// heap values. Codes no [`Kind`] matches are possible for corrupt words.
    ///
    /// # Safety
    ///
    /// A heap handle must point at a live heap allocation.
    pub unsafe fn kind_code(self) -> u8 {
        match self.tag() {
            TAG_INT => Kind::Int as u8,
            TAG_BOOL => Kind::Bool as u8,
            TAG_POINTER => header_kind(self.bits() as *const u8),
            _ => INVALID_TAG_CODE,
        }
    }

    /// # Safety
    ///
    /// Same as [`RawValue::kind_code`].
    pub unsafe fn kind(self) -> RtResult<Kind> {
        let code = self.kind_code();
        match Kind::from_code(code) {
            // An immediate kind in a heap header is corruption.
            Some(kind) if kind.is_immediate() == self.is_immediate() => Ok(kind),
            _ => Err(RuntimeError::UnknownKind { code }),
        }
    }

    /// Take ownership of the reference this handle carries.
    ///
    /// # Safety
    ///
    /// A heap handle must point at a live heap allocation and the caller must
    /// own one reference to it, which moves into the returned value.
    pub unsafe fn into_value(self) -> RtResult<Value> {
        if let Some(n) = self.as_int() {
            return Ok(Value::Int(n));
        }
        if let Some(b) = self.as_bool() {
            return Ok(Value::Bool(b));
        }
        let Some(ptr) = self.heap_ptr() else {
            return Err(RuntimeError::UnknownKind {
                code: INVALID_TAG_CODE,
            });
        };
        match self.kind()? {
            Kind::Str => Ok(Value::Str(Heap::from_raw(ptr))),
            Kind::Tuple => Ok(Value::Tuple(Heap::from_raw(ptr))),
            Kind::Function => Ok(Value::Function(Heap::from_raw(ptr))),
            kind @ (Kind::Int | Kind::Bool) => Err(RuntimeError::UnknownKind { code: kind as u8 }),
        }
    }

    /// Run `f` on the value behind a borrowed handle. The count is unchanged.
    ///
    /// # Safety
    ///
    /// A heap handle must point at a live heap allocation for the duration
    /// of the call.
    pub unsafe fn with_value<R>(self, f: impl FnOnce(&Value) -> R) -> RtResult<R> {
        let value = ManuallyDrop::new(self.into_value()?);
        Ok(f(&value))
    }

    /// Make an owned value from a borrowed handle, adding one reference.
    ///
    /// # Safety
    ///
    /// Same as [`RawValue::with_value`].
    pub unsafe fn to_value(self) -> RtResult<Value> {
        self.with_value(Value::clone)
    }

    /// Add one reference. No-op for immediates.
    ///
    /// # Safety
    ///
    /// Same as [`RawValue::kind_code`].
    pub unsafe fn incref(self) -> RtResult<()> {
        let Some(ptr) = self.heap_ptr() else {
            return Ok(());
        };
        match self.kind()? {
            Kind::Str => Heap::<StrData>::increment_raw(ptr),
            Kind::Tuple => Heap::<TupleData>::increment_raw(ptr),
            Kind::Function => Heap::<FunctionData>::increment_raw(ptr),
            Kind::Int | Kind::Bool => {}
        }
        Ok(())
    }

    /// Give up one reference, destroying the value when it was the last.
    /// No-op for immediates.
    ///
    /// # Safety
    ///
    /// A heap handle must point at a live heap allocation and the caller must
    /// own the reference being released.
    pub unsafe fn decref(self) -> RtResult<()> {
        let Some(ptr) = self.heap_ptr() else {
            return Ok(());
        };
        match self.kind()? {
            Kind::Str => Heap::<StrData>::decrement_raw(ptr),
            Kind::Tuple => Heap::<TupleData>::decrement_raw(ptr),
            Kind::Function => Heap::<FunctionData>::decrement_raw(ptr),
            Kind::Int | Kind::Bool => {}
        }
        Ok(())
    }

    /// Current count of a heap value; `None` for immediates.
    ///
    /// # Safety
    ///
    /// Same as [`RawValue::kind_code`].
    pub unsafe fn ref_count(self) -> RtResult<Option<usize>> {
        let Some(ptr) = self.heap_ptr() else {
            return Ok(None);
        };
        let count = match self.kind()? {
            Kind::Str => Heap::<StrData>::count_raw(ptr),
            Kind::Tuple => Heap::<TupleData>::count_raw(ptr),
            Kind::Function => Heap::<FunctionData>::count_raw(ptr),
            Kind::Int | Kind::Bool => return Ok(None),
        };
        Ok(Some(count))
    }
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.as_int() {
            write!(f, "RawValue(int {n})")
        } else if let Some(b) = self.as_bool() {
            write!(f, "RawValue(bool {b})")
        } else {
            write!(f, "RawValue({:#x})", self.bits())
        }
    }
}

impl Value {
    /// Hand this value's reference to a raw handle.
    pub fn into_raw(self) -> RawValue {
        match self {
            Value::Int(n) => RawValue::from_int(n),
            Value::Bool(b) => RawValue::from_bool(b),
            Value::Str(s) => RawValue::from_heap(Heap::into_raw(s)),
            Value::Tuple(t) => RawValue::from_heap(Heap::into_raw(t)),
            Value::Function(f) => RawValue::from_heap(Heap::into_raw(f)),
        }
    }

    /// Borrow this value as a raw handle. The handle is valid while `self` is.
    pub fn as_raw(&self) -> RawValue {
        match self {
            Value::Int(n) => RawValue::from_int(*n),
            Value::Bool(b) => RawValue::from_bool(*b),
            Value::Str(s) => RawValue::from_heap(Heap::as_raw(s)),
            Value::Tuple(t) => RawValue::from_heap(Heap::as_raw(t)),
            Value::Function(f) => RawValue::from_heap(Heap::as_raw(f)),
        }
    }
}
