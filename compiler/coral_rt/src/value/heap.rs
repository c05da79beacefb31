//! Shared, reference-counted heap allocations.
//!
//! Heap layout for every heap value:
//!
//! ```text
//!   +────────────────+──────────────+─────────────+──────────────────+
//!   | strong (Rc)    | weak (Rc)    | kind: u8    | payload ...      |
//!   +────────────────+──────────────+─────────────+──────────────────+
//!                                   ^
//!                                   raw handle (Rc::into_raw)
//! ```
//!
//! The raw handle points at the kind byte, so the handle encoding in
//! [`crate::raw`] can recover the kind of any heap value from the pointer
//! alone and then rebuild the correctly typed `Heap<T>`. The strong count is
//! the refcount; `Clone` increments it and `Drop` decrements it, running the
//! payload's destructor when it reaches zero.
//!
//! Counts are plain non-atomic `Rc` counters: a value graph must only ever be
//! touched by one thread.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::Kind;

/// A payload type that lives behind a [`Heap`] pointer.
pub trait HeapPayload {
    /// Kind byte written into the header of every allocation of this type.
    const KIND: Kind;
}

/// Header plus payload. `repr(C)` keeps `kind` at offset zero.
#[repr(C)]
pub(crate) struct HeapBox<T> {
    kind: u8,
    payload: T,
}

/// Reference-counted pointer to a heap payload.
///
/// The constructor is crate-private: heap values are created through the
/// factory methods on [`super::Value`].
pub struct Heap<T: HeapPayload>(Rc<HeapBox<T>>);

impl<T: HeapPayload> Heap<T> {
    pub(crate) fn new(payload: T) -> Self {
        Heap(Rc::new(HeapBox {
            kind: T::KIND as u8,
            payload,
        }))
    }

    /// Number of owners of this allocation.
    pub fn ref_count(this: &Self) -> usize {
        Rc::strong_count(&this.0)
    }

    /// Whether both pointers refer to the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Give up this owner's reference as a raw header pointer.
    pub(crate) fn into_raw(this: Self) -> *const u8 {
        Rc::into_raw(this.0).cast::<u8>()
    }

    /// Borrow the raw header pointer without touching the count.
    pub(crate) fn as_raw(this: &Self) -> *const u8 {
        Rc::as_ptr(&this.0).cast::<u8>()
    }

    /// Reclaim an owner's reference from a raw header pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Heap::into_raw`] or [`Heap::as_raw`] on a
    /// `Heap<T>` of the same `T`, and the caller must own one reference.
    pub(crate) unsafe fn from_raw(ptr: *const u8) -> Self {
        Heap(Rc::from_raw(ptr.cast::<HeapBox<T>>()))
    }

    /// # Safety
    ///
    /// Same pointer requirements as [`Heap::from_raw`]; the allocation must
    /// be alive.
    pub(crate) unsafe fn increment_raw(ptr: *const u8) {
        Rc::increment_strong_count(ptr.cast::<HeapBox<T>>());
    }

    /// Drop one reference, destroying the payload if it was the last.
    ///
    /// # Safety
    ///
    /// Same as [`Heap::from_raw`]: the caller gives up one owned reference.
    pub(crate) unsafe fn decrement_raw(ptr: *const u8) {
        Rc::decrement_strong_count(ptr.cast::<HeapBox<T>>());
    }

    /// Read the count of a live allocation through its raw pointer.
    ///
    /// # Safety
    ///
    /// Same pointer requirements as [`Heap::increment_raw`].
    pub(crate) unsafe fn count_raw(ptr: *const u8) -> usize {
        let heap = std::mem::ManuallyDrop::new(Self::from_raw(ptr));
        Self::ref_count(&heap)
    }
}

impl<T: HeapPayload> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Heap(Rc::clone(&self.0))
    }
}

impl<T: HeapPayload> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0.payload
    }
}

impl<T: HeapPayload + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Read the kind byte of a heap allocation.
///
/// # Safety
///
/// `ptr` must be a live header pointer produced by [`Heap::into_raw`] or
/// [`Heap::as_raw`] for any payload type.
pub(crate) unsafe fn header_kind(ptr: *const u8) -> u8 {
    ptr.read()
}

// Handle encoding keeps its tag in the low two bits of the pointer.
const _: () = assert!(std::mem::align_of::<HeapBox<super::StrData>>() >= 4);
const _: () = assert!(std::mem::align_of::<HeapBox<super::TupleData>>() >= 4);
const _: () = assert!(std::mem::align_of::<HeapBox<crate::function::FunctionData>>() >= 4);

#[cfg(test)]
mod tests;
