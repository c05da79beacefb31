//! Fixed-capacity slot arrays.
//!
//! A [`SlotArray`] holds up to `capacity` values in numbered slots. Slots
//! fill either in order ([`SlotArray::push`]) or by number
//! ([`SlotArray::set`]); the two are independent, so `set` never moves the
//! push cursor. Closures keep their captured globals in one, and calls pack
//! their arguments into one.
//!
//! Over owned [`crate::Value`]s the array owns its contents and dropping it
//! releases them. Over [`RawValue`] handles the array is the C-shaped
//! variant: the storage is a plain array of nullable words that generated
//! code indexes directly, and teardown is explicit. [`SlotArray::release`]
//! gives up every populated slot's reference, [`SlotArray::destroy`] frees
//! only the storage because the contents were already handed on.

use crate::error::{RtResult, RuntimeError};
use crate::raw::RawValue;

/// Fixed-capacity array of optionally populated slots.
#[derive(Debug)]
pub struct SlotArray<T> {
    slots: Box<[Option<T>]>,
    len: usize,
}

impl<T> SlotArray<T> {
    /// Create an array with `capacity` empty slots. Capacity 0 allocates
    /// nothing.
    pub fn new(capacity: usize) -> Self {
        SlotArray {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Push cursor: the number of values appended with [`SlotArray::push`].
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append at the push cursor.
    pub fn push(&mut self, value: T) -> RtResult<()> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(self.len)
            .ok_or(RuntimeError::CapacityExceeded { capacity })?;
        *slot = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Write slot `index`, returning its previous occupant.
    pub fn set(&mut self, index: usize, value: T) -> RtResult<Option<T>> {
        Ok(self.slot_mut(index)?.replace(value))
    }

    /// Read slot `index`. An empty slot reads as `None`.
    pub fn get(&self, index: usize) -> RtResult<Option<&T>> {
        let capacity = self.capacity();
        self.slots
            .get(index)
            .map(Option::as_ref)
            .ok_or(RuntimeError::IndexOutOfBounds { index, capacity })
    }

    /// Move the value out of slot `index`, leaving it empty.
    pub fn take(&mut self, index: usize) -> RtResult<Option<T>> {
        Ok(self.slot_mut(index)?.take())
    }

    /// All slots in order, populated or not.
    pub fn as_slice(&self) -> &[Option<T>] {
        &self.slots
    }

    /// Consume the array, yielding the populated slots in order.
    pub fn into_populated(self) -> impl Iterator<Item = T> {
        self.slots.into_vec().into_iter().flatten()
    }

    fn slot_mut(&mut self, index: usize) -> RtResult<&mut Option<T>> {
        let capacity = self.capacity();
        self.slots
            .get_mut(index)
            .ok_or(RuntimeError::IndexOutOfBounds { index, capacity })
    }
}

impl<T> FromIterator<T> for SlotArray<T> {
    /// Pack values into an array sized exactly to their count.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let slots: Box<[Option<T>]> = iter.into_iter().map(Some).collect();
        let len = slots.len();
        SlotArray { slots, len }
    }
}

impl SlotArray<RawValue> {
    /// Base of the slot storage as seen by generated code, or null when the
    /// capacity is 0.
    ///
    /// `Option<RawValue>` has the layout of a nullable pointer, so the
    /// storage reads as a C array of handles.
    pub fn as_ptr(&self) -> *const Option<RawValue> {
        if self.slots.is_empty() {
            std::ptr::null()
        } else {
            self.slots.as_ptr()
        }
    }

    /// Give up the reference held by every populated slot, then free the
    /// storage.
    ///
    /// A slot that cannot be released does not stop the others; the first
    /// such error is returned once every slot has been visited.
    ///
    /// # Safety
    ///
    /// Every populated slot must own one reference to a live value.
    pub unsafe fn release(self) -> RtResult<()> {
        let mut first_error = None;
        for raw in self.slots.iter().flatten() {
            if let Err(err) = raw.decref() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Free the storage without touching the contents.
    pub fn destroy(self) {
        drop(self);
    }
}
