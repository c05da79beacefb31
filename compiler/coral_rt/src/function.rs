//! Closures and the call protocol.
//!
//! A function value couples a declared arity, an entry point, and a
//! [`SlotArray`] of captured globals filled slot by slot after construction.
//!
//! # Call protocol
//!
//! [`Value::call`] consumes the callee and its arguments:
//!
//! 1. the callee must be a function, else `NotCallable`;
//! 2. the argument count must equal the arity exactly, else `ArityMismatch`;
//! 3. the arguments are packed into a slot array sized to their count;
//! 4. the entry point runs with the globals borrowed and the arguments owned;
//! 5. an entry point that produces no value is `NullResult`;
//! 6. the caller's reference to the callee is released.
//!
//! The entry point owns the argument slots: dropping them (or, for a
//! [`NativeFn`], calling `coral_decref` on each handle) is its job.

use std::cell::RefCell;
use std::fmt;

use crate::error::{RtResult, RuntimeError};
use crate::raw::RawValue;
use crate::slots::SlotArray;
use crate::value::{HeapPayload, Kind, Value};

/// Native entry point as emitted by the code generator.
///
/// Receives the closure's globals and the call's arguments as arrays of
/// nullable handles (null when the respective capacity is 0). Globals are
/// borrowed, arguments are owned by the callee. Returns an owned handle;
/// returning null is a fatal error.
pub type NativeFn =
    extern "C" fn(globals: *const Option<RawValue>, args: *const Option<RawValue>) -> Option<RawValue>;

/// The body of a closure.
pub trait EntryPoint {
    /// Run the body. `args` holds exactly `arity` values and is owned by the
    /// body. `Ok(None)` means the body produced no value.
    fn invoke(&self, globals: &SlotArray<Value>, args: SlotArray<Value>)
        -> RtResult<Option<Value>>;
}

impl<F> EntryPoint for F
where
    F: Fn(&SlotArray<Value>, SlotArray<Value>) -> RtResult<Option<Value>>,
{
    fn invoke(
        &self,
        globals: &SlotArray<Value>,
        args: SlotArray<Value>,
    ) -> RtResult<Option<Value>> {
        self(globals, args)
    }
}

/// Adapter running a [`NativeFn`] behind the owned API.
pub(crate) struct NativeEntry {
    entry: NativeFn,
}

impl NativeEntry {
    pub(crate) fn new(entry: NativeFn) -> Self {
        NativeEntry { entry }
    }
}

impl EntryPoint for NativeEntry {
    fn invoke(
        &self,
        globals: &SlotArray<Value>,
        args: SlotArray<Value>,
    ) -> RtResult<Option<Value>> {
        // Borrowed handles: the closure keeps its globals.
        let mut view = SlotArray::new(globals.capacity());
        for (index, slot) in globals.as_slice().iter().enumerate() {
            if let Some(value) = slot {
                view.set(index, value.as_raw())?;
            }
        }
        // Owned handles: the references move to the callee.
        let args: SlotArray<RawValue> = args.into_populated().map(Value::into_raw).collect();

        let result = (self.entry)(view.as_ptr(), args.as_ptr());
        args.destroy();
        view.destroy();

        // SAFETY: the entry point returns an owned handle to a live value
        result.map(|raw| unsafe { raw.into_value() }).transpose()
    }
}

/// Function payload.
pub struct FunctionData {
    arity: u16,
    entry: Box<dyn EntryPoint>,
    globals: RefCell<SlotArray<Value>>,
}

impl FunctionData {
    pub(crate) fn new(globals_capacity: usize, arity: u16, entry: Box<dyn EntryPoint>) -> Self {
        FunctionData {
            arity,
            entry,
            globals: RefCell::new(SlotArray::new(globals_capacity)),
        }
    }

    /// Number of arguments a call must supply.
    pub fn arity(&self) -> u16 {
        self.arity
    }

    pub fn globals_capacity(&self) -> RtResult<usize> {
        self.globals
            .try_borrow()
            .map(|globals| globals.capacity())
            .map_err(|_| RuntimeError::GlobalsBusy)
    }

    /// Clone out global slot `index`.
    pub fn global(&self, index: usize) -> RtResult<Option<Value>> {
        let globals = self
            .globals
            .try_borrow()
            .map_err(|_| RuntimeError::GlobalsBusy)?;
        Ok(globals.get(index)?.cloned())
    }
}

impl HeapPayload for FunctionData {
    const KIND: Kind = Kind::Function;
}

impl Drop for FunctionData {
    fn drop(&mut self) {
        tracing::trace!(arity = self.arity, "destroying function");
    }
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Value {
    /// Store `value` in global slot `index` of a function, releasing any
    /// previous occupant.
    pub fn set_global(&self, index: usize, value: Value) -> RtResult<()> {
        let func = self.as_function()?;
        let previous = func
            .globals
            .try_borrow_mut()
            .map_err(|_| RuntimeError::GlobalsBusy)?
            .set(index, value)?;
        drop(previous);
        Ok(())
    }

    /// Call a function value. See the module docs for the protocol.
    #[tracing::instrument(level = "trace", skip_all, fields(argc = args.len()))]
    pub fn call(self, args: Vec<Value>) -> RtResult<Value> {
        let Value::Function(func) = &self else {
            return Err(RuntimeError::NotCallable {
                type_name: self.type_name(),
            });
        };
        if args.len() != usize::from(func.arity) {
            return Err(RuntimeError::ArityMismatch {
                expected: func.arity,
                found: args.len(),
            });
        }

        let args: SlotArray<Value> = args.into_iter().collect();
        let result = {
            let globals = func
                .globals
                .try_borrow()
                .map_err(|_| RuntimeError::GlobalsBusy)?;
            func.entry.invoke(&globals, args)?
        };
        let result = result.ok_or(RuntimeError::NullResult)?;

        tracing::trace!(result = result.type_name(), "call returned");
        // The call consumed the caller's reference to the callee.
        drop(self);
        Ok(result)
    }
}
