//! Coral Runtime Library (`libcoral_rt`)
//!
//! Value model and core operations for compiled Coral programs: tagged
//! immediates, reference-counted heap values, operators, and closures.
//!
//! # Build Modes
//!
//! - **rlib**: For Rust consumers and tests
//! - **staticlib**: For linking into compiled programs (`libcoral_rt.a`)
//!
//! # Layers
//!
//! - **Owned** ([`Value`]): a sum type whose heap variants are `Rc`-backed.
//!   Clone is incref, drop is decref, and every fallible operation returns
//!   [`RtResult`].
//! - **Handles** ([`RawValue`]): one tagged machine word per value, used by
//!   the `coral_*` C ABI in [`ffi`]. Errors there are fatal.
//!
//! # Function Categories
//!
//! - **Values**: `coral_int_new`, `coral_bool_new`, `coral_kind`, etc.
//! - **Reference Counting**: `coral_incref`, `coral_decref`, `coral_rc_count`
//! - **Strings**: `coral_str_new`, `coral_str_new_copy`, `coral_str_data`, etc.
//! - **Tuples**: `coral_tuple_new`, `coral_tuple_first`, `coral_tuple_second`
//! - **Operators**: `coral_add` through `coral_not_equals`
//! - **Functions**: `coral_function_new`, `coral_function_set_global`,
//!   `coral_function_call`
//! - **Slot Arrays**: `coral_slots_new`, `coral_slots_push`, etc.
//! - **I/O**: `coral_repr`, `coral_print`, `coral_type_name`
//!
//! # Threading
//!
//! Counts are non-atomic. A value graph belongs to one thread.

#![warn(clippy::allow_attributes_without_reason)]
#![allow(
    unsafe_code,
    reason = "handle decoding and C-ABI entry points work on raw pointers"
)]
#![allow(
    clippy::not_unsafe_ptr_arg_deref,
    reason = "FFI entry points receive pointers from generated code which guarantees validity"
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "the tagged handle encoding reinterprets words between i64, usize and pointers"
)]

pub mod config;
pub mod error;
pub mod fatal;
pub mod ffi;
pub mod function;
pub mod operators;
pub mod raw;
pub mod repr;
pub mod slots;
pub mod stack;
pub mod value;

pub use config::RuntimeConfig;
pub use error::{RtResult, RuntimeError};
pub use fatal::{
    did_fail, enter_capture_mode, init_tracing, leave_capture_mode, report_fatal,
    reset_fatal_state, take_fatal_message,
};
pub use function::{EntryPoint, FunctionData, NativeFn};
pub use operators::{evaluate_binary, BinaryOp};
pub use raw::RawValue;
pub use slots::SlotArray;
pub use value::{Kind, StrData, TupleData, Value};
