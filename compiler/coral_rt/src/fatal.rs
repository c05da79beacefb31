//! Fatal error reporting.
//!
//! Runtime errors are never recovered from. At the C ABI every
//! [`RuntimeError`] ends up in [`report_fatal`], which prints
//! `FATAL: <operation>: <message>` to stderr and exits with status 1.
//!
//! Tests cannot survive `exit`, so a thread can switch to capture mode:
//! the report is recorded in thread-local state instead, and the failing
//! ABI function returns a null handle (or zero) to its caller.

use std::cell::{Cell, RefCell};
use std::panic;
use std::sync::Once;

use crate::error::{RtResult, RuntimeError};

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_VAR: &str = "CORAL_LOG";

static TRACING_INIT: Once = Once::new();

thread_local! {
    /// When set, fatal reports are recorded instead of exiting.
    static CAPTURE_MODE: Cell<bool> = const { Cell::new(false) };

    static FATAL_OCCURRED: Cell<bool> = const { Cell::new(false) };
    static FATAL_MESSAGE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Record fatal reports on this thread instead of terminating.
pub fn enter_capture_mode() {
    CAPTURE_MODE.with(|m| m.set(true));
}

/// Terminate on fatal reports again.
pub fn leave_capture_mode() {
    CAPTURE_MODE.with(|m| m.set(false));
}

fn is_capture_mode() -> bool {
    CAPTURE_MODE.with(Cell::get)
}

/// Whether a fatal error was reported on this thread since the last reset.
#[must_use]
pub fn did_fail() -> bool {
    FATAL_OCCURRED.with(Cell::get)
}

/// Take the last recorded fatal message, if any.
pub fn take_fatal_message() -> Option<String> {
    FATAL_MESSAGE.with(|m| m.borrow_mut().take())
}

/// Clear recorded fatal state (call before each test).
pub fn reset_fatal_state() {
    FATAL_OCCURRED.with(|p| p.set(false));
    FATAL_MESSAGE.with(|m| *m.borrow_mut() = None);
}

/// Report an unrecoverable error raised by `operation`.
///
/// Exits the process with status 1 unless capture mode is on.
pub fn report_fatal(operation: &str, err: &RuntimeError) {
    let message = format!("{operation}: {err}");
    tracing::error!(operation, error = %err, "fatal runtime error");

    FATAL_OCCURRED.with(|p| p.set(true));
    FATAL_MESSAGE.with(|m| *m.borrow_mut() = Some(message.clone()));

    if is_capture_mode() {
        return;
    }
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

/// Unwrap a result at the ABI boundary, reporting the error as fatal.
pub(crate) fn check<T>(operation: &'static str, result: RtResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            report_fatal(operation, &err);
            None
        }
    }
}

/// Initialize tracing for diagnostic output.
///
/// Call this once at startup. Safe to call multiple times. Enable with
/// `CORAL_LOG=coral_rt=trace` (or `RUST_LOG`). Logs go to stderr; stdout
/// belongs to the program.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_env(LOG_VAR).or_else(|_| EnvFilter::try_from_default_env());
        // Only initialize if a filter is configured
        if let Ok(filter) = filter {
            let installed = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .try_init();
            if installed.is_err() {
                tracing::debug!("tracing subscriber already installed");
            }
        }
    });
}

/// Run a compiled program's `main`.
///
/// The generated C `main` calls this instead of the program entry directly.
/// Returns 0 on success, 1 when the runtime itself panicked. Runtime errors
/// never get here: they exit from [`report_fatal`].
#[no_mangle]
pub extern "C" fn coral_run_main(main_fn: extern "C" fn()) -> i32 {
    init_tracing();
    let result = panic::catch_unwind(|| main_fn());
    match result {
        Ok(()) => 0,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unexpected error");
            eprintln!("FATAL: runtime panic: {detail}");
            1
        }
    }
}
