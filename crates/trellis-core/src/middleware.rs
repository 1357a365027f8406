//! Built-in middleware.
//!
//! Both are ordinary handlers: install them with `use_middleware` on the
//! engine or a group, and they wrap whatever runs after them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::context::Context;
use crate::response::StatusCode;

/// Logs method, path, final status and elapsed time of every request.
pub fn logger() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        let start = Instant::now();
        c.next();
        tracing::info!(
            method = c.method(),
            path = c.path(),
            status = c.status_code().as_u16(),
            elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "request completed"
        );
    }
}

/// Turns a panic in the rest of the chain into a 500.
///
/// If the panicking handler had already written part of the body, the
/// response cannot be replaced; the chain is aborted instead.
pub fn recovery() -> impl Fn(&mut Context<'_>) + Send + Sync + 'static {
    |c: &mut Context<'_>| {
        let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| c.next())) else {
            return;
        };
        let message = panic_message(payload.as_ref());
        tracing::error!(method = c.method(), path = c.path(), panic = %message, "handler panicked");
        if c.is_committed() {
            c.abort();
        } else {
            c.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
