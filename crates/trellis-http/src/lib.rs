//! Owned HTTP/1.1 adapters for the trellis engine.
//!
//! This crate supplies the transport side of
//! [`Engine::dispatch`](trellis_core::Engine::dispatch):
//!
//! - [`HttpRequest`]: method, target, headers and body, with query and
//!   urlencoded form access
//! - [`HttpResponse`]: a buffered response that fixes its head on first commit
//! - [`ResponseWriter`]: HTTP/1.1 serialization with `content-length`
//! - [`QueryString`] / [`percent_decode`]: the urlencoded grammar
//!
//! Connection handling is left to the host.
//!
//! # Example
//!
//! ```
//! use trellis_core::{Context, Engine, StatusCode};
//! use trellis_http::{HttpRequest, ResponseWriter, serve};
//!
//! let mut engine = Engine::new();
//! engine
//!     .get("/ping", |c: &mut Context<'_>| c.string(StatusCode::OK, "pong"))
//!     .unwrap();
//!
//! let response = serve(&engine, &HttpRequest::new("GET", "/ping"));
//! let wire = ResponseWriter::new().write(&response);
//! assert!(wire.ends_with(b"\r\n\r\npong"));
//! ```

#![forbid(unsafe_code)]

mod query;
mod request;
mod response;

pub use query::{QueryString, percent_decode};
pub use request::HttpRequest;
pub use response::{HttpResponse, ResponseWriter};

use trellis_core::Engine;

/// Dispatch `request` through `engine` into a fresh [`HttpResponse`].
#[must_use]
pub fn serve(engine: &Engine, request: &HttpRequest) -> HttpResponse {
    let mut response = HttpResponse::new();
    engine.dispatch(request.method(), request.path(), request, &mut response);
    response
}
