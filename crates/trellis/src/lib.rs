//! Minimal web framework built around a segment-trie router.
//!
//! trellis maps `(method, path)` to an ordered handler chain and runs it
//! under an explicit cursor:
//!
//! - **Trie routing**: literal, `:name` and `*name` segments, first match
//!   in registration order
//! - **Prefix groups**: middleware attached to a prefix runs for every
//!   request whose path starts with it
//! - **Explicit `next()`**: handlers decide whether, and when, the rest of
//!   the chain runs
//!
//! # Quick Start
//!
//! ```
//! use trellis::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.use_middleware(middleware::recovery());
//!
//! let mut v1 = engine.group("/v1");
//! v1.use_middleware(|c: &mut Context<'_>| {
//!     c.set_header("x-api-version", "1");
//!     c.next();
//! });
//! v1.get("/hello/:name", |c: &mut Context<'_>| {
//!     let name = c.param("name").unwrap_or_default().to_owned();
//!     c.string(StatusCode::OK, format!("hello {name}"));
//! })
//! .unwrap();
//!
//! let response = TestClient::new(&engine).get("/v1/hello/ada").send();
//! assert_eq!(response.text(), "hello ada");
//! assert_eq!(response.header("x-api-version"), Some("1"));
//! ```
//!
//! # Crate Structure
//!
//! - [`trellis_router`]: segment trie and route registry
//! - [`trellis_core`]: engine, groups, context, middleware, testing
//! - [`trellis_http`]: owned request/response adapters and HTTP/1.1 writer

#![forbid(unsafe_code)]

// Re-export crates
pub use trellis_core as core;
pub use trellis_http as http;
pub use trellis_router as router;

// Re-export commonly used types
pub use trellis_core::{
    BoxHandler, ConfigError, Context, Engine, EngineConfig, GroupId, Headers, Method, Params,
    RequestHandle, ResponseHandle, RouteError, RouterGroup, StatusCode, middleware,
};
pub use trellis_http::{HttpRequest, HttpResponse, ResponseWriter, serve};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::testing::TestClient;
    pub use crate::{
        Context, Engine, EngineConfig, HttpRequest, HttpResponse, Method, ResponseWriter,
        RouteError, RouterGroup, StatusCode, middleware, serve,
    };
    pub use serde::{Deserialize, Serialize};
}

/// Testing utilities module.
pub mod testing {
    pub use trellis_core::testing::{RequestBuilder, TestClient, TestRequest, TestResponse};
}
