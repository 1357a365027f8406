//! Core dispatch pipeline for trellis.
//!
//! This crate provides:
//! - [`Engine`], the route registry plus prefix groups and the dispatcher
//! - [`RouterGroup`] handles for prefix-scoped registration and middleware
//! - [`Context`], the per-request state driving the handler chain
//! - [`RequestHandle`] / [`ResponseHandle`], the seam to a transport
//! - Built-in [`middleware`], [`EngineConfig`] and [`testing`] helpers
//!
//! # Design Principles
//!
//! - Dispatch is synchronous and takes `&Engine`; registration takes `&mut`
//! - Handlers are plain closures over `&mut Context<'_>`
//! - No transport is assumed; `trellis-http` supplies owned adapters
//!
//! # Example
//!
//! ```
//! use trellis_core::testing::TestClient;
//! use trellis_core::{Context, Engine, StatusCode};
//!
//! let mut engine = Engine::new();
//! engine
//!     .get("/hello/:name", |c: &mut Context<'_>| {
//!         let body = format!("hello {}", c.param("name").unwrap_or_default());
//!         c.string(StatusCode::OK, body);
//!     })
//!     .unwrap();
//!
//! let response = TestClient::new(&engine).get("/hello/ada").send();
//! assert_eq!(response.text(), "hello ada");
//! ```

#![forbid(unsafe_code)]

pub mod config;
mod context;
mod engine;
pub mod error;
pub mod middleware;
mod request;
mod response;
mod static_files;
pub mod testing;

pub use config::{DEFAULT_MAX_CHAIN_LEN, EngineConfig};
pub use context::{BoxHandler, Context};
pub use engine::{Engine, GroupId, RouterGroup};
pub use error::{ConfigError, RouteError};
pub use request::{Headers, RequestHandle};
pub use response::{ResponseHandle, StatusCode, mime_type_for_extension};

// Re-export router types handlers commonly touch
pub use trellis_router::{Method, Params};
