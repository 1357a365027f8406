//! The engine: route registration, prefix groups and request dispatch.
//!
//! # Lifecycle
//!
//! ```text
//! registration (&mut Engine)          serving (&Engine, shared)
//!   group() / use_middleware()   →      dispatch(method, path, req, resp)
//!   get() / post() / add_route()          ├─ middleware of every group whose
//!                                         │  prefix starts the path, in
//!                                         │  group creation order
//!                                         ├─ terminal handler or 404
//!                                         └─ Context::next() drives the chain
//! ```
//!
//! Registration needs a mutable borrow and dispatch a shared one, so an
//! `Arc<Engine>` handed to transport threads cannot be modified while it
//! serves.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use trellis_router::{Method, Params, RouteRegistry};

use crate::config::EngineConfig;
use crate::context::{BoxHandler, Context};
use crate::error::{ConfigError, RouteError};
use crate::request::RequestHandle;
use crate::response::{ResponseHandle, StatusCode};
use crate::static_files;

/// Identifies a group inside the [`Engine`] that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

impl GroupId {
    /// The engine's own group, with the empty prefix.
    pub const ROOT: Self = Self(0);

    /// Position in the engine's group list (creation order).
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

struct GroupEntry {
    prefix: String,
    parent: Option<GroupId>,
    middleware: Vec<BoxHandler>,
}

fn not_found(c: &mut Context<'_>) {
    let body = format!("404 NOT FOUND: {}\n", c.path());
    c.string(StatusCode::NOT_FOUND, body);
}

fn chain_overflow(c: &mut Context<'_>) {
    c.string(
        StatusCode::INTERNAL_SERVER_ERROR,
        "500 INTERNAL SERVER ERROR: handler chain too long\n",
    );
}

macro_rules! route_shorthands {
    ($($name:ident => $method:expr, $doc:literal;)*) => {$(
        #[doc = $doc]
        pub fn $name<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
        where
            F: Fn(&mut Context<'_>) + Send + Sync + 'static,
        {
            self.add_route($method, pattern, handler)
        }
    )*};
}

/// Router, group tree and dispatcher in one value.
///
/// The engine is also the root group: middleware and routes registered on
/// it directly use the empty prefix.
pub struct Engine {
    config: EngineConfig,
    router: RouteRegistry<BoxHandler>,
    groups: Vec<GroupEntry>,
    not_found: BoxHandler,
}

impl Engine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(EngineConfig::default())
    }

    /// Create an engine with a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            router: RouteRegistry::with_policy(config.pattern_policy()),
            config,
            groups: vec![GroupEntry {
                prefix: String::new(),
                parent: None,
                middleware: Vec::new(),
            }],
            not_found: Arc::new(not_found),
        }
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a group whose prefix is `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let id = self.create_group(GroupId::ROOT, prefix);
        RouterGroup { engine: self, id }
    }

    /// Reopen a group created earlier.
    pub fn group_mut(&mut self, id: GroupId) -> Option<RouterGroup<'_>> {
        (id.0 < self.groups.len()).then(|| RouterGroup { engine: self, id })
    }

    /// Append middleware that runs for every request.
    pub fn use_middleware<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.push_middleware(GroupId::ROOT, Arc::new(handler));
        self
    }

    /// Register `handler` for `method` and `pattern`.
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.register(GroupId::ROOT, method, pattern, Arc::new(handler))?;
        Ok(self)
    }

    route_shorthands! {
        get => Method::Get, "Register a GET route.";
        post => Method::Post, "Register a POST route.";
        put => Method::Put, "Register a PUT route.";
        delete => Method::Delete, "Register a DELETE route.";
        patch => Method::Patch, "Register a PATCH route.";
        head => Method::Head, "Register a HEAD route.";
        options => Method::Options, "Register an OPTIONS route.";
    }

    /// Serve files below `root` at `{relative}/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> Result<&mut Self, RouteError> {
        self.register_static(GroupId::ROOT, relative, root.into())?;
        Ok(self)
    }

    /// Registered routes as `(method, pattern)`, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.router
            .routes()
            .map(|key| (key.method, key.pattern.as_str()))
    }

    /// Number of groups, the root included.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The absolute prefix of a group.
    #[must_use]
    pub fn group_prefix(&self, id: GroupId) -> Option<&str> {
        self.groups.get(id.0).map(|g| g.prefix.as_str())
    }

    /// The group a group was created from. `None` for the root.
    #[must_use]
    pub fn group_parent(&self, id: GroupId) -> Option<GroupId> {
        self.groups.get(id.0).and_then(|g| g.parent)
    }

    /// Assemble the handler chain and parameters for a request.
    ///
    /// Middleware comes first: every group whose prefix is a string prefix
    /// of `path` contributes its list, groups taken in creation order. The
    /// matched route's handler (or the built-in 404 handler) comes last.
    #[must_use]
    pub fn handler_chain(&self, method: &str, path: &str) -> (Vec<BoxHandler>, Params) {
        let mut chain: Vec<BoxHandler> = self
            .groups
            .iter()
            .filter(|group| path.starts_with(group.prefix.as_str()))
            .flat_map(|group| group.middleware.iter().cloned())
            .collect();

        let (terminal, params) = self.resolve(method, path).unwrap_or_else(|| {
            tracing::debug!(method, path, "no route matched");
            (Arc::clone(&self.not_found), Params::new())
        });
        chain.push(terminal);
        (chain, params)
    }

    /// Handle one request.
    ///
    /// Runs the assembled chain to completion or until a handler stops
    /// calling [`Context::next`], then sends the staged status if nothing
    /// was written. Panics raised by handlers are not caught here.
    pub fn dispatch(
        &self,
        method: &str,
        path: &str,
        request: &dyn RequestHandle,
        response: &mut dyn ResponseHandle,
    ) {
        let span = tracing::debug_span!("dispatch", method, path);
        let _entered = span.enter();

        let (mut chain, mut params) = self.handler_chain(method, path);
        if chain.len() > self.config.max_chain_len {
            tracing::error!(
                len = chain.len(),
                max = self.config.max_chain_len,
                "handler chain exceeds configured maximum"
            );
            chain = vec![Arc::new(chain_overflow) as BoxHandler];
            params = Params::new();
        }

        let mut ctx = Context::new(method, path, params, chain, request, response);
        ctx.next();
        ctx.finish();
    }

    fn resolve(&self, method: &str, path: &str) -> Option<(BoxHandler, Params)> {
        let method: Method = method.parse().ok()?;
        let matched = self.router.get_route(method, path)?;
        let handler = self.router.handler(method, matched.pattern())?;
        Some((Arc::clone(handler), matched.params))
    }

    fn create_group(&mut self, parent: GroupId, suffix: &str) -> GroupId {
        let prefix = format!("{}{}", self.groups[parent.0].prefix, suffix);
        let id = GroupId(self.groups.len());
        tracing::debug!(prefix = %prefix, parent = parent.0, "group created");
        self.groups.push(GroupEntry {
            prefix,
            parent: Some(parent),
            middleware: Vec::new(),
        });
        id
    }

    fn push_middleware(&mut self, group: GroupId, handler: BoxHandler) {
        self.groups[group.0].middleware.push(handler);
    }

    fn register(&mut self, group: GroupId, method: Method, comp: &str, handler: BoxHandler) -> Result<(), RouteError> {
        let pattern = format!("{}{}", self.groups[group.0].prefix, comp);
        self.router.add_route(method, &pattern, handler)?;
        if self.config.log_routes {
            tracing::info!(%method, pattern = %pattern, "route registered");
        }
        Ok(())
    }

    fn register_static(&mut self, group: GroupId, relative: &str, root: PathBuf) -> Result<(), RouteError> {
        let pattern = format!("{}/*filepath", relative.trim_end_matches('/'));
        let handler = static_files::handler(root);
        self.register(group, Method::Get, &pattern, Arc::new(handler))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.groups.iter().map(|g| g.prefix.as_str()).collect();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("groups", &prefixes)
            .finish_non_exhaustive()
    }
}

/// A prefix-scoped view of the engine used during registration.
///
/// Routes registered here get the group's prefix prepended. Middleware
/// added here runs for every request whose path starts with that prefix,
/// whether or not the matched route was registered through this group.
pub struct RouterGroup<'e> {
    engine: &'e mut Engine,
    id: GroupId,
}

impl RouterGroup<'_> {
    /// This group's identifier, for [`Engine::group_mut`].
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// The absolute prefix (all ancestor prefixes concatenated).
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.engine.groups[self.id.0].prefix
    }

    /// The group this one was created from.
    #[must_use]
    pub fn parent(&self) -> Option<GroupId> {
        self.engine.groups[self.id.0].parent
    }

    /// Create a nested group; its prefix is this prefix followed by `suffix`.
    pub fn group(&mut self, suffix: &str) -> RouterGroup<'_> {
        let id = self.engine.create_group(self.id, suffix);
        RouterGroup {
            engine: &mut *self.engine,
            id,
        }
    }

    /// Append middleware to this group. Order of calls is kept.
    pub fn use_middleware<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.engine.push_middleware(self.id, Arc::new(handler));
        self
    }

    /// Register `handler` for `method` at this prefix plus `pattern`.
    pub fn add_route<F>(&mut self, method: Method, pattern: &str, handler: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.engine
            .register(self.id, method, pattern, Arc::new(handler))?;
        Ok(self)
    }

    route_shorthands! {
        get => Method::Get, "Register a GET route under this group.";
        post => Method::Post, "Register a POST route under this group.";
        put => Method::Put, "Register a PUT route under this group.";
        delete => Method::Delete, "Register a DELETE route under this group.";
        patch => Method::Patch, "Register a PATCH route under this group.";
        head => Method::Head, "Register a HEAD route under this group.";
        options => Method::Options, "Register an OPTIONS route under this group.";
    }

    /// Serve files below `root` at `{prefix}{relative}/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> Result<&mut Self, RouteError> {
        self.engine.register_static(self.id, relative, root.into())?;
        Ok(self)
    }
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("id", &self.id)
            .field("prefix", &self.prefix())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Context<'_>) {}

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn group_prefixes_concatenate() {
        let mut engine = Engine::new();
        let mut api = engine.group("/api");
        let api_id = api.id();
        let v1 = api.group("/v1");
        assert_eq!(v1.prefix(), "/api/v1");
        assert_eq!(v1.parent(), Some(api_id));
        let v1_id = v1.id();

        assert_eq!(engine.group_count(), 3);
        assert_eq!(engine.group_prefix(GroupId::ROOT), Some(""));
        assert_eq!(engine.group_prefix(v1_id), Some("/api/v1"));
        assert_eq!(engine.group_parent(api_id), Some(GroupId::ROOT));
        assert_eq!(engine.group_parent(GroupId::ROOT), None);
        assert_eq!(v1_id.index(), 2);
    }

    #[test]
    fn group_mut_reopens_known_groups_only() {
        let mut engine = Engine::new();
        let id = engine.group("/admin").id();
        assert_eq!(engine.group_mut(id).map(|g| g.prefix().to_owned()), Some("/admin".to_owned()));
        assert!(engine.group_mut(GroupId(99)).is_none());
    }

    #[test]
    fn group_routes_carry_prefix() {
        let mut engine = Engine::new();
        engine.get("/", noop).unwrap();
        engine.group("/v1").get("/users/:id", noop).unwrap();
        let routes: Vec<_> = engine.routes().collect();
        assert_eq!(routes, vec![(Method::Get, "/"), (Method::Get, "/v1/users/:id")]);
    }

    #[test]
    fn chain_collects_all_prefix_matching_groups() {
        let mut engine = Engine::new();
        engine.use_middleware(noop);
        engine.group("/api").use_middleware(noop).use_middleware(noop);
        engine.group("/api/v1").use_middleware(noop);
        engine.group("/other").use_middleware(noop);
        engine.get("/api/v1/x", noop).unwrap();

        let (chain, _) = engine.handler_chain("GET", "/api/v1/x");
        assert_eq!(chain.len(), 5);
        let (chain, _) = engine.handler_chain("GET", "/api");
        assert_eq!(chain.len(), 4);
        let (chain, _) = engine.handler_chain("GET", "/elsewhere");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn static_route_pattern() {
        let mut engine = Engine::new();
        engine.static_files("/assets/", "/tmp").unwrap();
        engine.group("/v1").static_files("/files", "/tmp").unwrap();
        let routes: Vec<_> = engine.routes().map(|(_, p)| p.to_owned()).collect();
        assert_eq!(routes, vec!["/assets/*filepath", "/v1/files/*filepath"]);
    }

    #[test]
    fn strict_config_rejects_bad_patterns() {
        let mut engine = Engine::with_config(EngineConfig::new().strict_patterns(true)).unwrap();
        assert!(engine.get("/a/*rest/b", noop).is_err());
        assert!(engine.group("/g").get("/:", noop).is_err());
        assert_eq!(engine.routes().count(), 0);
    }

    #[test]
    fn zero_chain_length_config_is_rejected() {
        let err = Engine::with_config(EngineConfig::new().max_chain_len(0)).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroChainLength));
    }
}
