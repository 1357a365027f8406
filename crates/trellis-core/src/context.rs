//! Per-request context and the cursor-driven handler pipeline.
//!
//! A [`Context`] owns the ordered handler chain for one request and a
//! cursor into it. Nothing advances on its own: a handler runs the rest of
//! the chain by calling [`Context::next`], and returning without doing so
//! ends the chain there.
//!
//! ```ignore
//! engine.use_middleware(|c: &mut Context<'_>| {
//!     let start = std::time::Instant::now();
//!     c.next(); // everything after this middleware runs here
//!     tracing::info!(elapsed = ?start.elapsed(), "done");
//! });
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use trellis_router::Params;

use crate::request::RequestHandle;
use crate::response::{ResponseHandle, StatusCode};

/// A shared, type-erased handler or middleware.
pub type BoxHandler = Arc<dyn Fn(&mut Context<'_>) + Send + Sync>;

#[derive(Serialize)]
struct FailureBody<'m> {
    message: &'m str,
}

/// Request-scoped state: request data, captured parameters, the handler
/// chain with its cursor, and the response commit state.
///
/// Created by [`Engine::dispatch`](crate::Engine::dispatch) and dropped once
/// the chain returns. It is never shared between requests.
pub struct Context<'a> {
    method: &'a str,
    path: &'a str,
    params: Params,
    handlers: Vec<BoxHandler>,
    cursor: usize,
    status: StatusCode,
    committed: bool,
    request: &'a dyn RequestHandle,
    response: &'a mut dyn ResponseHandle,
}

impl<'a> Context<'a> {
    /// Creates a context over an assembled chain.
    ///
    /// The dispatcher does this for every request; constructing one by hand
    /// is mainly useful for exercising middleware in isolation.
    #[must_use]
    pub fn new(
        method: &'a str,
        path: &'a str,
        params: Params,
        handlers: Vec<BoxHandler>,
        request: &'a dyn RequestHandle,
        response: &'a mut dyn ResponseHandle,
    ) -> Self {
        Self {
            method,
            path,
            params,
            handlers,
            cursor: 0,
            status: StatusCode::OK,
            committed: false,
            request,
            response,
        }
    }

    /// Run the next handler in the chain, if there is one.
    ///
    /// Returns once that handler (and whatever it chose to run after
    /// itself) has returned. At the end of the chain this does nothing and
    /// the cursor stays at `chain_len()`.
    pub fn next(&mut self) {
        let Some(handler) = self.handlers.get(self.cursor).cloned() else {
            return;
        };
        self.cursor += 1;
        handler(self);
    }

    /// Skip every handler that has not started yet.
    pub fn abort(&mut self) {
        self.cursor = self.handlers.len();
    }

    /// Abort the chain and respond with `{"message": ...}`.
    ///
    /// Once the response is committed only the abort takes effect; the
    /// body already sent is left as it is.
    pub fn fail(&mut self, status: StatusCode, message: &str) {
        self.abort();
        if self.committed {
            tracing::warn!(
                path = self.path,
                status = status.as_u16(),
                reason = message,
                "failure after commit; response left unchanged"
            );
            return;
        }
        self.json(status, &FailureBody { message });
    }

    /// Number of handlers started so far. Never decreases.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of handlers in the chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true once no further handler can start.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.handlers.len()
    }

    /// The request method, as received from the transport.
    #[must_use]
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// A captured path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All captured path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A query-string value.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<Cow<'a, str>> {
        self.request.query(key)
    }

    /// A form value.
    #[must_use]
    pub fn post_form(&self, key: &str) -> Option<Cow<'a, str>> {
        self.request.form_value(key)
    }

    /// A request header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.request.header(name)
    }

    /// The status staged or sent so far.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Whether the status line and headers have gone to the transport.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Stage the response status.
    ///
    /// Ignored once the response is committed.
    pub fn status(&mut self, status: StatusCode) {
        if self.committed {
            tracing::warn!(
                path = self.path,
                status = status.as_u16(),
                "status change after commit ignored"
            );
            return;
        }
        self.status = status;
    }

    /// Set a response header.
    ///
    /// Ignored once the response is committed.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.committed {
            tracing::warn!(path = self.path, header = name, "header change after commit ignored");
            return;
        }
        self.response.set_header(name, value);
    }

    /// Append raw bytes to the body, committing the response first if needed.
    pub fn write(&mut self, bytes: &[u8]) {
        self.commit();
        self.response.write_body(bytes);
    }

    /// Respond with a `text/plain` body.
    pub fn string(&mut self, status: StatusCode, body: impl AsRef<str>) {
        self.set_header("content-type", "text/plain");
        self.status(status);
        self.write(body.as_ref().as_bytes());
    }

    /// Respond with a JSON body.
    ///
    /// If `value` fails to serialize, a 500 with the error text is sent instead.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header("content-type", "application/json");
                self.status(status);
                self.write(&body);
            }
            Err(err) => {
                tracing::error!(path = self.path, error = %err, "JSON response serialization failed");
                if self.committed {
                    return;
                }
                self.string(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
            }
        }
    }

    /// Respond with raw bytes.
    pub fn data(&mut self, status: StatusCode, bytes: &[u8]) {
        self.status(status);
        self.write(bytes);
    }

    /// Respond with a `text/html` body.
    pub fn html(&mut self, status: StatusCode, html: impl AsRef<str>) {
        self.set_header("content-type", "text/html");
        self.status(status);
        self.write(html.as_ref().as_bytes());
    }

    fn commit(&mut self) {
        if !self.committed {
            self.response.set_status(self.status);
            self.committed = true;
        }
    }

    /// Send the staged status if no handler wrote a body.
    pub(crate) fn finish(&mut self) {
        self.commit();
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("cursor", &self.cursor)
            .field("chain_len", &self.handlers.len())
            .field("status", &self.status)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestRequest, TestResponse};
    use parking_lot::Mutex;

    fn chain(handlers: Vec<BoxHandler>, response: &mut TestResponse) -> usize {
        let request = TestRequest::new();
        let mut ctx = Context::new("GET", "/", Params::new(), handlers, &request, response);
        ctx.next();
        ctx.finish();
        ctx.cursor()
    }

    #[test]
    fn next_runs_handlers_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers: Vec<BoxHandler> = (0..3)
            .map(|i| {
                let log = Arc::clone(&log);
                Arc::new(move |c: &mut Context<'_>| {
                    log.lock().push(i);
                    c.next();
                }) as BoxHandler
            })
            .collect();

        let mut response = TestResponse::new();
        assert_eq!(chain(handlers, &mut response), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn missing_next_short_circuits() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = {
            let log = Arc::clone(&log);
            Arc::new(move |_: &mut Context<'_>| log.lock().push("first")) as BoxHandler
        };
        let second = {
            let log = Arc::clone(&log);
            Arc::new(move |_: &mut Context<'_>| log.lock().push("second")) as BoxHandler
        };

        let mut response = TestResponse::new();
        assert_eq!(chain(vec![first, second], &mut response), 1);
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[test]
    fn wrap_around_runs_post_logic_after_rest_of_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = {
            let log = Arc::clone(&log);
            Arc::new(move |c: &mut Context<'_>| {
                log.lock().push("before");
                c.next();
                log.lock().push("after");
            }) as BoxHandler
        };
        let inner = {
            let log = Arc::clone(&log);
            Arc::new(move |_: &mut Context<'_>| log.lock().push("handler")) as BoxHandler
        };

        let mut response = TestResponse::new();
        chain(vec![outer, inner], &mut response);
        assert_eq!(*log.lock(), vec!["before", "handler", "after"]);
    }

    #[test]
    fn repeated_next_past_end_is_a_no_op() {
        let handler = Arc::new(|c: &mut Context<'_>| {
            c.next();
            c.next();
            c.string(StatusCode::OK, "done");
        }) as BoxHandler;

        let mut response = TestResponse::new();
        assert_eq!(chain(vec![handler], &mut response), 1);
        assert_eq!(response.text(), "done");
    }

    #[test]
    fn cursor_stops_at_chain_len() {
        let handler = Arc::new(|c: &mut Context<'_>| {
            for _ in 0..3 {
                c.next();
            }
            assert!(c.is_exhausted());
        }) as BoxHandler;
        let tail = Arc::new(|c: &mut Context<'_>| {
            c.next();
            c.next();
        }) as BoxHandler;

        let mut response = TestResponse::new();
        assert_eq!(chain(vec![handler, tail], &mut response), 2);
    }

    #[test]
    fn abort_stops_later_handlers() {
        let ran = Arc::new(Mutex::new(false));
        let aborting = Arc::new(|c: &mut Context<'_>| {
            c.abort();
            c.next();
        }) as BoxHandler;
        let never = {
            let ran = Arc::clone(&ran);
            Arc::new(move |_: &mut Context<'_>| *ran.lock() = true) as BoxHandler
        };

        let mut response = TestResponse::new();
        assert_eq!(chain(vec![aborting, never], &mut response), 2);
        assert!(!*ran.lock());
    }

    #[test]
    fn fail_sends_json_message() {
        let handler = Arc::new(|c: &mut Context<'_>| {
            c.fail(StatusCode::UNAUTHORIZED, "no token");
        }) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.text(), r#"{"message":"no token"}"#);
    }

    #[test]
    fn fail_after_commit_leaves_body_alone() {
        let tail_ran = Arc::new(Mutex::new(false));
        let rejecting = Arc::new(|c: &mut Context<'_>| {
            c.next();
            c.fail(StatusCode::UNAUTHORIZED, "late");
            assert!(c.is_exhausted());
        }) as BoxHandler;
        let handler = Arc::new(|c: &mut Context<'_>| {
            c.string(StatusCode::OK, "body");
            c.next();
        }) as BoxHandler;
        let tail = {
            let tail_ran = Arc::clone(&tail_ran);
            Arc::new(move |_: &mut Context<'_>| *tail_ran.lock() = true) as BoxHandler
        };

        let mut response = TestResponse::new();
        chain(vec![rejecting, handler, tail], &mut response);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "body");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert!(*tail_ran.lock());
    }

    #[test]
    fn json_failure_after_commit_leaves_body_alone() {
        use std::collections::HashMap;

        let handler = Arc::new(|c: &mut Context<'_>| {
            c.string(StatusCode::OK, "body");
            let mut bad = HashMap::new();
            bad.insert((1, 2), "x");
            c.json(StatusCode::OK, &bad);
        }) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "body");
    }

    #[test]
    fn html_sets_content_type_and_body() {
        let handler = Arc::new(|c: &mut Context<'_>| {
            c.html(StatusCode::OK, "<h1>hi</h1>");
        }) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.text(), "<h1>hi</h1>");
    }

    #[test]
    fn mutations_after_commit_are_ignored() {
        let handler = Arc::new(|c: &mut Context<'_>| {
            c.set_header("x-before", "1");
            c.string(StatusCode::CREATED, "first");
            c.status(StatusCode::INTERNAL_SERVER_ERROR);
            c.set_header("x-after", "1");
            c.write(b" second");
            assert_eq!(c.status_code(), StatusCode::CREATED);
            assert!(c.is_committed());
        }) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("x-before"), Some("1"));
        assert_eq!(response.header("x-after"), None);
        assert_eq!(response.text(), "first second");
        assert_eq!(response.status_calls(), 1);
    }

    #[test]
    fn staged_status_is_sent_without_body() {
        let handler = Arc::new(|c: &mut Context<'_>| c.status(StatusCode::NO_CONTENT)) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[test]
    fn json_serialization_failure_becomes_500() {
        use std::collections::HashMap;

        // Non-string map keys cannot be represented in JSON.
        let handler = Arc::new(|c: &mut Context<'_>| {
            let mut bad = HashMap::new();
            bad.insert((1, 2), "x");
            c.json(StatusCode::OK, &bad);
        }) as BoxHandler;

        let mut response = TestResponse::new();
        chain(vec![handler], &mut response);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn accessors_expose_request_data() {
        let request = TestRequest::new()
            .with_query("page", "2")
            .with_form("name", "ada")
            .with_header("X-Token", "abc");
        let params: Params = [("id", "7")].into_iter().collect();
        let mut response = TestResponse::new();
        let ctx = Context::new("POST", "/users/7", params, Vec::new(), &request, &mut response);

        assert_eq!(ctx.method(), "POST");
        assert_eq!(ctx.path(), "/users/7");
        assert_eq!(ctx.param("id"), Some("7"));
        assert_eq!(ctx.query("page").as_deref(), Some("2"));
        assert_eq!(ctx.post_form("name").as_deref(), Some("ada"));
        assert_eq!(ctx.header("x-token"), Some("abc"));
        assert!(ctx.is_exhausted());
    }
}
