//! Getting Started Example
//!
//! Builds an engine with groups and middleware, then pushes a few requests
//! through the HTTP adapters and prints what would go on the wire.
//!
//! Run with: RUST_LOG=debug cargo run --example getting_started -p trellis

use trellis::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct User {
    id: String,
    name: String,
}

fn build() -> Result<Engine, RouteError> {
    let config = EngineConfig::from_json(r#"{ "strict_patterns": true }"#).unwrap_or_default();
    println!("config: {}", serde_json::to_string(&config).unwrap_or_default());

    let mut engine = Engine::with_config(config).unwrap_or_default();
    engine
        .use_middleware(middleware::logger())
        .use_middleware(middleware::recovery());

    engine.get("/", |c: &mut Context<'_>| {
        c.html(StatusCode::OK, "<h1>Hello trellis</h1>");
    })?;

    let mut v1 = engine.group("/v1");
    v1.use_middleware(|c: &mut Context<'_>| {
        if c.header("authorization").is_none() {
            c.fail(StatusCode::UNAUTHORIZED, "missing credentials");
            return;
        }
        c.next();
    });
    v1.get("/users/:id", |c: &mut Context<'_>| {
        let id = c.param("id").unwrap_or_default().to_owned();
        let user = User {
            name: format!("user-{id}"),
            id,
        };
        c.json(StatusCode::OK, &user);
    })?
    .post("/users", |c: &mut Context<'_>| {
        let name = c.post_form("name").unwrap_or_default().into_owned();
        c.string(StatusCode::CREATED, format!("created {name}"));
    })?;

    engine.get("/panic", |_: &mut Context<'_>| panic!("demo panic"))?;
    Ok(engine)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = match build() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("route registration failed: {err}");
            return;
        }
    };

    tracing::info!(routes = engine.routes().count(), "engine ready");
    println!("routes:");
    for (method, pattern) in engine.routes() {
        println!("  {method} {pattern}");
    }

    let requests = [
        HttpRequest::new("GET", "/"),
        HttpRequest::new("GET", "/v1/users/42"),
        HttpRequest::new("GET", "/v1/users/42").with_header("Authorization", "Bearer demo"),
        HttpRequest::new("POST", "/v1/users")
            .with_header("Authorization", "Bearer demo")
            .with_form("name=ada+lovelace"),
        HttpRequest::new("GET", "/panic"),
        HttpRequest::new("GET", "/missing"),
    ];

    let mut writer = ResponseWriter::new();
    for request in &requests {
        let response = serve(&engine, request);
        println!("\n> {} {}", request.method(), request.path());
        println!("{}", String::from_utf8_lossy(&writer.write(&response)));
    }
}
