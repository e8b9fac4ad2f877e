//! Sample application exercising cardio and measuring its overhead.
//!
//! Three REST routes whose handlers wait for a pre-defined range of time
//! before echoing a query param. In a real service the delay would be actual
//! work: network calls, database lookups. Each handler is wrapped with
//! [`cardio::wrap`]; `/a` and `/b` report through [`LogReporter`], `/c`
//! through a closure that JSON-encodes the record.

use std::convert::Infallible;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::routing::{MethodRouter, get};
use cardio::{Invocation, LogReporter, Reporter, report_fn, wrap};
use facet::Facet;
use figue as args;
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Facet, Debug)]
struct DemoCli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    /// Address to serve on.
    #[facet(args::named, default)]
    http: Option<String>,
}

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, Deserialize)]
struct EchoQuery {
    input: Option<String>,
}

#[derive(Serialize)]
struct EchoResponse {
    response: String,
    delay: u64,
}

fn main() {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async {
            if let Err(err) = run_server().await {
                eprintln!("{err}");
                std::process::exit(1);
            }
        });
}

async fn run_server() -> Result<(), String> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let http_addr = cli.http.unwrap_or_else(|| DEFAULT_HTTP_ADDR.into());

    let app = Router::new()
        .route("/a", echo_route("handler-a", 450..=500, LogReporter))
        .route("/b", echo_route("handler-b", 3500..=4000, LogReporter))
        .route(
            "/c",
            echo_route("handler-c", 1750..=2000, report_fn(log_invocation_json)),
        );

    let listener = TcpListener::bind(&http_addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {http_addr}: {e}"))?;
    info!(%http_addr, "sample cardio application ready");
    info!("try hitting http://{http_addr}/a?input=hello");
    info!("or http://{http_addr}/c?input=test");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("HTTP server error: {e}"))?;
    Ok(())
}

/// Builds a GET route whose handler sleeps for a random delay in `delay_ms`
/// and echoes `?input=`, wrapped with cardio instrumentation under `name`.
fn echo_route<R>(name: &'static str, delay_ms: RangeInclusive<u64>, reporter: R) -> MethodRouter
where
    R: Reporter<(EchoQuery,)> + Send + Sync + 'static,
{
    let wrapped = Arc::new(wrap(
        name,
        move |query: EchoQuery| handle_echo(query, delay_ms.clone()),
        reporter,
    ));
    get(move |Query(query): Query<EchoQuery>| {
        let wrapped = Arc::clone(&wrapped);
        async move { wrapped.call((query,)).await }
    })
}

async fn handle_echo(
    query: EchoQuery,
    delay_ms: RangeInclusive<u64>,
) -> Result<Json<EchoResponse>, Infallible> {
    let input = query.input.unwrap_or_else(|| "Hello World".to_string());
    let delay = rand::rng().random_range(delay_ms);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    Ok(Json(EchoResponse {
        response: input,
        delay,
    }))
}

/// The `console.log` analog: one line per report with the record as JSON.
fn log_invocation_json(name: &str, invocation: &Invocation, _args: &(EchoQuery,)) {
    match facet_json::to_string(invocation) {
        Ok(json) => info!(op = name, invocation = %json, "cardio report"),
        Err(err) => warn!(op = name, %err, "failed to encode invocation"),
    }
}

fn parse_cli() -> Result<DemoCli, String> {
    let figue_config = args::builder::<DemoCli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("cardio-examples")
                .description("Sample HTTP service instrumented with cardio")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}
