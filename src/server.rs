//! ==============================================================================
//! server.rs - http surface of the ingestion hub
//! ==============================================================================
//!
//! purpose:
//!     wires the ingestion and query endpoints into one axum router.
//!     every handler is a stateless request/response transformation over the
//!     shared history and counters; the write path takes the write lock for
//!     the whole read-modify-write step so the cap and ordering invariants
//!     hold under concurrent connections.
//!
//! endpoints:
//!     POST /api/data    - ingest a reading (form, json, or raw text)
//!     GET  /api/data    - full history plus counters
//!     GET  /api/test    - plain-text liveness probe
//!     GET  /api/health  - runtime health and memory snapshot
//!     GET  /api/simple  - query-string ingestion variant
//!     GET  /dashboard   - html view of recent readings
//!     GET  /            - endpoint directory
//!
//! relationships:
//!     - used by: main.rs (builds the router, serves it)
//!     - uses: ingest.rs (payload decoding), domain.rs (state), sys.rs
//!
//! ==============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::HubConfig;
use crate::domain::{AppState, Reading, SimpleReading, DASHBOARD_ROWS};
use crate::ingest::{self, PayloadKind};
use crate::sys;

/// largest accepted ingest body; matches the body-parser limit the
/// deployed firmware was tuned against
const BODY_LIMIT: usize = 100 * 1024;

/// fixed probe string; field clients compare it byte-for-byte, so it
/// survives from the service this one replaced
const PROBE_TEXT: &str = "OK - Node.js API is working!";

const INGEST_HELP: &str = "POST form, JSON, or raw text with temp=<number> and hum=<number>";

/// everything a handler needs: the shared state, the config, and the
/// process start instant for uptime reporting
#[derive(Clone)]
pub struct ServerContext {
    pub state: Arc<RwLock<AppState>>,
    pub config: Arc<HubConfig>,
    started: Instant,
}

impl ServerContext {
    pub fn new(state: Arc<RwLock<AppState>>, config: Arc<HubConfig>) -> Self {
        Self {
            state,
            config,
            started: Instant::now(),
        }
    }
}

/// build the full router; CORS stays permissive so browser dashboards on
/// other origins can read the api
pub fn router(ctx: ServerContext) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/data", post(ingest_handler).get(history_handler))
        .route("/api/test", get(probe_handler))
        .route("/api/health", get(health_handler))
        .route("/api/simple", get(simple_handler))
        .route("/dashboard", get(dashboard_handler))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

// ==============================================================================
// ingestion endpoint
// ==============================================================================

/// POST /api/data
///
/// counters move BEFORE the body is read: total_requests and last_request
/// cover failed ingests too, successful_posts only clean ones.
async fn ingest_handler(State(ctx): State<ServerContext>, req: Request) -> Response {
    let received_at = sys::timestamp_ms();
    {
        let mut state = ctx.state.write().await;
        state.counters.total_requests += 1;
        state.counters.last_request = Some(received_at);
    }

    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("ingest body rejected: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "help": INGEST_HELP,
                })),
            )
                .into_response();
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let fields = ingest::decode(PayloadKind::from_content_type(content_type), &body);
    let client = parts
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = ctx.state.write().await;
    let reading = Reading {
        id: state.next_reading_id(),
        temperature: fields.temperature,
        humidity: fields.humidity,
        timestamp: sys::timestamp_ms(),
        received_at,
        client,
    };
    state.history.record(reading.clone());
    state.counters.successful_posts += 1;
    let count = state.history.len();
    drop(state);

    info!(
        temperature = fields.temperature,
        humidity = fields.humidity,
        count, "stored reading"
    );

    Json(json!({
        "success": true,
        "message": "Reading stored",
        "data": reading,
        "count": count,
        "server": ctx.config.server.name,
    }))
    .into_response()
}

// ==============================================================================
// query endpoints
// ==============================================================================

/// GET /api/data - full ordered history plus the counters snapshot
async fn history_handler(State(ctx): State<ServerContext>) -> Json<serde_json::Value> {
    let state = ctx.state.read().await;
    Json(json!({
        "success": true,
        "count": state.history.len(),
        "data": state.history.entries(),
        "stats": state.counters,
    }))
}

/// GET /api/test - connectivity check for clients too constrained to parse json
async fn probe_handler() -> &'static str {
    PROBE_TEXT
}

/// GET /api/health
async fn health_handler(State(ctx): State<ServerContext>) -> Json<serde_json::Value> {
    let state = ctx.state.read().await;
    Json(json!({
        "status": "ok",
        "server": ctx.config.server.name,
        "runtime": concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
        "uptime": ctx.started.elapsed().as_secs(),
        "memory": sys::memory_snapshot(),
        "requests": state.counters,
    }))
}

#[derive(Deserialize)]
struct SimpleParams {
    temp: Option<String>,
    hum: Option<String>,
}

/// GET /api/simple?temp=&hum=
///
/// stores the query values exactly as received (no numeric coercion) and
/// does NOT enforce the history cap - that check lives on the POST path
/// only, and deployed clients rely on the difference. see DESIGN.md.
async fn simple_handler(
    State(ctx): State<ServerContext>,
    Query(params): Query<SimpleParams>,
) -> Json<serde_json::Value> {
    let entry = SimpleReading {
        timestamp: sys::timestamp_ms(),
        temperature: params.temp.unwrap_or_else(|| "0".to_string()),
        humidity: params.hum.unwrap_or_else(|| "0".to_string()),
        method: "GET".to_string(),
    };

    let mut state = ctx.state.write().await;
    state.history.record_unbounded(entry.clone());
    drop(state);

    Json(json!({
        "received": true,
        "data": entry,
    }))
}

/// GET / - discoverability aid for people poking at the service
async fn index_handler(State(ctx): State<ServerContext>) -> Json<serde_json::Value> {
    Json(json!({
        "message": format!("{} sensor ingestion service", ctx.config.server.name),
        "endpoints": {
            "POST /api/data": "ingest a reading: temp=25.5&hum=60.0 (form, JSON, or raw text)",
            "GET /api/data": "full history plus counters",
            "GET /api/test": "plain-text liveness probe",
            "GET /api/health": "runtime health and memory snapshot",
            "GET /api/simple?temp=25&hum=60": "query-string ingestion variant",
            "GET /dashboard": "HTML view of recent readings",
        },
        "note": "all state is in memory and resets on restart",
    }))
}

// ==============================================================================
// dashboard
// ==============================================================================

/// GET /dashboard - server-side html over the current history state
async fn dashboard_handler(State(ctx): State<ServerContext>) -> Html<String> {
    let state = ctx.state.read().await;

    let rows: String = state
        .history
        .recent(DASHBOARD_ROWS)
        .map(|entry| {
            format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                format_timestamp(entry.timestamp()),
                html_escape(&entry.temperature_display()),
                html_escape(&entry.humidity_display()),
            )
        })
        .collect();

    let rows = if rows.is_empty() {
        "        <tr><td colspan=\"3\">no readings yet</td></tr>\n".to_string()
    } else {
        rows
    };

    Html(format!(
        r#"<!doctype html>
<html>
<head>
    <title>{name} dashboard</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
</head>
<body style="font-family: system-ui; padding: 2rem; background: #1a1a2e; color: #eee;">
    <h1>{name}</h1>
    <p>{count} reading(s) stored</p>
    <table style="border-collapse: collapse; min-width: 24rem;" border="1" cellpadding="6">
        <tr><th>time</th><th>temperature</th><th>humidity</th></tr>
{rows}    </table>
    <p style="color: #888;">
        <a style="color: #6bf;" href="/api/data">json api</a> ·
        <a style="color: #6bf;" href="/api/health">health</a>
    </p>
</body>
</html>"#,
        name = html_escape(&ctx.config.server.name),
        count = state.history.len(),
        rows = rows,
    ))
}

/// render a unix-ms timestamp as a utc table cell
fn format_timestamp(ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
