//! ==============================================================================
//! main.rs - sensor-hub entry point
//! ==============================================================================
//!
//! purpose:
//!     minimal http ingestion hub for embedded temperature/humidity sensors.
//!     accepts readings over form, json, or raw-text bodies, keeps the most
//!     recent ones in a bounded in-memory history, and exposes them through
//!     json endpoints and a server-rendered dashboard.
//!
//! responsibilities:
//!     - load configuration (config/hub.toml, PORT env override)
//!     - initialize shared state (history + counters behind one rwlock)
//!     - serve the http surface on the configured port
//!
//! relationships:
//!     - uses: server.rs (router and handlers)
//!     - uses: domain.rs (readings, history, counters)
//!     - uses: ingest.rs (payload decoding), sys.rs (health helpers)
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────┐
//!     │                 sensor-hub process               │
//!     │   ┌────────────┐        ┌─────────────────────┐  │
//!     │   │ axum router│──────▶ │ Arc<RwLock<AppState>>│ │
//!     │   │ (port 3000)│        │  history + counters │  │
//!     │   └────────────┘        └─────────────────────┘  │
//!     └──────────────────────────────────────────────────┘
//!            ▲ form / json / raw text
//!            │
//!       embedded sensor clients
//!
//! all state is volatile; a restart starts from an empty history.
//!
//! ==============================================================================

mod config;
mod domain;
mod ingest;
mod server;
mod sys;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  sensor-hub - HTTP ingestion for embedded sensors");
    println!("===========================================================");

    // step 1: load configuration
    let config = config::HubConfig::load_or_default();
    config.print_summary();

    // RUST_LOG wins over the configured level when set
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    // step 2: initialize shared state
    let state = Arc::new(RwLock::new(domain::AppState::default()));

    // step 3: build the router and serve
    let port = config.server.port;
    let ctx = server::ServerContext::new(state, Arc::new(config));
    let app = server::router(ctx);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("[STARTUP] ✓ API live at http://{}", addr);
    println!("[STARTUP] ✓ Dashboard at http://{}/dashboard", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
