// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Regatta Schema Registry server.
//!
//! REST front end over the registry core. One node per process; the node
//! is either the primary (accepts writes) or a replica (serves reads and
//! forwards writes to the primary).
//!
//! # Usage
//!
//! ```bash
//! # Start a primary on the default port (8081)
//! regatta-server
//!
//! # Custom port and data directory
//! regatta-server --port 9081 --data-dir /var/lib/regatta
//!
//! # Start a replica that forwards writes
//! regatta-server --role replica --primary-endpoint http://10.0.0.5:8081
//! ```
//!
//! # Endpoints
//!
//! - `POST /subjects/{subject}/versions` - register a schema
//! - `POST /subjects/{subject}` - look up a schema under a subject
//! - `GET  /schemas/ids/{id}` - fetch a schema by global id
//! - `GET  /subjects` - list subjects
//! - `GET  /subjects/{subject}/versions` - list version numbers
//! - `GET  /subjects/{subject}/versions/{v|latest}` - fetch one version
//! - `POST /compatibility/subjects/{subject}/versions/{v|latest}` - test
//! - `GET/PUT /config[/{subject}]` - compatibility configuration
//! - `GET  /health` - liveness and role

mod forward;
mod handlers;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use regatta::{
    CompatibilityLevel, Coordinator, FileCommandLog, NodeConfig, NodeRole, SchemaRegistry,
    StateMachine,
};

/// Regatta Schema Registry - centralized schema management for streaming platforms
#[derive(Parser, Debug)]
#[command(name = "regatta-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8081")]
    port: u16,

    /// Bind address (0.0.0.0 for all interfaces)
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Configuration file (JSON format); CLI flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the command log
    #[arg(long, default_value = "./regatta-data")]
    data_dir: PathBuf,

    /// Node role (primary, replica)
    #[arg(long, default_value = "primary")]
    role: String,

    /// Base URL of the primary (required for replicas)
    #[arg(long)]
    primary_endpoint: Option<String>,

    /// Global compatibility level before any config change
    /// (NONE, BACKWARD, FORWARD, FULL)
    #[arg(long, default_value = "NONE")]
    default_compatibility: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Shared application state.
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub forwarder: forward::Forwarder,
    pub node_id: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load or assemble config
    let config = if let Some(config_path) = &args.config {
        info!("Loading config from {:?}", config_path);
        NodeConfig::from_file(config_path)?
    } else {
        let role = match args.role.as_str() {
            "replica" => NodeRole::Replica,
            _ => NodeRole::Primary,
        };
        let config = NodeConfig {
            bind_address: args.bind.parse()?,
            port: args.port,
            data_dir: args.data_dir.clone(),
            role,
            primary_endpoint: args.primary_endpoint.clone(),
            default_compatibility: args
                .default_compatibility
                .parse::<CompatibilityLevel>()
                .unwrap_or(CompatibilityLevel::None),
            ..Default::default()
        };
        config.validate()?;
        config
    };

    info!("Regatta Schema Registry v{}", env!("CARGO_PKG_VERSION"));
    info!("Node:   {}", config.node_id);
    info!("Role:   {:?}", config.role);
    info!("Data:   {}", config.data_dir.display());

    // Open the command log and replay it before serving anything. A replay
    // failure is fatal: better to refuse than to serve divergent state.
    let log = FileCommandLog::open(config.command_log_path())?;
    let state = Arc::new(StateMachine::new(
        Box::new(log),
        config.default_compatibility,
    ));
    let replayed = state.bootstrap()?;
    info!("Bootstrap complete: {} commands replayed", replayed);

    let coordinator = Coordinator::new(config.coordinator_role());
    let registry = Arc::new(SchemaRegistry::new(state, coordinator));

    let app_state = Arc::new(AppState {
        registry,
        forwarder: forward::Forwarder::new(),
        node_id: config.node_id.clone(),
    });

    let app = routes::api_routes()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    info!("HTTP server: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received, stopping server...");
        })
        .await?;

    info!("Registry server stopped");
    Ok(())
}
