//! restshop HTTP service
//!
//! Serves multi-tenant sessions of a hydropower scheduling engine:
//! 1. Each caller (`x-principal` header) owns numbered engine sessions
//! 2. Model objects, attributes, connections and commands are exchanged as JSON
//!
//! Usage:
//!   restshop --port 8000 --log-endpoint http://collector:5000/log/message
//!
//! All session state lives in memory and is gone on restart.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Parser;
use restshop_codec::TypeCatalog;
use restshop_engine::{EngineFactory, MemoryEngineFactory};
use restshop_server::{AppState, ServerConfig, build_router};
use restshop_session::{LogForwarder, RegistryConfig, SessionRegistry};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "restshop")]
#[command(about = "HTTP service for hydropower scheduling engine sessions")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Collector that receives engine log events
    #[arg(long)]
    log_endpoint: Option<String>,

    /// Minutes a principal survives without requests
    #[arg(long, default_value = "60")]
    principal_ttl_minutes: i64,

    /// Principal for requests without an x-principal header
    #[arg(long, default_value = "default")]
    default_principal: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("restshop starting...");
    let principal_ttl = TimeDelta::try_minutes(args.principal_ttl_minutes)
        .context("principal TTL is out of range")?;

    let factory: Arc<dyn EngineFactory> = Arc::new(MemoryEngineFactory);
    let catalog = TypeCatalog::bootstrap(factory.as_ref())
        .context("failed to load the engine type catalog")?;

    let forwarder = LogForwarder::spawn(args.log_endpoint.clone());
    if let Some(endpoint) = &args.log_endpoint {
        info!("Forwarding engine logs to {}", endpoint);
    }

    let registry = SessionRegistry::new(
        factory,
        Arc::new(catalog),
        forwarder,
        RegistryConfig {
            principal_ttl,
            ..RegistryConfig::default()
        },
    );
    let state = AppState::new(
        Arc::new(registry),
        ServerConfig {
            default_principal: args.default_principal,
        },
    );
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("HTTP API listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
