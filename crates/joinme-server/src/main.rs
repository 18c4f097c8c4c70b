mod cleanup;
mod config;
mod rest;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::TimeDelta;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use joinme_db::{Database, KeyValueStore, RegistrationIndex};
use joinme_gateway::{
    ActivityMatcher, CommandRegistry, HandlerContext, InteractionRouter, Platform, Settings,
};
use joinme_relay::{AttachmentRelay, FsBlobStore};

use crate::config::Config;
use crate::rest::RestPlatform;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "joinme=debug,joinme_gateway=debug,joinme_relay=info,joinme_db=info,tower_http=info"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    // Store and index
    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let store: Arc<dyn KeyValueStore> = Arc::new(db);
    let index = RegistrationIndex::new(store.clone());

    // Attachment relay
    let blobs = FsBlobStore::new(config.blob_dir.clone(), config.blob_base_url()).await?;
    let relay = AttachmentRelay::new(Arc::new(blobs));

    // Platform bridge
    let platform: Arc<dyn Platform> = Arc::new(RestPlatform::new(
        reqwest::Client::new(),
        config.platform_url.clone(),
        config.bot_token.clone(),
    ));

    // Commands are validated once; a duplicate name is fatal.
    let commands = Arc::new(CommandRegistry::with_default_commands()?);
    if config.register_commands {
        let definitions = commands.definitions();
        match platform.register_commands(&definitions).await {
            Ok(()) => info!("Published {} command definitions", definitions.len()),
            Err(e) => warn!("Failed to publish command definitions: {}", e),
        }
    }

    let pending_ttl = TimeDelta::from_std(config.pending_ttl).context("JOINME_PENDING_TTL_SECS out of range")?;
    let ctx = HandlerContext::new(index, relay, platform, Settings { pending_ttl });

    // Background reaper for expired store rows
    tokio::spawn(cleanup::run_reaper_loop(store, config.reap_interval));

    let state = AppState {
        router: InteractionRouter::new(ctx.clone(), commands),
        matcher: ActivityMatcher::new(ctx, config.delivery_policy),
        event_secret: Arc::from(config.event_secret.as_str()),
    };

    let app = routes::router(state)
        .nest_service("/attachments", ServeDir::new(&config.blob_dir))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("joinme listening on {}", addr);
    info!("Delivery policy: {:?}", config.delivery_policy);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
