mod app_state;
mod config;
mod crypto;
mod db;
mod handlers;
mod qr;
mod validation;
mod wallet;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_state::AppState;
use config::Config;
use crypto::TokenKey;
use db::{
    init_pool,
    repository::{KvRepository, SqliteKvRepository},
    writer::spawn_writer,
};
use handlers::{cards, menu};
use wallet::CardStore;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "card_wallet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse configuration
    let config = Config::parse();

    let token_key = match &config.token_key {
        Some(hex) => TokenKey::from_hex(hex)?,
        None => {
            tracing::warn!("No TOKEN_KEY configured, using a random key for this run");
            TokenKey::generate()
        }
    };
    tracing::info!("Token key check value: {}", token_key.check_value());

    // Initialize database and load the stored collection
    let pool = init_pool(&config.database_url).await?;
    let repo: Arc<dyn KvRepository> = Arc::new(SqliteKvRepository::new(pool));
    let stored = repo.load(&config.storage_key).await?;

    let (sink, writer) = spawn_writer(repo, config.storage_key.clone());
    let store =
        CardStore::restore_or_empty(stored.as_deref(), token_key).with_sink(Box::new(sink));
    tracing::info!("Loaded {} card(s)", store.cards().len());

    // Create shared state
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        qr_renderer: None,
    };

    // Build router
    let app = Router::new()
        .route("/api/cards", get(cards::list_cards).post(cards::create_card))
        .route("/api/cards/current", get(cards::current_card))
        .route("/api/cards/flip", post(cards::flip_card))
        .route("/api/cards/{id}", axum::routing::delete(cards::delete_card))
        .route("/api/cards/{id}/select", post(cards::select_card))
        .route(
            "/api/cards/{id}/primary",
            post(cards::set_primary).delete(cards::remove_primary),
        )
        .route("/api/cards/{id}/qr", get(cards::card_qr))
        .route("/api/menu", axum::routing::delete(menu::close_menu))
        .route("/api/menu/action", post(menu::apply_action))
        .route("/api/menu/{id}", post(menu::open_menu))
        .route("/api/palette", get(cards::palette))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
        )
        // Add shared state
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.socket_addr()).await?;

    tracing::info!("Server running on {}", config.socket_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // The router (and with it the last sink) is gone; let the writer drain.
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
        Ok(joined) => joined?,
        Err(_) => tracing::warn!("Persistence writer did not finish in time"),
    }

    Ok(())
}
