use std::sync::Arc;

use anyhow::Context;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod extract;
mod health;
mod response;
mod state;
mod users;

use crate::{config::AppConfig, state::AppState, users::repo::PgUserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userapi=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env().context("load configuration")?;
    let pool = db::connect(&config.database).context("configure database pool")?;

    let store = Arc::new(PgUserStore::new(pool));
    if let Err(e) = store.refresh().await {
        tracing::warn!(error = %e, "database not reachable at startup; serving 503 until it is");
    }
    store.spawn_monitor(config.database.check_interval);

    let state = AppState::from_parts(config, store)?;
    let config = state.config.clone();

    app::serve(app::build_app(state), &config).await
}
