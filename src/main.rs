use std::net::SocketAddr;

use anyhow::{Context, Result};

use nhl_shot_chart::config::AppConfig;
use nhl_shot_chart::init_tracing;
use nhl_shot_chart::server::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    tracing::info!(
        feed_source = ?config.feed_source,
        default_game_id = %config.default_game_id,
        "starting shot chart server"
    );

    let app = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("server exited")?;
    Ok(())
}
