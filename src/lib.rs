pub mod aggregate;
pub mod chart;
pub mod classify;
pub mod config;
pub mod game;
pub mod game_data;
pub mod game_feed;
pub mod http_cache;
pub mod http_client;
pub mod local_time;
pub mod page;
pub mod qr;
pub mod rink;
pub mod schedule;
pub mod server;
pub mod service;

/// Installs the `tracing` subscriber used by the binaries; `RUST_LOG`
/// overrides the default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
