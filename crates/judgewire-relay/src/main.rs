//! judgewire relay
//!
//! Bridges a stateful game server (one persistent WS link) to an AI scoring
//! service (request/response HTTP) and fans relayed traffic out to any
//! number of passive observers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use judgewire_relay::{app_state, config, dispatch, hub, obs, router, scoring, upstream};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JUDGEWIRE_CONFIG").ok());
    let cfg = config::load(path.as_deref()).expect("config load failed");
    let listen: SocketAddr = cfg
        .relay
        .listen
        .parse()
        .expect("relay.listen must be a valid SocketAddr");

    let link = Arc::new(upstream::UpstreamLink::new(
        cfg.upstream.url.clone(),
        Duration::from_millis(cfg.upstream.reconnect_delay_ms),
    ));
    let hub = Arc::new(hub::BroadcastHub::new());
    let metrics = Arc::new(obs::metrics::RelayMetrics::default());
    let scoring = Arc::new(
        scoring::ScoringClient::new(
            cfg.scoring.base_url.clone(),
            Duration::from_millis(cfg.scoring.timeout_ms),
        )
        .expect("scoring client build failed"),
    );

    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    {
        let link = Arc::clone(&link);
        tokio::spawn(async move { link.run(inbound_tx).await });
    }
    let dispatcher = Arc::new(dispatch::Dispatcher::new(
        Arc::clone(&link),
        scoring,
        Arc::clone(&hub),
        Arc::clone(&metrics),
    ));
    tokio::spawn(dispatcher.run(inbound_rx));

    let state = app_state::AppState::new(cfg, link, hub, metrics);
    let app = router::build_router(state);

    tracing::info!(%listen, "judgewire-relay starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
