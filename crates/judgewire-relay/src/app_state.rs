//! Shared application state for the relay surfaces.
//!
//! Cheap to clone; everything behind `Arc`. The upstream connection handle
//! and the observer registry are only reachable through their owning
//! components here.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::hub::{broadcast, BroadcastHub};
use crate::obs::metrics::RelayMetrics;
use crate::upstream::{link, UpstreamLink};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RelayConfig,
    upstream: Arc<UpstreamLink>,
    hub: Arc<BroadcastHub>,
    metrics: Arc<RelayMetrics>,
}

impl AppState {
    pub fn new(
        cfg: RelayConfig,
        upstream: Arc<UpstreamLink>,
        hub: Arc<BroadcastHub>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                upstream,
                hub,
                metrics,
            }),
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn upstream(&self) -> Arc<UpstreamLink> {
        Arc::clone(&self.inner.upstream)
    }

    pub fn hub(&self) -> Arc<BroadcastHub> {
        Arc::clone(&self.inner.hub)
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// Single-value series appended to the metrics exposition.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            (
                "judgewire_observers_active",
                self.inner.hub.len() as u64,
            ),
            (
                "judgewire_upstream_reconnects_total",
                link::reconnect_count(),
            ),
            (
                "judgewire_dropped_frames_total",
                broadcast::dropped_frame_count(),
            ),
        ]
    }
}
