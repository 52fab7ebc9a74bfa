//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;

use judgewire_core::error::{JudgewireError, Result};

pub use schema::{ObserverSection, RelayConfig, RelaySection, ScoringSection, UpstreamSection};

/// Load from an optional file path, then apply environment overrides.
///
/// No path means "defaults only" (still env-overridable); the reference
/// deployment was configured entirely through the environment.
pub fn load(path: Option<&str>) -> Result<RelayConfig> {
    let mut cfg = match path {
        Some(p) => load_from_file(p)?,
        None => RelayConfig::default(),
    };
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<RelayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| JudgewireError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| JudgewireError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut RelayConfig) {
    if let Ok(v) = std::env::var("JUDGEWIRE_UPSTREAM_URL") {
        cfg.upstream.url = v;
    }
    if let Ok(v) = std::env::var("JUDGEWIRE_SCORING_URL") {
        cfg.scoring.base_url = v;
    }
    if let Ok(v) = std::env::var("JUDGEWIRE_LISTEN") {
        cfg.relay.listen = v;
    }
    if let Ok(v) = std::env::var("JUDGEWIRE_RECONNECT_MS") {
        if let Ok(ms) = v.parse() {
            cfg.upstream.reconnect_delay_ms = ms;
        }
    }
}
