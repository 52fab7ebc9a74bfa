use serde::Deserialize;

use judgewire_core::error::{JudgewireError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    #[serde(default)]
    pub scoring: ScoringSection,

    #[serde(default)]
    pub observers: ObserverSection,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            relay: RelaySection::default(),
            upstream: UpstreamSection::default(),
            scoring: ScoringSection::default(),
            observers: ObserverSection::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(JudgewireError::UnsupportedVersion);
        }
        self.relay.validate()?;
        self.upstream.validate()?;
        self.scoring.validate()?;
        self.observers.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl RelaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<std::net::SocketAddr>()
            .map_err(|_| {
                JudgewireError::BadRequest("relay.listen must be a valid socket address".into())
            })?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamSection {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl UpstreamSection {
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(JudgewireError::BadRequest(
                "upstream.url must be a ws:// or wss:// url".into(),
            ));
        }
        if !(100..=60_000).contains(&self.reconnect_delay_ms) {
            return Err(JudgewireError::BadRequest(
                "upstream.reconnect_delay_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringSection {
    #[serde(default = "default_scoring_base_url")]
    pub base_url: String,

    #[serde(default = "default_scoring_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            base_url: default_scoring_base_url(),
            timeout_ms: default_scoring_timeout_ms(),
        }
    }
}

impl ScoringSection {
    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(JudgewireError::BadRequest(
                "scoring.base_url must be an http:// or https:// url".into(),
            ));
        }
        if !(1_000..=300_000).contains(&self.timeout_ms) {
            return Err(JudgewireError::BadRequest(
                "scoring.timeout_ms must be between 1000 and 300000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObserverSection {
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for ObserverSection {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

impl ObserverSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4096).contains(&self.queue_depth) {
            return Err(JudgewireError::BadRequest(
                "observers.queue_depth must be between 1 and 4096".into(),
            ));
        }
        Ok(())
    }
}

fn default_version() -> u32 {
    1
}
fn default_listen() -> String {
    "0.0.0.0:8010".into()
}
fn default_upstream_url() -> String {
    "ws://127.0.0.1:8080".into()
}
fn default_reconnect_delay_ms() -> u64 {
    2000
}
fn default_scoring_base_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_scoring_timeout_ms() -> u64 {
    30_000
}
fn default_queue_depth() -> usize {
    64
}
