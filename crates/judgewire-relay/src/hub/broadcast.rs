//! Best-effort fan-out to connected observers.
//!
//! Delivery is lossy per observer: a full queue drops the frame for that
//! observer only, a closed queue removes the observer. One observer's
//! failure never reaches the others and never raises out of `broadcast`.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

use judgewire_core::protocol::Envelope;

pub type ObserverId = u64;

static DROPPED_FRAMES: AtomicU64 = AtomicU64::new(0);

/// Frames dropped on full observer queues (ops/metrics hook).
pub fn dropped_frame_count() -> u64 {
    DROPPED_FRAMES.load(Ordering::Relaxed)
}

/// One observer's outbound queue sender.
#[derive(Clone)]
struct Observer {
    tx: mpsc::Sender<Message>,
}

/// Registry of live observers, keyed by insertion id.
#[derive(Default)]
pub struct BroadcastHub {
    observers: DashMap<ObserverId, Observer>,
    seq: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            observers: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Add a live observer; returns its registry id.
    pub fn register(&self, tx: mpsc::Sender<Message>) -> ObserverId {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.observers.insert(id, Observer { tx });
        tracing::debug!(observer = id, total = self.observers.len(), "observer registered");
        id
    }

    /// Remove an observer. Removing an absent id is a no-op.
    pub fn unregister(&self, id: ObserverId) {
        if self.observers.remove(&id).is_some() {
            tracing::debug!(observer = id, total = self.observers.len(), "observer unregistered");
        }
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Serialize once, deliver a copy to every observer.
    pub fn broadcast(&self, env: &Envelope) {
        if self.observers.is_empty() {
            return;
        }
        let Ok(text) = env.to_wire() else {
            tracing::warn!(kind = %env.kind, "unencodable envelope, skipping broadcast");
            return;
        };

        let mut dead = Vec::new();
        for entry in self.observers.iter() {
            match entry.value().tx.try_send(Message::Text(text.clone())) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    DROPPED_FRAMES.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(observer = entry.key(), "observer queue full, frame dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    dead.push(*entry.key());
                }
            }
        }
        for id in dead {
            self.unregister(id);
        }
    }
}
