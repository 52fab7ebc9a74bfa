//! Persistent connection to the upstream peer.
//!
//! One `UpstreamLink` owns the single outbound WebSocket for the process
//! lifetime. `run` is the only task that ever dials; senders converge on
//! that one attempt by waiting on the published state instead of racing
//! their own connections.
//!
//! Reconnects use a fixed delay and an unbounded retry count. A send
//! failure is reported to the caller once and never retried here; callers
//! that need delivery guarantees retry at a higher level.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use judgewire_core::error::{JudgewireError, Result};
use judgewire_core::protocol::Envelope;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

static RECONNECTS: AtomicU64 = AtomicU64::new(0);

/// Completed-connection teardowns so far (ops/metrics hook).
pub fn reconnect_count() -> u64 {
    RECONNECTS.load(Ordering::Relaxed)
}

/// Connection lifecycle, published through a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct UpstreamLink {
    url: String,
    reconnect_delay: Duration,
    writer: Mutex<Option<WsWriter>>,
    state_tx: watch::Sender<LinkState>,
    reset: Notify,
}

impl UpstreamLink {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let (state_tx, _) = watch::channel(LinkState::Disconnected);
        Self {
            url: url.into(),
            reconnect_delay,
            writer: Mutex::new(None),
            state_tx,
            reset: Notify::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        *self.state_tx.borrow()
    }

    /// Suspend until the link reports `Connected`.
    pub async fn wait_connected(&self) {
        let mut rx = self.state_tx.subscribe();
        while *rx.borrow_and_update() != LinkState::Connected {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Send one envelope on the current connection.
    ///
    /// Suspends until a connection is available, then attempts the send
    /// exactly once. A transport failure marks the link down and is
    /// returned to the caller.
    pub async fn send(&self, env: &Envelope) -> Result<()> {
        let text = env.to_wire()?;
        loop {
            self.wait_connected().await;
            let mut guard = self.writer.lock().await;
            let Some(writer) = guard.as_mut() else {
                // lost the connection between the wait and the lock
                continue;
            };
            return match writer.send(Message::Text(text.clone().into())).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    self.state_tx.send_replace(LinkState::Disconnected);
                    *guard = None;
                    self.reset.notify_one();
                    Err(JudgewireError::Transport(format!(
                        "upstream send failed: {e}"
                    )))
                }
            };
        }
    }

    /// Drive the connection for the process lifetime.
    ///
    /// Dials with the fixed delay between attempts, parses each text frame
    /// as an `Envelope`, and forwards it on `inbound_tx`. Malformed frames
    /// are dropped without ending the stream; any transport error tears the
    /// connection down and the loop dials again.
    pub async fn run(&self, inbound_tx: mpsc::Sender<Envelope>) {
        loop {
            let ws = self.dial().await;
            let (ws_tx, ws_rx) = ws.split();
            *self.writer.lock().await = Some(ws_tx);
            self.state_tx.send_replace(LinkState::Connected);
            tracing::info!(url = %self.url, "upstream connected");

            if !self.read_until_broken(ws_rx, &inbound_tx).await {
                return; // router gone, nothing left to feed
            }

            self.state_tx.send_replace(LinkState::Disconnected);
            *self.writer.lock().await = None;
            RECONNECTS.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                delay_ms = self.reconnect_delay.as_millis() as u64,
                "upstream disconnected, reconnecting after delay"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Dial until a connection is established (fixed delay, unbounded).
    async fn dial(&self) -> WsStream {
        self.state_tx.send_replace(LinkState::Connecting);
        loop {
            tracing::info!(url = %self.url, "connecting to upstream");
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => return ws,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "upstream connect failed, retrying"
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    /// Pump inbound frames until the connection breaks (returns `true`) or
    /// the consumer side is gone (returns `false`).
    async fn read_until_broken(
        &self,
        mut ws_rx: WsReader,
        inbound_tx: &mpsc::Sender<Envelope>,
    ) -> bool {
        loop {
            tokio::select! {
                incoming = ws_rx.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            match Envelope::parse(text.as_str()) {
                                Ok(env) => {
                                    if inbound_tx.send(env).await.is_err() {
                                        return false;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "dropping malformed upstream frame");
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return true,
                        Some(Ok(_)) => {} // ping/pong/binary: transport-level, ignored
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "upstream read error");
                            return true;
                        }
                    }
                }
                // a sender hit a write error; this connection is done
                _ = self.reset.notified() => return true,
            }
        }
    }
}
