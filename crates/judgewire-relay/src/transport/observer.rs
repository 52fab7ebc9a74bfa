//! Observer attachment (WS).
//!
//! Observers get a live copy of relayed traffic. They are not expected to
//! reply: an inbound frame that parses as a recognized result envelope is
//! forwarded upstream, everything else is ignored. On disconnect (either
//! side) or send failure the observer is unregistered; unregistration is
//! idempotent with the hub's own sweep removal.

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use judgewire_core::protocol::{kinds, Envelope};

use crate::app_state::AppState;

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_observer(app, socket))
}

async fn run_observer(app: AppState, socket: WebSocket) {
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(app.cfg().observers.queue_depth);
    let hub = app.hub();
    let id = hub.register(out_tx);

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                match msg {
                    Message::Text(text) => {
                        // lenient: observers are read-mostly
                        let Ok(env) = Envelope::parse(&text) else { continue; };
                        if !kinds::is_result_kind(&env.kind) {
                            continue;
                        }
                        let upstream = app.upstream();
                        tokio::spawn(async move {
                            if let Err(e) = upstream.send(&env).await {
                                tracing::warn!(
                                    observer = id,
                                    error = %e,
                                    "observer result not delivered upstream"
                                );
                            }
                        });
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }

    hub.unregister(id);
}
