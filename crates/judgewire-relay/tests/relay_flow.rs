//! End-to-end relay flow against a fake upstream and a mock collaborator.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use judgewire_core::protocol::Envelope;
use judgewire_relay::dispatch::Dispatcher;
use judgewire_relay::hub::BroadcastHub;
use judgewire_relay::obs::metrics::RelayMetrics;
use judgewire_relay::scoring::ScoringClient;
use judgewire_relay::upstream::UpstreamLink;

type ServerWs = WebSocketStream<TcpStream>;

/// Bind a local WS listener standing in for the game server. Returns the
/// url and a handle yielding the first accepted connection.
async fn fake_upstream() -> (String, JoinHandle<ServerWs>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    });
    (format!("ws://{addr}"), handle)
}

/// Wire up a full relay (link + dispatcher) against the given endpoints.
fn spawn_relay(upstream_url: &str, scoring_url: &str) -> (Arc<UpstreamLink>, Arc<BroadcastHub>) {
    let link = Arc::new(UpstreamLink::new(
        upstream_url,
        Duration::from_millis(100),
    ));
    let hub = Arc::new(BroadcastHub::new());
    let metrics = Arc::new(RelayMetrics::default());
    let scoring = Arc::new(ScoringClient::new(scoring_url, Duration::from_secs(2)).unwrap());

    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    {
        let link = Arc::clone(&link);
        tokio::spawn(async move { link.run(inbound_tx).await });
    }
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&link),
        scoring,
        Arc::clone(&hub),
        metrics,
    ));
    tokio::spawn(dispatcher.run(inbound_rx));

    (link, hub)
}

async fn next_envelope(server: &mut ServerWs) -> Envelope {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), server.next())
            .await
            .expect("timed out waiting for upstream frame")
            .expect("upstream closed")
            .expect("upstream read failed");
        if let Message::Text(text) = msg {
            return Envelope::parse(text.as_str()).unwrap();
        }
    }
}

async fn send_envelope(server: &mut ServerWs, body: serde_json::Value) {
    server
        .send(Message::Text(body.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn success_round_trip_carries_correlation_id() {
    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/judge_question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "r1",
            "judge_answer": "yes",
            "score_result": { "score": 2, "justification": "narrows the field" }
        })))
        .mount(&collaborator)
        .await;

    let (url, accept) = fake_upstream().await;
    let (_link, _hub) = spawn_relay(&url, &collaborator.uri());
    let mut server = accept.await.unwrap();

    send_envelope(
        &mut server,
        json!({
            "type": "ai_judge_question",
            "request_id": "r1",
            "story_truth": "t",
            "history": [],
            "new_question": "was it night?"
        }),
    )
    .await;

    let result = next_envelope(&mut server).await;
    assert_eq!(result.kind, "ai_judge_question_result");
    assert_eq!(result.correlation_id.as_deref(), Some("r1"));
    assert_eq!(result.field("judge_answer").unwrap().as_str(), Some("yes"));
    assert_eq!(result.field("score_result").unwrap()["score"], 2);
    assert!(result.field("error").is_none());
}

#[tokio::test]
async fn collaborator_failure_becomes_error_envelope() {
    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/validate_final_answer"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "AI service failed" })),
        )
        .mount(&collaborator)
        .await;

    let (url, accept) = fake_upstream().await;
    let (_link, _hub) = spawn_relay(&url, &collaborator.uri());
    let mut server = accept.await.unwrap();

    send_envelope(
        &mut server,
        json!({
            "type": "ai_validate_final_answer",
            "request_id": "r2",
            "story_truth": "t",
            "final_answer_text": "he did it"
        }),
    )
    .await;

    let result = next_envelope(&mut server).await;
    assert_eq!(result.kind, "ai_validate_final_answer_result");
    assert_eq!(result.correlation_id.as_deref(), Some("r2"));
    let error = result.field("error").unwrap().as_str().unwrap();
    assert!(error.contains("500"), "unexpected error text: {error}");
}

#[tokio::test]
async fn out_of_order_completion_keeps_ids_unswapped() {
    let collaborator = MockServer::start().await;
    // first task is slow, second finishes immediately
    Mock::given(method("POST"))
        .and(path("/ai/judge_question"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "judge_answer": "no", "score_result": { "score": 0 } }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&collaborator)
        .await;
    Mock::given(method("POST"))
        .and(path("/ai/validate_final_answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "validation_status": "CORRECT",
            "feedback": "matches the truth"
        })))
        .mount(&collaborator)
        .await;

    let (url, accept) = fake_upstream().await;
    let (_link, _hub) = spawn_relay(&url, &collaborator.uri());
    let mut server = accept.await.unwrap();

    send_envelope(
        &mut server,
        json!({ "type": "ai_judge_question", "request_id": "r1", "new_question": "q" }),
    )
    .await;
    send_envelope(
        &mut server,
        json!({ "type": "ai_validate_final_answer", "request_id": "r2", "final_answer_text": "a" }),
    )
    .await;

    let first = next_envelope(&mut server).await;
    let second = next_envelope(&mut server).await;

    // r2 should finish first, but correctness only requires id/kind pairing
    let by_kind: HashMap<String, Option<String>> = [first, second]
        .into_iter()
        .map(|env| (env.kind.clone(), env.correlation_id.clone()))
        .collect();
    assert_eq!(
        by_kind["ai_judge_question_result"].as_deref(),
        Some("r1")
    );
    assert_eq!(
        by_kind["ai_validate_final_answer_result"].as_deref(),
        Some("r2")
    );
}

#[tokio::test]
async fn unrecognized_kind_is_dropped_without_dispatch() {
    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/judge_question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "judge_answer": "yes",
            "score_result": { "score": 1 }
        })))
        .expect(1)
        .mount(&collaborator)
        .await;

    let (url, accept) = fake_upstream().await;
    let (_link, _hub) = spawn_relay(&url, &collaborator.uri());
    let mut server = accept.await.unwrap();

    // unknown kinds and malformed frames must not crash the read loop
    send_envelope(&mut server, json!({ "type": "chat", "request_id": "rX" })).await;
    server
        .send(Message::Text("not json at all".into()))
        .await
        .unwrap();
    send_envelope(
        &mut server,
        json!({ "type": "ai_judge_question", "request_id": "r1", "new_question": "q" }),
    )
    .await;

    // the only result that ever comes back belongs to the recognized task
    let result = next_envelope(&mut server).await;
    assert_eq!(result.kind, "ai_judge_question_result");
    assert_eq!(result.correlation_id.as_deref(), Some("r1"));
    collaborator.verify().await;
}

#[tokio::test]
async fn observers_see_task_then_result() {
    let collaborator = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/judge_question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "judge_answer": "yes",
            "score_result": { "score": 2 }
        })))
        .mount(&collaborator)
        .await;

    let (url, accept) = fake_upstream().await;
    let (_link, hub) = spawn_relay(&url, &collaborator.uri());
    let mut server = accept.await.unwrap();

    let (obs_tx, mut obs_rx) = mpsc::channel(16);
    hub.register(obs_tx);

    send_envelope(
        &mut server,
        json!({ "type": "ai_judge_question", "request_id": "r1", "new_question": "q" }),
    )
    .await;
    // drain the upstream result so both fan-outs have happened
    let _ = next_envelope(&mut server).await;

    let first = tokio::time::timeout(Duration::from_secs(5), obs_rx.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(5), obs_rx.recv())
        .await
        .unwrap()
        .unwrap();

    let first = match first {
        axum::extract::ws::Message::Text(t) => Envelope::parse(&t).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    };
    let second = match second {
        axum::extract::ws::Message::Text(t) => Envelope::parse(&t).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    };

    assert_eq!(first.kind, "ai_judge_question");
    assert_eq!(second.kind, "ai_judge_question_result");
    assert_eq!(second.correlation_id.as_deref(), Some("r1"));
}

#[tokio::test]
async fn messages_after_reconnect_succeed_without_replay() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let link = Arc::new(UpstreamLink::new(
        format!("ws://{addr}"),
        Duration::from_millis(100),
    ));
    let (inbound_tx, _inbound_rx) = mpsc::channel(16);
    {
        let link = Arc::clone(&link);
        tokio::spawn(async move { link.run(inbound_tx).await });
    }

    // first connection: deliver one envelope, then the server goes away
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws1 = tokio_tungstenite::accept_async(stream).await.unwrap();
    link.wait_connected().await;

    let before = Envelope::new("ai_judge_question_result", Some("before".into()));
    link.send(&before).await.unwrap();
    let delivered = next_envelope(&mut ws1).await;
    assert_eq!(delivered.correlation_id.as_deref(), Some("before"));
    ws1.close(None).await.unwrap();
    drop(ws1);

    // the link dials again on its own; accept the second connection
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws2 = tokio_tungstenite::accept_async(stream).await.unwrap();

    let after = Envelope::new("ai_judge_question_result", Some("after".into()));
    link.send(&after).await.unwrap();

    // nothing is replayed: the first frame on the new connection is `after`
    let frame = next_envelope(&mut ws2).await;
    assert_eq!(frame.correlation_id.as_deref(), Some("after"));
}
