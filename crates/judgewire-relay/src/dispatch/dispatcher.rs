//! Inbound envelope dispatch.
//!
//! Envelopes are read in arrival order and classified by kind. Each
//! recognized task spawns its own handling task so one slow scoring call
//! never delays classification of the next envelope. Completion order is
//! unconstrained; consumers correlate by `request_id` only.
//!
//! Two envelopes with the same correlation id are independent tasks: the
//! relay keeps no task table and performs no deduplication.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use judgewire_core::error::JudgewireError;
use judgewire_core::protocol::{Envelope, TaskKind};

use crate::hub::BroadcastHub;
use crate::obs::metrics::RelayMetrics;
use crate::scoring::ScoringBackend;
use crate::upstream::UpstreamLink;

pub struct Dispatcher {
    upstream: Arc<UpstreamLink>,
    scoring: Arc<dyn ScoringBackend>,
    hub: Arc<BroadcastHub>,
    metrics: Arc<RelayMetrics>,
}

impl Dispatcher {
    pub fn new(
        upstream: Arc<UpstreamLink>,
        scoring: Arc<dyn ScoringBackend>,
        hub: Arc<BroadcastHub>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            upstream,
            scoring,
            hub,
            metrics,
        }
    }

    /// Consume inbound envelopes until the channel closes.
    pub async fn run(self: Arc<Self>, mut inbound_rx: mpsc::Receiver<Envelope>) {
        while let Some(env) = inbound_rx.recv().await {
            let Some(task) = TaskKind::from_kind(&env.kind) else {
                tracing::debug!(kind = %env.kind, "ignoring unrecognized kind");
                continue;
            };

            // observers see tasks as they arrive, not only after resolution
            self.hub.broadcast(&env);
            self.metrics.tasks_total.inc(&[("kind", task.kind())]);
            tracing::info!(
                kind = %env.kind,
                request_id = env.correlation_id.as_deref().unwrap_or("-"),
                "task dispatched"
            );

            let this = Arc::clone(&self);
            tokio::spawn(async move {
                this.handle_task(task, env).await;
            });
        }
    }

    /// One scoring exchange: call the collaborator, then emit exactly one
    /// result envelope (success or error) carrying the original id.
    async fn handle_task(&self, task: TaskKind, env: Envelope) {
        let request = build_request(task, &env);
        let result = match self.scoring.score(task, request).await {
            Ok(body) => success_envelope(task, &env, &body),
            Err(e) => {
                self.metrics.scoring_failures.inc(&[("kind", task.kind())]);
                tracing::warn!(
                    kind = task.kind(),
                    request_id = env.correlation_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "scoring call failed"
                );
                error_envelope(task, &env, &e)
            }
        };

        // fan-out first: it is lossy and cannot stall the upstream send
        self.hub.broadcast(&result);
        if let Err(e) = self.upstream.send(&result).await {
            tracing::error!(kind = %result.kind, error = %e, "result not delivered upstream");
        }
    }
}

/// Select the payload fields the collaborator expects for `task`.
fn build_request(task: TaskKind, env: &Envelope) -> Value {
    let field = |key: &str| env.field(key).cloned().unwrap_or(Value::Null);
    let mut request = json!({
        "request_id": env.correlation_id.clone(),
        "story_truth": field("story_truth"),
    });
    match task {
        TaskKind::JudgeQuestion => {
            request["history"] = env.field("history").cloned().unwrap_or_else(|| json!([]));
            request["new_question"] = field("new_question");
        }
        TaskKind::ValidateFinalAnswer => {
            request["final_answer_text"] = field("final_answer_text");
        }
    }
    request
}

fn success_envelope(task: TaskKind, env: &Envelope, body: &Value) -> Envelope {
    let pick = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    let out = Envelope::new(task.result_kind(), env.correlation_id.clone());
    match task {
        TaskKind::JudgeQuestion => out
            .with_field("judge_answer", pick("judge_answer"))
            .with_field("score_result", pick("score_result")),
        TaskKind::ValidateFinalAnswer => out
            .with_field("validation_status", pick("validation_status"))
            .with_field("feedback", pick("feedback")),
    }
}

fn error_envelope(task: TaskKind, env: &Envelope, err: &JudgewireError) -> Envelope {
    Envelope::new(task.result_kind(), env.correlation_id.clone())
        .with_field("error", Value::String(err.to_string()))
}
