//! In-process triage queue and worker.
//!
//! The webhook receiver publishes admitted issues as JSON-encoded
//! [`QueuedIssue`] messages; the worker decodes each message and runs
//! [`TriageExecutor::triage`] on its own task, so a slow classifier call never
//! holds up webhook acknowledgement or other runs.
//!
//! The queue is bounded. Publishing to a full queue fails immediately rather
//! than blocking the HTTP handler.

use std::sync::Arc;

use nodes::TriageExecutor;
use pipeline::QueuedIssue;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::hook_log::{HookLog, HookRecord};

/// Identifies one published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as carried by the queue: an id plus the encoded payload.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub id: MessageId,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("triage queue is full")]
    Full,

    #[error("triage queue is closed")]
    Closed,

    #[error("message could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publishing half of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<QueueMessage>,
}

/// Consuming half of the queue, owned by the worker.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<QueueMessage>,
}

/// Creates a bounded queue holding at most `capacity` pending messages.
pub fn triage_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueSender { tx }, QueueReceiver { rx })
}

impl QueueSender {
    pub fn publish(&self, issue: &QueuedIssue) -> Result<MessageId, QueueError> {
        let message = QueueMessage {
            id: MessageId::new_random(),
            data: issue.to_bytes()?,
        };
        let id = message.id;
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;
        Ok(id)
    }
}

/// Consumes messages until every [`QueueSender`] is dropped, then waits for
/// in-flight runs to finish.
///
/// Undecodable messages are logged and dropped. Run failures are logged and
/// recorded in the hook log; they are not redelivered.
pub async fn run_worker(
    mut receiver: QueueReceiver,
    executor: Arc<TriageExecutor>,
    hook_log: Arc<HookLog>,
) {
    let mut in_flight = JoinSet::new();

    while let Some(message) = receiver.rx.recv().await {
        // Reap finished runs so the set does not grow without bound.
        while let Some(result) = in_flight.try_join_next() {
            log_panicked_run(result);
        }

        // Only reachable for bytes not produced by `QueueSender::publish`.
        let issue = match QueuedIssue::from_bytes(&message.data) {
            Ok(issue) => issue,
            Err(err) => {
                warn!(message_id = %message.id, error = %err, "dropping undecodable message");
                continue;
            }
        };

        let executor = Arc::clone(&executor);
        let hook_log = Arc::clone(&hook_log);
        in_flight.spawn(async move {
            match executor.triage(&issue).await {
                Ok(outcome) => hook_log.push(HookRecord::from_outcome(&outcome)),
                Err(err) => {
                    error!(message_id = %message.id, error = %err, "queued triage failed");
                    hook_log.push(HookRecord::from_error(&err));
                }
            }
        });
    }

    while let Some(result) = in_flight.join_next().await {
        log_panicked_run(result);
    }
    info!("triage worker stopped");
}

fn log_panicked_run(result: Result<(), JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "triage task panicked");
    }
}
