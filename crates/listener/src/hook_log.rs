//! Bounded in-memory log of recently received webhooks.
//!
//! Holds at most `capacity` records for the lifetime of the process. When full,
//! the oldest record is evicted to make room for the newest. Served read-only at
//! `GET /hooks` for operators; nothing in the pipeline reads it.

use std::collections::VecDeque;
use std::sync::Mutex;

use pipeline::{IssueNumber, RepoName, RepoOwner, Timestamp, TriageError, TriageOutcome};
use serde::Serialize;

/// What happened to a received webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    Labeled,
    Skipped,
    Queued,
    Rejected,
    BadRequest,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookRecord {
    pub received_at: Timestamp,
    pub status: HookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<RepoOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<IssueNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HookRecord {
    fn bare(status: HookStatus, detail: Option<String>) -> Self {
        Self {
            received_at: Timestamp::now(),
            status,
            owner: None,
            repo: None,
            issue_number: None,
            detail,
        }
    }

    pub fn from_outcome(outcome: &TriageOutcome) -> Self {
        Self {
            received_at: Timestamp::now(),
            status: if outcome.labeled {
                HookStatus::Labeled
            } else {
                HookStatus::Skipped
            },
            owner: Some(outcome.owner.clone()),
            repo: Some(outcome.repo.clone()),
            issue_number: Some(outcome.issue_number),
            detail: outcome.label_error.clone(),
        }
    }

    pub fn from_error(err: &TriageError) -> Self {
        match err {
            TriageError::Authorization => Self::bare(HookStatus::Rejected, None),
            TriageError::BadRequest { reason } => {
                Self::bare(HookStatus::BadRequest, Some(reason.clone()))
            }
            TriageError::UpstreamService {
                owner,
                repo,
                issue_number,
                message,
                ..
            } => Self {
                received_at: Timestamp::now(),
                status: HookStatus::Failed,
                owner: Some(owner.clone()),
                repo: Some(repo.clone()),
                issue_number: Some(*issue_number),
                detail: Some(message.clone()),
            },
            TriageError::Configuration { message } => {
                Self::bare(HookStatus::Failed, Some(message.clone()))
            }
        }
    }

    pub fn queued(owner: RepoOwner, repo: RepoName, issue_number: IssueNumber) -> Self {
        Self {
            received_at: Timestamp::now(),
            status: HookStatus::Queued,
            owner: Some(owner),
            repo: Some(repo),
            issue_number: Some(issue_number),
            detail: None,
        }
    }
}

/// Fixed-capacity FIFO ring of [`HookRecord`]s.
#[derive(Debug)]
pub struct HookLog {
    capacity: usize,
    records: Mutex<VecDeque<HookRecord>>,
}

impl HookLog {
    /// Creates an empty log. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, record: HookRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Returns a copy of the records, oldest first.
    pub fn snapshot(&self) -> Vec<HookRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }
}
