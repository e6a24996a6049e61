//! Top-level error types for the triage pipeline.
//!
//! [`TriageError`] covers conditions that end a run before a
//! [`crate::TriageOutcome`] is produced. Component-level errors
//! ([`crate::ClassifierError`], [`crate::TrackerError`]) are defined next to
//! their ports and folded into [`TriageError::UpstreamService`] by the
//! orchestrator.
//!
//! No variant is retried inside the pipeline. At-least-once redelivery, where
//! wanted, belongs to the messaging layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EventRejection, IssueNumber, RepoName, RepoOwner};

/// External service that failed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamService {
    Classifier,
    IssueTracker,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classifier => f.write_str("classifier"),
            Self::IssueTracker => f.write_str("issue tracker"),
        }
    }
}

/// Errors that end a triage run without an outcome.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum TriageError {
    /// The webhook signature did not match the configured secret.
    ///
    /// Always terminal. Nothing downstream is called.
    #[error("Unauthorized: webhook signature mismatch")]
    Authorization,

    /// The event is not actionable (wrong action) or is not a valid payload.
    ///
    /// Expected traffic; not logged as an error.
    #[error("Bad request: {reason}")]
    BadRequest {
        /// Human-readable reason, e.g. `"wrong action: 'closed'"`.
        reason: String,
    },

    /// An external service failed or timed out.
    #[error("{service} failed for {owner}/{repo}#{issue_number}: {message}")]
    UpstreamService {
        service: UpstreamService,
        owner: RepoOwner,
        repo: RepoName,
        issue_number: IssueNumber,
        message: String,
    },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; the server never starts with an invalid config.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl From<EventRejection> for TriageError {
    fn from(rejection: EventRejection) -> Self {
        Self::BadRequest {
            reason: rejection.to_string(),
        }
    }
}
