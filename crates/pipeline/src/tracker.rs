//! Issue tracker port used by the label applicator.

use async_trait::async_trait;
use thiserror::Error;

use crate::{IssueRef, LabelName};

/// Failures of the issue tracker API.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("issue tracker transport error: {0}")]
    Transport(String),

    #[error("issue tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("issue tracker call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// An external issue tracker that can attach labels to issues.
///
/// `add_labels` is not deduplicated here; reapplying a label that is already
/// present is left to the tracker's own semantics.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn add_labels(&self, issue: &IssueRef, labels: &[LabelName]) -> Result<(), TrackerError>;
}
