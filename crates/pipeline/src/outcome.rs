//! Triage run state machine and final outcome.
//!
//! ```text
//! RECEIVED ─► VALIDATED ─┬─► FILTERED_OUT ─► BAD_REQUEST
//!     │                  └─► CLASSIFIED ─┬─► LABELED ─► DONE
//!     │                                  └─► SKIPPED ─► DONE
//!     └─► REJECTED
//! ```
//!
//! A [`TriageOutcome`] exists only for runs that reached `CLASSIFIED`.

use serde::{Deserialize, Serialize};

use crate::{ClassificationScore, IssueNumber, RepoName, RepoOwner, TriageRunId};

/// Position of a triage run in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriageState {
    Received,
    Validated,
    FilteredOut,
    Classified,
    Labeled,
    Skipped,
    Done,
    /// Signature mismatch.
    Rejected,
    /// Wrong action or malformed payload.
    BadRequest,
}

impl TriageState {
    /// Returns `true` if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::BadRequest)
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: TriageState) -> bool {
        use TriageState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Rejected)
                // A queued run starts after validation happened in the receiver.
                | (Received, Classified)
                | (Validated, FilteredOut)
                | (Validated, Classified)
                | (FilteredOut, BadRequest)
                | (Classified, Labeled)
                | (Classified, Skipped)
                | (Labeled, Done)
                | (Skipped, Done)
        )
    }
}

impl std::fmt::Display for TriageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "RECEIVED",
            Self::Validated => "VALIDATED",
            Self::FilteredOut => "FILTERED_OUT",
            Self::Classified => "CLASSIFIED",
            Self::Labeled => "LABELED",
            Self::Skipped => "SKIPPED",
            Self::Done => "DONE",
            Self::Rejected => "REJECTED",
            Self::BadRequest => "BAD_REQUEST",
        };
        f.write_str(name)
    }
}

/// Result of one completed triage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageOutcome {
    pub run_id: TriageRunId,
    pub owner: RepoOwner,
    pub repo: RepoName,
    pub issue_number: IssueNumber,
    pub labeled: bool,
    pub score: ClassificationScore,
    /// Upstream failure message when the label call was attempted and failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_error: Option<String>,
}
