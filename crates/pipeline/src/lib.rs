//! Core triage domain for LabelCat.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the webhook-triage pipeline, together with the
//! two pure pipeline stages (signature validation and event filtering) and the
//! port traits the infrastructure crates implement.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network I/O.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueNumber`, `RepoOwner`, `TriageRunId`, etc.) |
//! | [`types`] | Value types (`ClassificationScore`, `ScoreThreshold`, `RepositoryRef`, etc.) |
//! | [`signature`] | HMAC-SHA1 webhook signature validator |
//! | [`event`] | Webhook payload model and event filter |
//! | [`classification`] | `Classifier` port and threshold decision rule |
//! | [`tracker`] | `IssueTracker` port used to apply labels |
//! | [`message`] | Queue message for asynchronous triage |
//! | [`outcome`] | Run state machine and `TriageOutcome` |
//! | [`errors`] | Top-level error taxonomy |

pub mod classification;
pub mod errors;
pub mod event;
pub mod identifiers;
pub mod message;
pub mod outcome;
pub mod signature;
pub mod tracker;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use classification::{
    decide, ClassificationRequest, ClassificationResult, Classifier, ClassifierError,
};
pub use errors::{TriageError, UpstreamService};
pub use event::{filter_event, AdmittedIssue, EventRejection, IncomingEvent};
pub use identifiers::{
    ComputeRegion, IssueNumber, LabelName, ModelId, ProjectId, RepoName, RepoOwner, TriageRunId,
};
pub use message::QueuedIssue;
pub use outcome::{TriageOutcome, TriageState};
pub use signature::{WebhookSecret, SIGNATURE_HEADER};
pub use tracker::{IssueTracker, TrackerError};
pub use types::{
    ClassificationScore, InvalidRepositoryRef, IssueRef, RepositoryRef, ScoreThreshold, Timestamp,
};
