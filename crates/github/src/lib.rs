//! LabelCat GitHub infrastructure adapter.
//!
//! Implements the [`pipeline::IssueTracker`] trait (label application) and the
//! issue harvester used by the batch CLI, both over the GitHub REST API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication headers, pagination, status
//! handling) are handled here; the [`pipeline`] crate never sees them.

pub mod client;
pub mod harvest;
pub mod labels;

pub use client::{GithubClient, GithubConfig, GithubError, DEFAULT_TIMEOUT};
pub use harvest::{HarvestedIssue, IssuePage, IssuePages, PER_PAGE};
