//! LabelCat triage orchestration.
//!
//! This crate provides [`TriageExecutor`], which drives one event through the
//! webhook-triage pipeline: signature validation, event filtering,
//! classification, and conditional label application.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor sequences calls between the domain
//! rules in the [`pipeline`] crate and the infrastructure ports
//! ([`pipeline::Classifier`], [`pipeline::IssueTracker`]). It contains no
//! domain rules of its own and holds no mutable state, so independent runs may
//! execute concurrently on a shared executor.

pub mod executor;

pub use executor::{TriageExecutor, TriageSettings};
