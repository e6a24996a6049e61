//! LabelCat trigger event source infrastructure.
//!
//! Receives GitHub webhook deliveries over HTTP and hands them to the
//! [`nodes::TriageExecutor`] in one of two delivery modes:
//!
//! - **Inline**: the handler runs the full pipeline and answers with the
//!   [`pipeline::TriageOutcome`].
//! - **Queued**: the handler validates and filters the event, publishes a
//!   [`pipeline::QueuedIssue`] to the in-process [`queue`], and answers with the
//!   message id. [`queue::run_worker`] triages messages asynchronously, which
//!   decouples webhook receipt from classifier latency.
//!
//! Every delivery is recorded in the bounded [`hook_log::HookLog`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details, status-code mapping, and message
//! encoding live here. The [`pipeline`] crate sees only its own types.

pub mod hook_log;
pub mod queue;
pub mod server;

pub use hook_log::{HookLog, HookRecord, HookStatus};
pub use queue::{run_worker, triage_queue, MessageId, QueueError, QueueReceiver, QueueSender};
pub use server::{build_router, run_server, DeliveryMode, ServerState};
