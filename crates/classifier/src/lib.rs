//! LabelCat text-classification adapter.
//!
//! Implements the [`pipeline::Classifier`] trait for a hosted AutoML Natural
//! Language model. Other providers are added as new `impl` blocks in this
//! crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, and response
//! parsing live here. The [`pipeline`] crate sees only
//! [`pipeline::Classifier`] and a [`pipeline::ClassificationScore`]; the
//! threshold decision is made there, not here.

pub mod automl;

pub use automl::{AutoMlClassifier, AutoMlConfig};
