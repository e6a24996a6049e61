//! Classification port and decision rule.
//!
//! The [`Classifier`] trait is the boundary to the hosted text-classification
//! service. Adapters return a raw [`ClassificationScore`]; the match decision is
//! made here by [`decide`] so every adapter applies the same threshold rule.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ClassificationScore, ScoreThreshold};

/// Text submitted for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub text: String,
}

impl ClassificationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The classifier's verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_match: bool,
    pub score: ClassificationScore,
}

/// Applies the decision rule `is_match = score > threshold`.
pub fn decide(score: ClassificationScore, threshold: ScoreThreshold) -> ClassificationResult {
    ClassificationResult {
        is_match: threshold.is_exceeded_by(score),
        score,
    }
}

/// Failures of the classification service.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The request never produced an HTTP response.
    #[error("classifier transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not contain a usable score.
    #[error("classifier response malformed: {0}")]
    MalformedResponse(String),

    /// The call did not complete within the configured timeout.
    #[error("classifier call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// A hosted text classifier.
///
/// Implementations perform exactly one network call per invocation and never
/// retry.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn score(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationScore, ClassifierError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: f64) -> ClassificationScore {
        ClassificationScore::new(v).unwrap()
    }

    #[test]
    fn score_above_threshold_matches() {
        let threshold = ScoreThreshold::new(70.0).unwrap();
        assert!(decide(score(90.0), threshold).is_match);
        assert!(!decide(score(70.0), threshold).is_match);
        assert!(!decide(score(50.0), threshold).is_match);
    }

    #[test]
    fn result_keeps_the_score() {
        let result = decide(score(89.5), ScoreThreshold::new(89.0).unwrap());
        assert_eq!(result.score.as_f64(), 89.5);
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["isMatch"], true);
    }
}
