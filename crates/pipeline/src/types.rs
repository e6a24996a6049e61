//! Shared value types for the triage domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (scores are finite, repository references
//! always have both halves) and participate in domain computations.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IssueNumber, RepoName, RepoOwner};

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// A confidence score returned by the classifier.
///
/// Expressed on the scale the threshold is configured in (0–100 by default,
/// after the classifier adapter applies its score scale).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationScore(f64);

impl ClassificationScore {
    /// Creates a [`ClassificationScore`], returning `None` if `value` is
    /// infinite or NaN.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the score as an `f64`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for ClassificationScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// The score a prediction must strictly exceed to count as a match.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreThreshold(f64);

impl ScoreThreshold {
    /// Creates a [`ScoreThreshold`], returning `None` if `value` is infinite or NaN.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the threshold as an `f64`.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns `true` if `score` is strictly greater than this threshold.
    pub fn is_exceeded_by(self, score: ClassificationScore) -> bool {
        score.as_f64() > self.0
    }
}

impl Default for ScoreThreshold {
    fn default() -> Self {
        Self(70.0)
    }
}

impl std::fmt::Display for ScoreThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Repository and issue references
// ---------------------------------------------------------------------------

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: RepoOwner,
    pub name: RepoName,
}

impl RepositoryRef {
    pub fn new(owner: RepoOwner, name: RepoName) -> Self {
        Self { owner, name }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Error returned when parsing a repository reference that is not `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected 'owner/repo', got '{0}'")]
pub struct InvalidRepositoryRef(pub String);

impl FromStr for RepositoryRef {
    type Err = InvalidRepositoryRef;

    /// Parses `owner/repo`, tolerating a leading `/` and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('/');
        let mut parts = trimmed.split('/');
        let owner = parts.next().and_then(RepoOwner::new);
        let name = parts.next().and_then(RepoName::new);
        match (owner, name, parts.next()) {
            (Some(owner), Some(name), None) => Ok(Self { owner, name }),
            _ => Err(InvalidRepositoryRef(s.to_string())),
        }
    }
}

/// A single issue within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub repository: RepositoryRef,
    pub number: IssueNumber,
}

impl std::fmt::Display for IssueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        let threshold = ScoreThreshold::new(70.0).unwrap();
        assert!(threshold.is_exceeded_by(ClassificationScore::new(90.0).unwrap()));
        assert!(!threshold.is_exceeded_by(ClassificationScore::new(70.0).unwrap()));
        assert!(!threshold.is_exceeded_by(ClassificationScore::new(50.0).unwrap()));
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        assert!(ClassificationScore::new(f64::NAN).is_none());
        assert!(ScoreThreshold::new(f64::INFINITY).is_none());
    }

    #[test]
    fn repository_ref_parses_owner_and_name() {
        let repo: RepositoryRef = " /GoogleCloudPlatform/LabelCat ".parse().unwrap();
        assert_eq!(repo.owner.as_str(), "GoogleCloudPlatform");
        assert_eq!(repo.name.as_str(), "LabelCat");
        assert_eq!(repo.to_string(), "GoogleCloudPlatform/LabelCat");
    }

    #[test]
    fn repository_ref_rejects_bad_shapes() {
        assert!("LabelCat".parse::<RepositoryRef>().is_err());
        assert!("a/b/c".parse::<RepositoryRef>().is_err());
        assert!("owner/".parse::<RepositoryRef>().is_err());
    }
}
