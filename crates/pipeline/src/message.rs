//! Queue message carrying an admitted issue from the webhook receiver to the
//! triage worker.
//!
//! Wire format: `{"owner": ..., "repo": ..., "number": ..., "text": ...}` as
//! JSON. `text` is the pre-joined classification text, so the worker never
//! needs the original payload.

use serde::{Deserialize, Serialize};

use crate::{AdmittedIssue, IssueNumber, IssueRef, RepoName, RepoOwner, RepositoryRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedIssue {
    pub owner: RepoOwner,
    pub repo: RepoName,
    pub number: IssueNumber,
    pub text: String,
}

impl QueuedIssue {
    pub fn issue_ref(&self) -> IssueRef {
        IssueRef {
            repository: RepositoryRef::new(self.owner.clone(), self.repo.clone()),
            number: self.number,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl From<&AdmittedIssue> for QueuedIssue {
    fn from(admitted: &AdmittedIssue) -> Self {
        Self {
            owner: admitted.issue.repository.owner.clone(),
            repo: admitted.issue.repository.name.clone(),
            number: admitted.issue.number,
            text: admitted.classification_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_flat_fields() {
        let message = QueuedIssue {
            owner: RepoOwner::new("GoogleCloudPlatform").unwrap(),
            repo: RepoName::new("labelcat").unwrap(),
            number: IssueNumber::new(22),
            text: "some issue information".to_string(),
        };
        let json: serde_json::Value = serde_json::from_slice(&message.to_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "owner": "GoogleCloudPlatform",
                "repo": "labelcat",
                "number": 22,
                "text": "some issue information",
            })
        );
    }

    #[test]
    fn empty_owner_is_rejected_on_decode() {
        let bytes = br#"{"owner":"","repo":"r","number":1,"text":"t"}"#;
        assert!(QueuedIssue::from_bytes(bytes).is_err());
    }
}
