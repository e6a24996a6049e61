//! Webhook event model and the event filter.
//!
//! [`IncomingEvent`] mirrors the subset of GitHub's `issues` webhook payload the
//! triage pipeline reads. Unknown fields are ignored so payload additions on
//! GitHub's side never break parsing.
//!
//! [`filter_event`] turns a parsed event into an [`AdmittedIssue`] when it
//! describes a newly opened issue, and into an [`EventRejection`] otherwise.
//! Rejections are expected traffic (GitHub fires `issues` hooks for every
//! action type) and are not errors.

use serde::{Deserialize, Serialize};

use crate::{IssueNumber, IssueRef, RepoName, RepoOwner, RepositoryRef};

/// The only action that triggers triage.
pub const ACTIONABLE_ACTION: &str = "opened";

// ---------------------------------------------------------------------------
// Inbound payload
// ---------------------------------------------------------------------------

/// A GitHub `issues` webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub action: String,
    #[serde(default)]
    pub issue: Option<EventIssue>,
    pub repository: EventRepository,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventIssue {
    pub number: u64,
    pub title: String,
    /// GitHub sends `null` for issues created without a description.
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRepository {
    pub name: String,
    pub owner: EventOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOwner {
    pub login: String,
}

impl IncomingEvent {
    /// Parses an event from the raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, EventRejection> {
        serde_json::from_slice(body).map_err(|e| EventRejection::Malformed {
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Filter result
// ---------------------------------------------------------------------------

/// An event that passed the filter: a newly opened issue ready for triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmittedIssue {
    pub issue: IssueRef,
    pub title: String,
    pub body: String,
}

impl AdmittedIssue {
    /// The text submitted to the classifier: title and body joined by one space.
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// Why an event was not admitted for triage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventRejection {
    /// The action is not [`ACTIONABLE_ACTION`] or the payload has no issue.
    #[error("wrong action: '{action}'")]
    WrongAction { action: String },

    /// The body is not a valid `issues` payload.
    #[error("malformed payload: {message}")]
    Malformed { message: String },
}

/// Admits `event` for triage if it is an `opened` issue event.
pub fn filter_event(event: &IncomingEvent) -> Result<AdmittedIssue, EventRejection> {
    let wrong_action = || EventRejection::WrongAction {
        action: event.action.clone(),
    };

    if event.action != ACTIONABLE_ACTION {
        return Err(wrong_action());
    }
    let issue = event.issue.as_ref().ok_or_else(wrong_action)?;

    let owner = RepoOwner::new(event.repository.owner.login.as_str()).ok_or_else(|| {
        EventRejection::Malformed {
            message: "repository.owner.login is empty".to_string(),
        }
    })?;
    let name = RepoName::new(event.repository.name.as_str()).ok_or_else(|| {
        EventRejection::Malformed {
            message: "repository.name is empty".to_string(),
        }
    })?;

    Ok(AdmittedIssue {
        issue: IssueRef {
            repository: RepositoryRef::new(owner, name),
            number: IssueNumber::new(issue.number),
        },
        title: issue.title.clone(),
        body: issue.body.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENED: &str = r#"{
        "action": "opened",
        "issue": {
            "number": 2,
            "title": "LABELCAT-TEST",
            "labels": [{"name": "bug"}],
            "state": "open",
            "body": "It looks like you accidently spelled 'commit' with two 't's."
        },
        "repository": {"name": "Hello-World", "owner": {"login": "Codertocat"}}
    }"#;

    #[test]
    fn opened_issue_is_admitted() {
        let event = IncomingEvent::from_slice(OPENED.as_bytes()).unwrap();
        let admitted = filter_event(&event).unwrap();
        assert_eq!(admitted.issue.to_string(), "Codertocat/Hello-World#2");
        assert_eq!(
            admitted.classification_text(),
            "LABELCAT-TEST It looks like you accidently spelled 'commit' with two 't's."
        );
    }

    #[test]
    fn other_actions_are_rejected() {
        let body = OPENED.replace("\"opened\"", "\"closed\"");
        let event = IncomingEvent::from_slice(body.as_bytes()).unwrap();
        assert_eq!(
            filter_event(&event),
            Err(EventRejection::WrongAction {
                action: "closed".to_string()
            })
        );
    }

    #[test]
    fn opened_without_issue_is_rejected() {
        let body = r#"{"action":"opened","repository":{"name":"r","owner":{"login":"o"}}}"#;
        let event = IncomingEvent::from_slice(body.as_bytes()).unwrap();
        assert!(matches!(
            filter_event(&event),
            Err(EventRejection::WrongAction { .. })
        ));
    }

    #[test]
    fn null_body_becomes_empty_text() {
        let body = r#"{"action":"opened","issue":{"number":7,"title":"Crash","body":null},
                       "repository":{"name":"r","owner":{"login":"o"}}}"#;
        let event = IncomingEvent::from_slice(body.as_bytes()).unwrap();
        let admitted = filter_event(&event).unwrap();
        assert_eq!(admitted.classification_text(), "Crash ");
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            IncomingEvent::from_slice(b"{not json"),
            Err(EventRejection::Malformed { .. })
        ));
    }
}
