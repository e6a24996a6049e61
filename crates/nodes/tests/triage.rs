//! End-to-end behaviour of the triage executor against recording fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nodes::{TriageExecutor, TriageSettings};
use pipeline::{
    signature, ClassificationRequest, ClassificationScore, Classifier, ClassifierError,
    IssueNumber, IssueRef, IssueTracker, LabelName, QueuedIssue, RepoName, RepoOwner,
    ScoreThreshold, TrackerError, TriageError, UpstreamService, WebhookSecret,
};

const SECRET: &str = "foo";

const ISSUE_PAYLOAD: &str = r#"{
    "action": "opened",
    "issue": {
        "number": 2,
        "title": "LABELCAT-TEST",
        "labels": [{"id": 949737505, "name": "bug", "color": "d73a4a", "default": true}],
        "state": "open",
        "body": "It looks like you accidently spelled 'commit' with two 't's."
    },
    "repository": {"name": "Hello-World", "owner": {"login": "Codertocat"}}
}"#;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

enum ClassifierBehaviour {
    Score(f64),
    Fail,
    Hang,
}

struct FakeClassifier {
    behaviour: ClassifierBehaviour,
    requests: Mutex<Vec<String>>,
}

impl FakeClassifier {
    fn new(behaviour: ClassifierBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    async fn score(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationScore, ClassifierError> {
        self.requests.lock().unwrap().push(request.text.clone());
        match self.behaviour {
            ClassifierBehaviour::Score(v) => Ok(ClassificationScore::new(v).unwrap()),
            ClassifierBehaviour::Fail => Err(ClassifierError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
            ClassifierBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                unreachable!("the executor timeout fires first")
            }
        }
    }
}

#[derive(Default)]
struct FakeTracker {
    fail: bool,
    hang: bool,
    calls: Mutex<Vec<(IssueRef, Vec<LabelName>)>>,
    attempts: AtomicUsize,
}

impl FakeTracker {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Self::default()
        })
    }

    fn calls(&self) -> Vec<(IssueRef, Vec<LabelName>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn add_labels(&self, issue: &IssueRef, labels: &[LabelName]) -> Result<(), TrackerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.fail {
            return Err(TrackerError::Status {
                status: 401,
                body: "Bad credentials".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap()
            .push((issue.clone(), labels.to_vec()));
        Ok(())
    }
}

fn executor(classifier: Arc<FakeClassifier>, tracker: Arc<FakeTracker>) -> TriageExecutor {
    let settings = TriageSettings::new(
        WebhookSecret::new(SECRET).unwrap(),
        ScoreThreshold::new(70.0).unwrap(),
        vec![LabelName::new("bug").unwrap()],
        Duration::from_millis(200),
    )
    .unwrap();
    TriageExecutor::new(classifier, tracker, settings)
}

fn signed(body: &str) -> String {
    signature::sign(&WebhookSecret::new(SECRET).unwrap(), body.as_bytes())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn high_score_labels_the_issue_once() {
    let classifier = FakeClassifier::new(ClassifierBehaviour::Score(90.0));
    let tracker = FakeTracker::ok();
    let exec = executor(classifier.clone(), tracker.clone());

    let outcome = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap();

    assert!(outcome.labeled);
    assert_eq!(outcome.issue_number, IssueNumber::new(2));
    assert_eq!(outcome.owner.as_str(), "Codertocat");
    assert_eq!(outcome.repo.as_str(), "Hello-World");

    let calls = tracker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.to_string(), "Codertocat/Hello-World#2");
    assert_eq!(calls[0].1, vec![LabelName::new("bug").unwrap()]);

    let texts = classifier.requests.lock().unwrap().clone();
    assert_eq!(
        texts,
        vec!["LABELCAT-TEST It looks like you accidently spelled 'commit' with two 't's.".to_string()]
    );
}

#[tokio::test]
async fn low_score_skips_labeling() {
    let tracker = FakeTracker::ok();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Score(50.0)), tracker.clone());

    let outcome = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap();

    assert!(!outcome.labeled);
    assert_eq!(outcome.issue_number, IssueNumber::new(2));
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn score_equal_to_threshold_is_not_a_match() {
    let tracker = FakeTracker::ok();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Score(70.0)), tracker.clone());

    let outcome = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap();

    assert!(!outcome.labeled);
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_signature_is_rejected_before_any_call() {
    let classifier = FakeClassifier::new(ClassifierBehaviour::Score(90.0));
    let tracker = FakeTracker::ok();
    let exec = executor(classifier.clone(), tracker.clone());

    let err = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some("foo"))
        .await
        .unwrap_err();

    assert!(matches!(err, TriageError::Authorization));
    assert_eq!(classifier.calls(), 0);
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let exec = executor(
        FakeClassifier::new(ClassifierBehaviour::Score(90.0)),
        FakeTracker::ok(),
    );
    let err = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::Authorization));
}

#[tokio::test]
async fn non_opened_actions_are_bad_requests_without_calls() {
    for action in ["closed", "edited", "labeled", "reopened"] {
        let classifier = FakeClassifier::new(ClassifierBehaviour::Score(90.0));
        let tracker = FakeTracker::ok();
        let exec = executor(classifier.clone(), tracker.clone());

        let body = ISSUE_PAYLOAD.replace("\"opened\"", &format!("\"{action}\""));
        let err = exec
            .handle_webhook(body.as_bytes(), Some(&signed(&body)))
            .await
            .unwrap_err();

        assert!(
            matches!(&err, TriageError::BadRequest { reason } if reason.contains(action)),
            "unexpected error for {action}: {err:?}"
        );
        assert_eq!(classifier.calls(), 0);
        assert_eq!(tracker.attempts.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn signed_but_malformed_body_is_a_bad_request() {
    let exec = executor(
        FakeClassifier::new(ClassifierBehaviour::Score(90.0)),
        FakeTracker::ok(),
    );
    let body = "{\"action\": \"opened\"";
    let err = exec
        .handle_webhook(body.as_bytes(), Some(&signed(body)))
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::BadRequest { .. }));
}

#[tokio::test]
async fn classifier_failure_is_distinct_from_no_match() {
    let tracker = FakeTracker::ok();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Fail), tracker.clone());

    let err = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap_err();

    match err {
        TriageError::UpstreamService {
            service,
            issue_number,
            ..
        } => {
            assert_eq!(service, UpstreamService::Classifier);
            assert_eq!(issue_number, IssueNumber::new(2));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn classifier_timeout_fails_the_run() {
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Hang), FakeTracker::ok());

    let err = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, TriageError::UpstreamService { message, .. } if message.contains("timed out"))
    );
}

#[tokio::test]
async fn label_failure_completes_with_labeled_false() {
    let tracker = FakeTracker::failing();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Score(95.0)), tracker.clone());

    let outcome = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap();

    assert!(!outcome.labeled);
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 1);
    assert!(outcome.label_error.unwrap().contains("401"));
}

#[tokio::test]
async fn label_timeout_completes_with_labeled_false() {
    let tracker = FakeTracker::hanging();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Score(95.0)), tracker.clone());

    let outcome = exec
        .handle_webhook(ISSUE_PAYLOAD.as_bytes(), Some(&signed(ISSUE_PAYLOAD)))
        .await
        .unwrap();

    assert!(!outcome.labeled);
    assert_eq!(tracker.attempts.load(Ordering::SeqCst), 1);
    assert!(tracker.calls().is_empty());
    assert!(outcome.label_error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn queued_issue_triages_without_signature() {
    let tracker = FakeTracker::ok();
    let exec = executor(FakeClassifier::new(ClassifierBehaviour::Score(90.0)), tracker.clone());

    let message = QueuedIssue {
        owner: RepoOwner::new("GoogleCloudPlatform").unwrap(),
        repo: RepoName::new("labelcat").unwrap(),
        number: IssueNumber::new(22),
        text: "some issue information".to_string(),
    };
    let outcome = exec.triage(&message).await.unwrap();

    assert!(outcome.labeled);
    assert_eq!(outcome.issue_number, IssueNumber::new(22));
    assert_eq!(tracker.calls()[0].0.to_string(), "GoogleCloudPlatform/labelcat#22");
}

#[test]
fn settings_reject_empty_labels_and_zero_timeout() {
    let secret = WebhookSecret::new(SECRET).unwrap();
    let threshold = ScoreThreshold::default();
    assert!(matches!(
        TriageSettings::new(secret.clone(), threshold, Vec::new(), Duration::from_secs(1)),
        Err(TriageError::Configuration { .. })
    ));
    assert!(matches!(
        TriageSettings::new(
            secret,
            threshold,
            vec![LabelName::new("bug").unwrap()],
            Duration::ZERO
        ),
        Err(TriageError::Configuration { .. })
    ));
}
