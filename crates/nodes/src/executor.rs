//! The triage step sequence for a single event.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    decide, filter_event, signature, AdmittedIssue, ClassificationRequest, Classifier,
    ClassifierError, IncomingEvent, IssueTracker, LabelName, QueuedIssue, ScoreThreshold,
    TrackerError, TriageError, TriageOutcome, TriageRunId, TriageState, UpstreamService,
    WebhookSecret,
};
use tracing::{debug, error, info, instrument, warn};

/// Immutable settings shared by every run.
#[derive(Debug, Clone)]
pub struct TriageSettings {
    secret: WebhookSecret,
    threshold: ScoreThreshold,
    labels: Vec<LabelName>,
    call_timeout: Duration,
}

impl TriageSettings {
    /// Creates settings, rejecting an empty label list or a zero timeout.
    pub fn new(
        secret: WebhookSecret,
        threshold: ScoreThreshold,
        labels: Vec<LabelName>,
        call_timeout: Duration,
    ) -> Result<Self, TriageError> {
        if labels.is_empty() {
            return Err(TriageError::Configuration {
                message: "at least one label must be configured".to_string(),
            });
        }
        if call_timeout.is_zero() {
            return Err(TriageError::Configuration {
                message: "call timeout must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            secret,
            threshold,
            labels,
            call_timeout,
        })
    }

    pub fn secret(&self) -> &WebhookSecret {
        &self.secret
    }

    pub fn threshold(&self) -> ScoreThreshold {
        self.threshold
    }

    pub fn labels(&self) -> &[LabelName] {
        &self.labels
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

/// Tracks the state of one run and records every transition on the current span.
struct RunState {
    current: TriageState,
}

impl RunState {
    fn new() -> Self {
        Self {
            current: TriageState::Received,
        }
    }

    fn advance(&mut self, next: TriageState) {
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal triage transition {} -> {}",
            self.current,
            next
        );
        debug!(from = %self.current, to = %next, "triage transition");
        self.current = next;
    }
}

/// Drives events through the triage pipeline.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
pub struct TriageExecutor {
    classifier: Arc<dyn Classifier>,
    tracker: Arc<dyn IssueTracker>,
    settings: TriageSettings,
}

impl TriageExecutor {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        tracker: Arc<dyn IssueTracker>,
        settings: TriageSettings,
    ) -> Self {
        Self {
            classifier,
            tracker,
            settings,
        }
    }

    pub fn settings(&self) -> &TriageSettings {
        &self.settings
    }

    /// Validates the signature of `body`, parses it, and admits it if it is an
    /// opened issue.
    ///
    /// Signature validation runs before parsing, so a tampered or unsigned body
    /// is always [`TriageError::Authorization`] even if it is also malformed.
    pub fn admit(&self, body: &[u8], signature: Option<&str>) -> Result<AdmittedIssue, TriageError> {
        let mut state = RunState::new();

        if !signature::validate(&self.settings.secret, body, signature) {
            state.advance(TriageState::Rejected);
            warn!("webhook signature mismatch");
            return Err(TriageError::Authorization);
        }
        state.advance(TriageState::Validated);

        let admitted = IncomingEvent::from_slice(body)
            .and_then(|event| filter_event(&event))
            .map_err(|rejection| {
                state.advance(TriageState::FilteredOut);
                state.advance(TriageState::BadRequest);
                debug!(%rejection, "event not actionable");
                TriageError::from(rejection)
            })?;

        debug!(issue = %admitted.issue, "event admitted");
        Ok(admitted)
    }

    /// Runs the full pipeline for one raw webhook delivery.
    pub async fn handle_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<TriageOutcome, TriageError> {
        let admitted = self.admit(body, signature)?;
        self.triage(&QueuedIssue::from(&admitted)).await
    }

    /// Classifies an admitted issue and labels it if the score crosses the
    /// threshold.
    ///
    /// A classifier failure ends the run with
    /// [`TriageError::UpstreamService`]. A label failure does not: the run
    /// completes with `labeled == false` and the failure in `label_error`.
    #[instrument(
        name = "triage",
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            owner = %issue.owner,
            repo = %issue.repo,
            issue_number = %issue.number,
        )
    )]
    pub async fn triage(&self, issue: &QueuedIssue) -> Result<TriageOutcome, TriageError> {
        let run_id = TriageRunId::new_random();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        // Validation and filtering happened when the issue was admitted.
        let mut state = RunState::new();

        let request = ClassificationRequest::new(issue.text.as_str());
        let score = match self.classify(&request).await {
            Ok(score) => score,
            Err(err) => {
                error!(error = %err, "classification failed");
                return Err(TriageError::UpstreamService {
                    service: UpstreamService::Classifier,
                    owner: issue.owner.clone(),
                    repo: issue.repo.clone(),
                    issue_number: issue.number,
                    message: err.to_string(),
                });
            }
        };
        state.advance(TriageState::Classified);

        let verdict = decide(score, self.settings.threshold);
        let mut outcome = TriageOutcome {
            run_id,
            owner: issue.owner.clone(),
            repo: issue.repo.clone(),
            issue_number: issue.number,
            labeled: false,
            score,
            label_error: None,
        };

        if verdict.is_match {
            match self.apply_labels(issue).await {
                Ok(()) => {
                    outcome.labeled = true;
                    state.advance(TriageState::Labeled);
                }
                Err(err) => {
                    error!(
                        service = %UpstreamService::IssueTracker,
                        error = %err,
                        "label application failed"
                    );
                    outcome.label_error = Some(err.to_string());
                    state.advance(TriageState::Skipped);
                }
            }
        } else {
            state.advance(TriageState::Skipped);
        }
        state.advance(TriageState::Done);

        info!(
            score = %score,
            threshold = %self.settings.threshold,
            labeled = outcome.labeled,
            "triage complete"
        );
        Ok(outcome)
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<pipeline::ClassificationScore, ClassifierError> {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(timeout, self.classifier.score(request))
            .await
            .map_err(|_| ClassifierError::Timeout(timeout))?
    }

    async fn apply_labels(&self, issue: &QueuedIssue) -> Result<(), TrackerError> {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(
            timeout,
            self.tracker.add_labels(&issue.issue_ref(), &self.settings.labels),
        )
        .await
        .map_err(|_| TrackerError::Timeout(timeout))?
    }
}
