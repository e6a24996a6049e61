//! AutoML Natural Language `predict` client.
//!
//! Request:
//!
//! ```text
//! POST {endpoint}/v1/projects/{project}/locations/{region}/models/{model}:predict
//! {"payload": {"textSnippet": {"content": "...", "mimeType": "text/plain"}}}
//! ```
//!
//! The response lists one annotation per class. The score of the configured
//! positive class, multiplied by `score_scale`, is returned to the pipeline.

use async_trait::async_trait;
use pipeline::{
    ClassificationRequest, ClassificationScore, Classifier, ClassifierError, ComputeRegion,
    ModelId, ProjectId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default public endpoint of the prediction service.
pub const DEFAULT_ENDPOINT: &str = "https://automl.googleapis.com";

/// Connection settings for one deployed model.
#[derive(Debug, Clone)]
pub struct AutoMlConfig {
    /// Base URL, without a trailing slash.
    pub endpoint: String,
    pub project_id: ProjectId,
    pub compute_region: ComputeRegion,
    pub model_id: ModelId,
    /// `displayName` of the class whose score decides the match.
    pub positive_class: String,
    /// Multiplier applied to the service's `[0, 1]` score.
    pub score_scale: f64,
    /// OAuth bearer token. Omitted when the endpoint needs no auth (tests).
    pub access_token: Option<String>,
}

impl AutoMlConfig {
    fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/models/{}:predict",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.compute_region,
            self.model_id
        )
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    payload: ExamplePayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExamplePayload<'a> {
    text_snippet: TextSnippet<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextSnippet<'a> {
    content: &'a str,
    mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    payload: Vec<AnnotationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationPayload {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    classification: Option<ClassificationAnnotation>,
}

#[derive(Debug, Deserialize)]
struct ClassificationAnnotation {
    // Zero scores are omitted from proto3 JSON.
    #[serde(default)]
    score: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// [`Classifier`] backed by a deployed AutoML text model.
pub struct AutoMlClassifier {
    http: reqwest::Client,
    config: AutoMlConfig,
}

impl AutoMlClassifier {
    pub fn new(config: AutoMlConfig) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("labelcat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn extract_score(&self, response: PredictResponse) -> Result<ClassificationScore, ClassifierError> {
        let annotation = response
            .payload
            .into_iter()
            .find(|p| p.display_name == self.config.positive_class)
            .ok_or_else(|| {
                ClassifierError::MalformedResponse(format!(
                    "no annotation for class '{}'",
                    self.config.positive_class
                ))
            })?;
        let raw = annotation
            .classification
            .ok_or_else(|| {
                ClassifierError::MalformedResponse("annotation has no classification".to_string())
            })?
            .score;
        ClassificationScore::new(raw * self.config.score_scale).ok_or_else(|| {
            ClassifierError::MalformedResponse(format!("score {raw} is not finite"))
        })
    }
}

#[async_trait]
impl Classifier for AutoMlClassifier {
    #[instrument(name = "classifier.predict", skip_all, fields(model = %self.config.model_id))]
    async fn score(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationScore, ClassifierError> {
        let body = PredictRequest {
            payload: ExamplePayload {
                text_snippet: TextSnippet {
                    content: &request.text,
                    mime_type: "text/plain",
                },
            },
        };

        let mut call = self.http.post(self.config.predict_url()).json(&body);
        if let Some(token) = &self.config.access_token {
            call = call.bearer_auth(token);
        }

        let response = call
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        let score = self.extract_score(parsed)?;
        debug!(%score, "prediction received");
        Ok(score)
    }
}
