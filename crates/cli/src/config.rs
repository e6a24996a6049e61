//! Runtime configuration.
//!
//! Loaded from a TOML file (`labelcat.toml` by default). Secrets may instead be
//! supplied through environment variables, which take precedence over the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LABELCAT_WEBHOOK_SECRET` | `webhook.secret` |
//! | `LABELCAT_CLASSIFIER_TOKEN` | `classifier.access_token` |
//! | `LABELCAT_GITHUB_TOKEN` | `github.token` |
//!
//! Sections are validated when converted into the settings of the component
//! that uses them, so `harvest` does not demand a webhook secret and `sign`
//! does not demand classifier settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use classifier::AutoMlConfig;
use github::GithubConfig;
use nodes::TriageSettings;
use pipeline::{
    ComputeRegion, LabelName, ModelId, ProjectId, ScoreThreshold, TriageError, WebhookSecret,
};
use serde::Deserialize;
use thiserror::Error;

/// Config file read when `--config` is not given. Its absence is not an error.
pub const DEFAULT_CONFIG_FILE: &str = "labelcat.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<TriageError> for ConfigError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::Configuration { message } => Self::Invalid(message),
            other => Self::Invalid(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub triage: TriageConfig,
    pub classifier: ClassifierConfig,
    pub github: GithubSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Classify and label before answering the webhook.
    #[default]
    Inline,
    /// Queue admitted issues and triage them on a background worker.
    Queued,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub mode: Mode,
    pub queue_capacity: usize,
    pub hook_log_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            mode: Mode::Inline,
            queue_capacity: 256,
            hook_log_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookConfig {
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    pub threshold: f64,
    pub labels: Vec<String>,
    pub call_timeout_secs: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            threshold: ScoreThreshold::default().as_f64(),
            labels: vec!["bug".to_string()],
            call_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub project_id: Option<String>,
    pub compute_region: Option<String>,
    pub model_id: Option<String>,
    pub positive_class: String,
    pub score_scale: f64,
    pub access_token: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: classifier::automl::DEFAULT_ENDPOINT.to_string(),
            project_id: None,
            compute_region: None,
            model_id: None,
            positive_class: "1".to_string(),
            score_scale: 100.0,
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSection {
    pub api_url: String,
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for GithubSection {
    fn default() -> Self {
        let defaults = GithubConfig::default();
        Self {
            api_url: defaults.api_url,
            token: defaults.token,
            user_agent: defaults.user_agent,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if present, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overrides secrets from the environment. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(secret) = non_empty("LABELCAT_WEBHOOK_SECRET") {
            self.webhook.secret = Some(secret);
        }
        if let Some(token) = non_empty("LABELCAT_CLASSIFIER_TOKEN") {
            self.classifier.access_token = Some(token);
        }
        if let Some(token) = non_empty("LABELCAT_GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
    }

    // -----------------------------------------------------------------------
    // Conversions into component settings
    // -----------------------------------------------------------------------

    pub fn webhook_secret(&self) -> Result<WebhookSecret, ConfigError> {
        self.webhook
            .secret
            .as_deref()
            .and_then(WebhookSecret::new)
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "webhook.secret (or LABELCAT_WEBHOOK_SECRET) must be set".to_string(),
                )
            })
    }

    pub fn triage_settings(&self) -> Result<TriageSettings, ConfigError> {
        let threshold = ScoreThreshold::new(self.triage.threshold).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "triage.threshold must be finite, got {}",
                self.triage.threshold
            ))
        })?;
        let labels = self
            .triage
            .labels
            .iter()
            .map(|l| {
                LabelName::new(l.as_str())
                    .ok_or_else(|| ConfigError::Invalid("triage.labels contains an empty label".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TriageSettings::new(
            self.webhook_secret()?,
            threshold,
            labels,
            Duration::from_secs(self.triage.call_timeout_secs),
        )?)
    }

    pub fn automl_config(&self) -> Result<AutoMlConfig, ConfigError> {
        let c = &self.classifier;
        let missing = |field: &str| ConfigError::Invalid(format!("classifier.{field} must be set"));

        if !c.score_scale.is_finite() || c.score_scale <= 0.0 {
            return Err(ConfigError::Invalid(
                "classifier.score_scale must be a positive number".to_string(),
            ));
        }

        Ok(AutoMlConfig {
            endpoint: c.endpoint.clone(),
            project_id: c
                .project_id
                .as_deref()
                .and_then(ProjectId::new)
                .ok_or_else(|| missing("project_id"))?,
            compute_region: c
                .compute_region
                .as_deref()
                .and_then(ComputeRegion::new)
                .ok_or_else(|| missing("compute_region"))?,
            model_id: c
                .model_id
                .as_deref()
                .and_then(ModelId::new)
                .ok_or_else(|| missing("model_id"))?,
            positive_class: c.positive_class.clone(),
            score_scale: c.score_scale,
            access_token: c.access_token.clone(),
        })
    }

    /// GitHub requests share the triage call timeout, so harvesting is
    /// bounded the same way labeling is.
    pub fn github_config(&self) -> Result<GithubConfig, ConfigError> {
        if self.triage.call_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "triage.call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(GithubConfig {
            api_url: self.github.api_url.clone(),
            token: self.github.token.clone(),
            user_agent: self.github.user_agent.clone(),
            timeout: Duration::from_secs(self.triage.call_timeout_secs),
        })
    }

    pub fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "server.queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.server.hook_log_capacity == 0 {
            return Err(ConfigError::Invalid(
                "server.hook_log_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
