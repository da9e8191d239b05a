use std::error::Error;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::api::{ChatCompletion, ChatRequest};
use crate::core::config::Config;
use crate::core::constants::FALLBACK_FAILURE_REASON;

/// Everything that can go wrong between sending a request and holding the
/// assistant's reply text.
#[derive(Debug)]
pub enum CompletionError {
    /// The request never produced a readable response (DNS, TLS, reset...).
    Transport(reqwest::Error),

    /// The service answered with an error, optionally explaining why.
    Remote {
        status: StatusCode,
        message: Option<String>,
    },

    /// A success status whose body was not a completion payload.
    MalformedBody(serde_json::Error),

    /// A well-formed payload without any choice text.
    MissingCompletion,
}

impl CompletionError {
    /// Human-readable reason, suitable for showing inside the transcript.
    pub fn reason(&self) -> String {
        match self {
            CompletionError::Transport(err) => err.to_string(),
            CompletionError::Remote {
                message: Some(message),
                ..
            } => message.clone(),
            CompletionError::Remote { message: None, .. } => FALLBACK_FAILURE_REASON.to_string(),
            CompletionError::MalformedBody(err) => format!("Malformed response: {err}"),
            CompletionError::MissingCompletion => "No completion returned".to_string(),
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

impl Error for CompletionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CompletionError::Transport(err) => Some(err),
            CompletionError::MalformedBody(err) => Some(err),
            _ => None,
        }
    }
}

/// A single non-streaming completion call. The credential is passed per call
/// so a key saved mid-session takes effect on the next request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub title: String,
    pub referer: String,
    pub timeout: Option<Duration>,
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            title: config.title().to_string(),
            referer: config.referer().to_string(),
            timeout: config.request_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    settings: ClientSettings,
}

impl OpenRouterClient {
    pub fn new(settings: ClientSettings) -> Result<Self, CompletionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(CompletionError::Transport)?;
        Ok(Self::with_http(http, settings))
    }

    pub fn with_http(http: reqwest::Client, settings: ClientSettings) -> Self {
        Self { http, settings }
    }

    pub fn completions_url(&self) -> String {
        construct_api_url(&self.settings.base_url, "chat/completions")
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<String, CompletionError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "dispatching completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.title)
            .json(request)
            .send()
            .await
            .map_err(CompletionError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(CompletionError::Transport)?;
        debug!(%status, bytes = body.len(), "completion response received");

        parse_completion_body(status, &body)
    }
}

/// Join a base URL and an endpoint without doubling or dropping slashes.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

pub(crate) fn parse_completion_body(
    status: StatusCode,
    body: &str,
) -> Result<String, CompletionError> {
    if !status.is_success() {
        return Err(CompletionError::Remote {
            status,
            message: error_summary(body),
        });
    }

    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(CompletionError::MalformedBody)?;
    match completion.into_first_content() {
        Some(content) => Ok(content),
        // Some gateways report failures with a 200 and an error object.
        None => match error_summary(body) {
            Some(message) => Err(CompletionError::Remote {
                status,
                message: Some(message),
            }),
            None => Err(CompletionError::MissingCompletion),
        },
    }
}

fn error_summary(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
