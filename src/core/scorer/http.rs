//! Blocking HTTP client for the classification service.

use super::{FrameScorer, LabelScore};
use crate::error::ScoreError;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;

/// Body returned by the classification service
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub labels: Vec<LabelScore>,
}

/// Uploads each frame as a multipart `image` field and reads back the
/// ranked labels.
#[derive(Debug, Clone)]
pub struct HttpScorer {
    url: String,
    http: Client,
}

impl HttpScorer {
    /// Default request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(url: impl Into<String>) -> Result<Self, ScoreError> {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ScoreError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }

    /// The service endpoint frames are posted to
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FrameScorer for HttpScorer {
    fn score(&self, file_name: &str, image: Vec<u8>) -> Result<Vec<LabelScore>, ScoreError> {
        let part = multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")?;
        let form = multipart::Form::new().part("image", part);

        let response = self.http.post(&self.url).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ScoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes()?;
        parse_labels(&body)
    }
}

/// Parse a service response body into its ranked labels.
pub fn parse_labels(body: &[u8]) -> Result<Vec<LabelScore>, ScoreError> {
    let response: ScoreResponse = serde_json::from_slice(body)
        .map_err(|e| ScoreError::MalformedResponse(e.to_string()))?;

    if response.labels.is_empty() {
        return Err(ScoreError::EmptyLabels);
    }

    Ok(response.labels)
}
