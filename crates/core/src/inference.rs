//! Thin client for hosted model inference endpoints (`POST {base}/models/{model}`).
//!
//! Shared by the remote classifiers and the remote music generator. Transient
//! failures are retried here with backoff; callers see one result per call.

use crate::config::{ApiKey, InferenceConfig};
use crate::util::{is_http_retryable, retry_with_backoff, RetryConfig};
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    #[error("invalid inference url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("http error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("inference endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl InferenceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => is_http_retryable(*status),
            Self::InvalidUrl { .. } => false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Payload {
    Json(serde_json::Value),
    Binary(Bytes),
}

#[derive(Clone, Debug)]
pub struct InferenceClient {
    client: Client,
    base_url: Url,
    api_token: Option<ApiKey>,
    retry: RetryConfig,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(&config.base_url)?,
            api_token: config.api_token.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn model_url(&self, model: &str) -> Result<Url, InferenceError> {
        let path = format!("models/{}", model.trim_matches('/'));
        self.base_url
            .join(&path)
            .map_err(|source| InferenceError::InvalidUrl { url: path, source })
    }

    pub async fn post(
        &self,
        model: &str,
        payload: Payload,
        accept: Option<&str>,
    ) -> Result<Bytes, InferenceError> {
        let url = self.model_url(model)?;
        tracing::debug!(%url, "posting inference request");
        retry_with_backoff(
            &self.retry,
            || self.post_once(&url, &payload, accept),
            InferenceError::is_retryable,
        )
        .await
    }

    async fn post_once(
        &self,
        url: &Url,
        payload: &Payload,
        accept: Option<&str>,
    ) -> Result<Bytes, InferenceError> {
        let mut request = self.client.post(url.clone());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose());
        }
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        request = match payload {
            Payload::Json(value) => request.json(value),
            Payload::Binary(bytes) => request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(bytes.clone()),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_owned());
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Parse a base url so that `join` appends to its path instead of replacing
/// the last segment.
fn parse_base_url(raw: &str) -> Result<Url, InferenceError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).map_err(|source| InferenceError::InvalidUrl {
        url: trimmed.to_owned(),
        source,
    })
}
