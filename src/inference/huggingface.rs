//! Hugging Face hosted inference API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header};

use crate::{
    config::{AppConfig, DEFAULT_INFERENCE_BASE_URL},
    error::InferenceError,
    inference::{
        GenerationRequest, InferenceBackend,
        types::{ApiErrorBody, TextToImagePayload},
    },
};

#[derive(Debug, Clone)]
pub struct HuggingFaceClientBuilder {
    api_token: Option<String>,
    base_url: String,
    request_timeout: Duration,
}

impl Default for HuggingFaceClientBuilder {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl HuggingFaceClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-attempt limit; expiry surfaces as [`InferenceError::Timeout`].
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HuggingFaceClient, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;

        Ok(HuggingFaceClient {
            client,
            api_token: self.api_token,
            base_url: self.base_url,
        })
    }
}

pub struct HuggingFaceClient {
    client: reqwest::Client,
    api_token: Option<String>,
    base_url: String,
}

impl HuggingFaceClient {
    pub fn builder() -> HuggingFaceClientBuilder {
        HuggingFaceClientBuilder::new()
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, InferenceError> {
        Self::builder()
            .api_token(config.api_token.clone())
            .base_url(config.inference_base_url.clone())
            .request_timeout(config.request_timeout)
            .build()
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/{}", self.base_url, model_id)
    }
}

#[async_trait]
impl InferenceBackend for HuggingFaceClient {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<Vec<u8>, InferenceError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(InferenceError::MissingCredential)?;

        let payload = TextToImagePayload {
            inputs: &request.prompt,
            parameters: &request.parameters,
        };

        let response = self
            .client
            .post(self.endpoint(&request.model_id))
            .bearer_auth(token)
            .header(header::ACCEPT, "image/png")
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let bytes = response.bytes().await.map_err(classify_transport)?;
        tracing::debug!(size = bytes.len(), model = %request.model_id, "received image bytes");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

fn classify_transport(err: reqwest::Error) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Network(err)
    }
}

fn classify_status(status: StatusCode, body: &str) -> InferenceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => InferenceError::Timeout,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InferenceError::Auth(message),
        _ => InferenceError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
