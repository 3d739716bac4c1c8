use std::{sync::Arc, time::Duration};

use tokio::task;
use tracing::{debug, error, info, warn};

use crate::{
    artifact::{GeneratedImage, GenerationMetadata},
    clock::{Clock, SystemClock},
    config::{AppConfig, DEFAULT_MODEL_ID},
    error::GenerationError,
    inference::{GenerationRequest, InferenceBackend, InferenceParameters},
    retry::RetryPolicy,
};

/// Turns a prompt into one decoded image, retrying transient timeouts and
/// discarding results that arrive after the caller's budget.
///
/// Holds no per-call state; one instance can serve concurrent requests.
pub struct GenerationGateway {
    backend: Arc<dyn InferenceBackend>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    model_id: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Default)]
struct RetryState {
    attempts: u32,
}

impl GenerationGateway {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            parameters: InferenceParameters::default(),
        }
    }

    pub fn from_config(config: &AppConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self::new(backend)
            .with_retry_policy(config.retry)
            .with_model(config.model_id.clone())
            .with_parameters(InferenceParameters {
                num_inference_steps: config.num_inference_steps,
                guidance_scale: config.guidance_scale,
            })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_parameters(mut self, parameters: InferenceParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn parameters(&self) -> InferenceParameters {
        self.parameters
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Generates one image for `prompt`.
    ///
    /// The prompt is passed through as-is; callers reject empty prompts.
    /// `timeout_seconds` is checked only once the service has answered, so a
    /// late success is dropped as [`GenerationError::BudgetExceeded`].
    #[tracing::instrument(skip(self, prompt), fields(backend = self.backend.name(), prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        timeout_seconds: u64,
    ) -> Result<GeneratedImage, GenerationError> {
        let start = self.clock.now();
        let budget = Duration::from_secs(timeout_seconds);
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            timeout_seconds,
            model_id: self.model_id.clone(),
            parameters: self.parameters,
        };

        let mut state = RetryState::default();
        let bytes = loop {
            state.attempts += 1;
            match self.backend.text_to_image(&request).await {
                Ok(bytes) => break bytes,
                Err(err) if err.is_transient() => {
                    if !self.retry.has_attempts_left(state.attempts) {
                        warn!(attempts = state.attempts, "maximum retries reached");
                        return Err(GenerationError::RetryExhausted {
                            attempts: state.attempts,
                        });
                    }
                    let delay = self.retry.delay_before(state.attempts);
                    warn!(
                        attempt = state.attempts,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "inference timed out, retrying"
                    );
                    self.clock.sleep(delay).await;
                }
                Err(err) => {
                    error!(error = %err, "error generating image");
                    return Err(err.into());
                }
            }
        };

        let metadata = GenerationMetadata {
            model: self.model_id.clone(),
            attempts: state.attempts,
            elapsed_ms: 0,
        };
        let mut image = task::spawn_blocking(move || GeneratedImage::decode(&bytes, metadata))
            .await
            .map_err(|err| GenerationError::Generic(format!("decode task failed: {err}")))?
            .map_err(|err| {
                error!(error = %err, "error generating image");
                GenerationError::from(err)
            })?;

        let elapsed = self.clock.now().saturating_duration_since(start);
        if elapsed > budget {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_secs = timeout_seconds,
                "image arrived after budget, discarding"
            );
            return Err(GenerationError::BudgetExceeded { elapsed, budget });
        }

        image.metadata.elapsed_ms = elapsed.as_millis();
        info!(
            attempts = state.attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "image generated"
        );
        Ok(image)
    }

    /// Same as [`generate`](Self::generate) with every failure collapsed to
    /// `None`.
    pub async fn generate_or_absent(
        &self,
        prompt: &str,
        timeout_seconds: u64,
    ) -> Option<GeneratedImage> {
        match self.generate(prompt, timeout_seconds).await {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(kind = err.kind(), error = %err, "returning no image");
                None
            }
        }
    }
}
