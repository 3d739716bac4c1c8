use async_trait::async_trait;

use crate::{error::InferenceError, inference::GenerationRequest};

/// A remote service that turns a prompt into encoded image bytes.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn text_to_image(&self, request: &GenerationRequest) -> Result<Vec<u8>, InferenceError>;

    fn name(&self) -> &str;
}
