use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceParameters {
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
}

impl Default for InferenceParameters {
    fn default() -> Self {
        Self {
            num_inference_steps: 20,
            guidance_scale: 7.5,
        }
    }
}

/// One text-to-image call as sent to a backend.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub timeout_seconds: u64,
    pub model_id: String,
    pub parameters: InferenceParameters,
}

/// JSON body accepted by `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    /// PNG data URL, usable both inline and as a download link.
    pub image: String,
    pub width: u32,
    pub height: u32,
    pub model: String,
    pub attempts: u32,
    pub elapsed_ms: u128,
}

/// Wire payload of the Hugging Face text-to-image task. The model travels
/// in the URL path.
#[derive(Debug, Serialize)]
pub(crate) struct TextToImagePayload<'a> {
    pub inputs: &'a str,
    pub parameters: &'a InferenceParameters,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: String,
}
