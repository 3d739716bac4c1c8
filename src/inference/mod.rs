mod backend;
mod huggingface;
mod types;

pub use backend::InferenceBackend;
pub use huggingface::{HuggingFaceClient, HuggingFaceClientBuilder};
pub use types::{GenerateBody, GenerateResponse, GenerationRequest, InferenceParameters};
