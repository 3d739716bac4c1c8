pub mod artifact;
pub mod clock;
pub mod config;
pub mod error;
pub mod gateway;
pub mod inference;
pub mod retry;
pub mod server;
pub mod telemetry;

pub use artifact::{DEFAULT_OUTPUT_FILE, GeneratedImage, GenerationMetadata};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use error::{GenerationError, InferenceError, ServiceError};
pub use gateway::GenerationGateway;
pub use inference::{HuggingFaceClient, InferenceBackend};
pub use retry::{Backoff, RetryPolicy};
pub use server::build_router;
