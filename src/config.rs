use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::retry::{Backoff, RetryPolicy};

pub const DEFAULT_MODEL_ID: &str = "stabilityai/stable-diffusion-xl-base-1.0";
pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const API_TOKEN_VAR: &str = "HUGGINGFACEHUB_API_TOKEN";

#[derive(Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_token: Option<String>,
    pub inference_base_url: String,
    pub model_id: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub default_timeout_secs: u64,
    pub min_timeout_secs: u64,
    pub max_timeout_secs: u64,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

// The token is deliberately left out of debug output.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen_addr", &self.listen_addr)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("inference_base_url", &self.inference_base_url)
            .field("model_id", &self.model_id)
            .field("num_inference_steps", &self.num_inference_steps)
            .field("guidance_scale", &self.guidance_scale)
            .field("default_timeout_secs", &self.default_timeout_secs)
            .field("min_timeout_secs", &self.min_timeout_secs)
            .field("max_timeout_secs", &self.max_timeout_secs)
            .field("retry", &self.retry)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            api_token: None,
            inference_base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            num_inference_steps: 20,
            guidance_scale: 7.5,
            default_timeout_secs: 60,
            min_timeout_secs: 30,
            max_timeout_secs: 120,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// A missing API token is not an error here; the inference client
    /// reports it when the first call is attempted.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let parse_var = |name: &str| lookup(name).map(|v| v.trim().to_string());

        let listen_addr = parse_var("SERVER_ADDR")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.listen_addr);

        let api_token = lookup(API_TOKEN_VAR).filter(|v| !v.trim().is_empty());
        let inference_base_url = lookup("INFERENCE_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.inference_base_url);
        let model_id = lookup("MODEL_ID").unwrap_or(defaults.model_id);

        let num_inference_steps: u32 = parse_var("NUM_INFERENCE_STEPS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.num_inference_steps);
        if num_inference_steps == 0 {
            anyhow::bail!("NUM_INFERENCE_STEPS must be positive");
        }
        let guidance_scale: f64 = parse_var("GUIDANCE_SCALE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.guidance_scale);
        if !(guidance_scale.is_finite() && guidance_scale > 0.0) {
            anyhow::bail!("GUIDANCE_SCALE must be a positive number, got {guidance_scale}");
        }

        let secs = |name: &str, fallback: u64| -> u64 {
            parse_var(name)
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        let default_timeout_secs = secs("DEFAULT_TIMEOUT_SECS", defaults.default_timeout_secs);
        let min_timeout_secs = secs("MIN_TIMEOUT_SECS", defaults.min_timeout_secs);
        let max_timeout_secs = secs("MAX_TIMEOUT_SECS", defaults.max_timeout_secs);
        if min_timeout_secs == 0 || min_timeout_secs > max_timeout_secs {
            anyhow::bail!(
                "invalid timeout bounds: min {min_timeout_secs}s, max {max_timeout_secs}s"
            );
        }
        if !(min_timeout_secs..=max_timeout_secs).contains(&default_timeout_secs) {
            anyhow::bail!(
                "default timeout {default_timeout_secs}s outside [{min_timeout_secs}, {max_timeout_secs}]"
            );
        }

        let max_attempts: u32 = parse_var("RETRY_MAX_ATTEMPTS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.retry.max_attempts);
        let retry_delay = parse_var("RETRY_DELAY_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| defaults.retry.delay_before(1));
        let backoff = match parse_var("RETRY_BACKOFF").as_deref() {
            Some("exponential") => Backoff::exponential(retry_delay),
            Some("fixed") | None => Backoff::Fixed(retry_delay),
            Some(other) => anyhow::bail!("unknown RETRY_BACKOFF value: {other}"),
        };
        let retry = RetryPolicy::new(max_attempts, backoff);

        let request_timeout = parse_var("INFERENCE_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            listen_addr,
            api_token,
            inference_base_url,
            model_id,
            num_inference_steps,
            guidance_scale,
            default_timeout_secs,
            min_timeout_secs,
            max_timeout_secs,
            retry,
            request_timeout,
        })
    }

    pub fn timeout_in_range(&self, timeout_secs: u64) -> bool {
        (self.min_timeout_secs..=self.max_timeout_secs).contains(&timeout_secs)
    }
}
