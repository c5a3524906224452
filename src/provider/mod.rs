//! Image-generation provider seam.
//!
//! Providers classify their own failures into [`ProviderOutcome`] so callers
//! never need to inspect error text.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;

pub use gemini::GeminiProvider;
pub use mock::ScriptedProvider;

/// Aspect ratio requested for try-on composites.
pub const TRYON_ASPECT_RATIO: &str = "3:4";

#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub label: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub instructions: String,
    pub images: Vec<LabeledImage>,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Success(Vec<u8>),
    /// Quota, rate limit or timeout; a later request may succeed.
    Retryable(String),
    Fatal(String),
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Run one generation attempt. Never retries internally.
    async fn generate(&self, request: &ProviderRequest) -> ProviderOutcome;

    /// Model name recorded on generation records.
    fn model(&self) -> &str;
}

/// Stand-in when no provider credentials are configured.
#[derive(Debug, Default, Clone)]
pub struct DisabledProvider;

#[async_trait]
impl ImageProvider for DisabledProvider {
    async fn generate(&self, _request: &ProviderRequest) -> ProviderOutcome {
        ProviderOutcome::Fatal("image provider is not configured".to_string())
    }

    fn model(&self) -> &str {
        "disabled"
    }
}
