// Text-generation provider support
//
// The services only see the `ModelGateway` trait: a prompt goes in, the
// provider's raw candidate list comes out. Parsing the candidates is left
// to the `parser` module.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;

// Provider implementations
pub mod gemini;

// Provider factory
pub mod factory;

// Re-export commonly used types
pub use factory::create_gateway;
pub use gemini::GeminiProvider;
pub use types::{Candidate, Content, GenerateRequest, GenerateResponse, GenerationConfig, Part};

/// Trait for text-generation backends
///
/// Implementations make exactly one request per call. Retries, if any,
/// belong to whoever calls the gateway.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send a prompt and return the provider's raw response
    ///
    /// Network errors and non-success statuses are returned as errors.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerateResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Get the model this gateway addresses
    fn model(&self) -> &str;
}
