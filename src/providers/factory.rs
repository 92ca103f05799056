// Provider factory
//
// Creates the model gateway from configuration

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use super::gemini::GeminiProvider;
use super::ModelGateway;
use crate::config::ProviderSettings;

/// Create a gateway based on the provider configuration
pub fn create_gateway(settings: &ProviderSettings) -> Result<Arc<dyn ModelGateway>> {
    if settings.api_key.trim().is_empty() {
        bail!("No API key configured for provider: {}", settings.provider);
    }

    match settings.provider.as_str() {
        "gemini" => {
            let provider = GeminiProvider::with_settings(
                settings.api_key.clone(),
                settings.base_url.clone(),
                settings.model.clone(),
                Duration::from_secs(settings.timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
        _ => bail!("Unknown provider: {}", settings.provider),
    }
}
