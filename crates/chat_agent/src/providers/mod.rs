use std::sync::Arc;

use agent_provider::{ChatProvider, ProviderInitError};
use agent_provider_mock::MockProvider;
use agent_provider_openai::{OpenAiProvider, OpenAiProviderConfig};
use tracing::debug;

use crate::config::{AppConfig, ProviderKind};

pub fn provider_from_config(config: &AppConfig) -> Result<Arc<dyn ChatProvider>, ProviderInitError> {
    debug!(provider = config.provider.as_str(), model = %config.model, "selecting provider");

    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockProvider::with_models(
            Vec::new(),
            config.models.clone(),
        ))),
        ProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| ProviderInitError::new("OPENAI_API_KEY is not set"))?;

            let mut provider_config = OpenAiProviderConfig::new(api_key, config.models.clone());
            if let Some(base_url) = config.base_url.as_deref() {
                provider_config = provider_config.with_base_url(base_url);
            }
            if let Some(timeout) = config.timeout {
                provider_config = provider_config.with_timeout(timeout);
            }

            Ok(Arc::new(OpenAiProvider::new(provider_config)?))
        }
    }
}
