//! OpenAI-backed implementation of the shared `agent_provider` contract.
//!
//! Bridges the async `openai_api` client into the blocking
//! [`ChatProvider::complete`] call used by the chat session loop.

use std::sync::Arc;
use std::time::Duration;

use agent_provider::{
    ChatMessage, ChatProvider, ChatRole, CompletionRequest, ProviderError, ProviderInitError,
    ProviderProfile,
};
use openai_api::{
    ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse, OpenAiApiClient,
    OpenAiApiConfig, OpenAiApiError,
};
use tracing::debug;

/// Stable provider identifier used by startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// Runtime configuration for the OpenAI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    /// Offered models; the first entry is the default.
    pub model_ids: Vec<String>,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_ids: Vec<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_ids,
            base_url: None,
            organization: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> OpenAiApiConfig {
        let mut config = OpenAiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(organization) = self.organization {
            config = config.with_organization(organization);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError>;
}

#[derive(Debug)]
struct DefaultCompletionClient {
    client: OpenAiApiClient,
}

impl CompletionClient for DefaultCompletionClient {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| OpenAiApiError::RetryExhausted {
                status: None,
                last_error: Some(format!("failed to initialize tokio runtime: {error}")),
            })?;

        runtime.block_on(self.client.complete(request))
    }
}

/// `ChatProvider` adapter backed by `openai_api` transport primitives.
pub struct OpenAiProvider {
    model_ids: Vec<String>,
    client: Arc<dyn CompletionClient>,
}

impl OpenAiProvider {
    /// Creates a provider using real HTTP transport.
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderInitError> {
        let model_ids = sanitize_model_ids(config.model_ids.clone());
        let client = Arc::new(DefaultCompletionClient {
            client: OpenAiApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self { model_ids, client })
    }

    #[cfg(test)]
    fn with_client_for_tests(model_ids: Vec<String>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            model_ids: sanitize_model_ids(model_ids),
            client,
        }
    }
}

impl ChatProvider for OpenAiProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OPENAI_PROVIDER_ID.to_string(),
            default_model: self.model_ids[0].clone(),
        }
    }

    fn available_models(&self) -> Vec<String> {
        self.model_ids.clone()
    }

    fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ProviderError> {
        let payload = ChatCompletionRequest::new(
            request.model.clone(),
            request
                .messages
                .iter()
                .map(|message| ChatCompletionMessage::new(message.role.as_str(), &message.content))
                .collect(),
        );

        let response = self.client.complete(&payload).map_err(map_api_error)?;
        let text = response.first_text().ok_or_else(|| {
            ProviderError::InvalidResponse("first choice carried no text".to_string())
        })?;

        debug!(
            model = %request.model,
            response_model = response.model.as_deref().unwrap_or("unknown"),
            "chat completion received"
        );
        Ok(ChatMessage::new(ChatRole::Assistant, text.trim()))
    }
}

fn sanitize_model_ids(model_ids: Vec<String>) -> Vec<String> {
    let mut sanitized: Vec<String> = Vec::new();
    for value in model_ids {
        let value = value.trim().to_string();
        if !value.is_empty() && !sanitized.contains(&value) {
            sanitized.push(value);
        }
    }

    if sanitized.is_empty() {
        sanitized.push(FALLBACK_MODEL.to_string());
    }

    sanitized
}

fn map_init_error(error: OpenAiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize openai provider: {error}"))
}

fn map_api_error(error: OpenAiApiError) -> ProviderError {
    match error {
        OpenAiApiError::Status(status, message) => ProviderError::Status {
            status: status.as_u16(),
            message,
        },
        OpenAiApiError::Serde(error) => ProviderError::InvalidResponse(error.to_string()),
        OpenAiApiError::EmptyResponse => {
            ProviderError::InvalidResponse("response contained no choices".to_string())
        }
        other => ProviderError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use openai_api::StatusCode;

    use super::*;

    fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    struct FakeCompletionClient {
        observed: Mutex<Option<ChatCompletionRequest>>,
        outcome: Mutex<Option<Result<ChatCompletionResponse, OpenAiApiError>>>,
    }

    impl FakeCompletionClient {
        fn success(body: &str) -> Arc<Self> {
            let response = serde_json_response(body);
            Arc::new(Self {
                observed: Mutex::new(None),
                outcome: Mutex::new(Some(Ok(response))),
            })
        }

        fn failure(error: OpenAiApiError) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(None),
                outcome: Mutex::new(Some(Err(error))),
            })
        }

        fn observed(&self) -> Option<ChatCompletionRequest> {
            lock_unpoisoned(&self.observed).clone()
        }
    }

    impl CompletionClient for FakeCompletionClient {
        fn complete(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, OpenAiApiError> {
            *lock_unpoisoned(&self.observed) = Some(request.clone());
            lock_unpoisoned(&self.outcome)
                .take()
                .expect("fake outcome should be consumed exactly once")
        }
    }

    fn serde_json_response(body: &str) -> ChatCompletionResponse {
        serde_json::from_str(body).expect("fixture should parse")
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            "gpt-4o",
            vec![
                ChatMessage::system("be brief"),
                ChatMessage::user("hi"),
            ],
        )
    }

    #[test]
    fn profile_reports_openai_id_and_first_model() {
        let client = FakeCompletionClient::success(r#"{"choices":[]}"#);
        let provider = OpenAiProvider::with_client_for_tests(
            vec![" gpt-4o-mini ".to_string(), "gpt-4o".to_string(), "gpt-4o".to_string()],
            client,
        );

        let profile = provider.profile();
        assert_eq!(profile.provider_id, OPENAI_PROVIDER_ID);
        assert_eq!(profile.default_model, "gpt-4o-mini");
        assert_eq!(provider.available_models(), vec!["gpt-4o-mini", "gpt-4o"]);
    }

    #[test]
    fn empty_model_list_defaults_to_fallback_model() {
        let client = FakeCompletionClient::success(r#"{"choices":[]}"#);
        let provider = OpenAiProvider::with_client_for_tests(vec!["  ".to_string()], client);

        assert_eq!(provider.available_models(), vec![FALLBACK_MODEL]);
    }

    #[test]
    fn complete_forwards_roles_and_trims_reply() {
        let client = FakeCompletionClient::success(
            r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant","content":"\n  Hello!  \n"}}]}"#,
        );
        let provider =
            OpenAiProvider::with_client_for_tests(vec!["gpt-4o".to_string()], client.clone());

        let reply = provider.complete(request()).expect("reply");

        assert_eq!(reply, ChatMessage::assistant("Hello!"));
        let observed = client.observed().expect("request observed");
        assert_eq!(observed.model, "gpt-4o");
        assert_eq!(
            observed.messages,
            vec![
                ChatCompletionMessage::new("system", "be brief"),
                ChatCompletionMessage::new("user", "hi"),
            ]
        );
    }

    #[test]
    fn complete_maps_status_errors() {
        let client = FakeCompletionClient::failure(OpenAiApiError::Status(
            StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
        ));
        let provider = OpenAiProvider::with_client_for_tests(vec![], client);

        let error = provider.complete(request()).expect_err("status error");
        assert_eq!(
            error,
            ProviderError::Status {
                status: 429,
                message: "slow down".to_string(),
            }
        );
    }

    #[test]
    fn complete_maps_transport_and_shape_errors() {
        let client = FakeCompletionClient::failure(OpenAiApiError::RetryExhausted {
            status: None,
            last_error: Some("connection refused".to_string()),
        });
        let provider = OpenAiProvider::with_client_for_tests(vec![], client);
        let error = provider.complete(request()).expect_err("transport error");
        assert!(matches!(error, ProviderError::Transport(message) if message.contains("connection refused")));

        let client = FakeCompletionClient::failure(OpenAiApiError::EmptyResponse);
        let provider = OpenAiProvider::with_client_for_tests(vec![], client);
        let error = provider.complete(request()).expect_err("shape error");
        assert!(matches!(error, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn complete_rejects_choice_without_text() {
        let client = FakeCompletionClient::success(
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        );
        let provider = OpenAiProvider::with_client_for_tests(vec![], client);

        let error = provider.complete(request()).expect_err("no text");
        assert!(matches!(error, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn new_rejects_blank_api_key() {
        let error = OpenAiProvider::new(OpenAiProviderConfig::new(" ", vec![]))
            .err()
            .expect("blank key must fail");
        assert!(error.message().contains("API key is required"));
    }
}
