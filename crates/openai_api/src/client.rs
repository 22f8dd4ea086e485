use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::OpenAiApiConfig;
use crate::error::{is_quota_message, parse_error_message, OpenAiApiError};
use crate::payload::{ChatCompletionRequest, ChatCompletionResponse};
use crate::retry::{is_retryable_http_error, retry_delay};
use crate::url::normalize_chat_completions_url;

const HEADER_ORGANIZATION: &str = "openai-organization";
const DEFAULT_USER_AGENT: &str = concat!("chatlog/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct OpenAiApiClient {
    http: Client,
    config: OpenAiApiConfig,
}

impl OpenAiApiClient {
    pub fn new(config: OpenAiApiConfig) -> Result<Self, OpenAiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(OpenAiApiError::MissingApiKey);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OpenAiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_completions_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, OpenAiApiError> {
        let mut headers = HeaderMap::new();

        let bearer = format!("Bearer {}", self.config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|_| OpenAiApiError::InvalidHeader("authorization".to_owned()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|_| OpenAiApiError::InvalidHeader("user-agent".to_owned()))?,
        );

        if let Some(organization) = self
            .config
            .organization
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            headers.insert(
                HEADER_ORGANIZATION,
                HeaderValue::from_str(organization)
                    .map_err(|_| OpenAiApiError::InvalidHeader(HEADER_ORGANIZATION.to_owned()))?,
            );
        }

        Ok(headers)
    }

    pub fn build_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::RequestBuilder, OpenAiApiError> {
        let headers = self.build_headers()?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(request))
    }

    /// Sends the request, retrying transient statuses and transport failures.
    pub async fn send_with_retry(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Response, OpenAiApiError> {
        let max_retries = self.config.max_retries;
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match self.build_request(request)?.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    last_status = Some(status);
                    let body = response.text().await.unwrap_or_else(|_| {
                        status
                            .canonical_reason()
                            .unwrap_or("request failed")
                            .to_string()
                    });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    let retryable = is_retryable_http_error(status.as_u16(), &body)
                        && !is_quota_message(&message);
                    if attempt < max_retries && retryable {
                        let delay = retry_delay(attempt, self.config.retry_base_delay_ms);
                        warn!(
                            status = status.as_u16(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying chat completion after error status"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(OpenAiApiError::Status(status, message));
                }
                Err(error) => {
                    if error.is_builder() {
                        return Err(OpenAiApiError::Request(error));
                    }
                    let message = error.to_string();
                    last_error = Some(message);
                    if attempt < max_retries {
                        let delay = retry_delay(attempt, self.config.retry_base_delay_ms);
                        warn!(
                            %error,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "retrying chat completion after transport error"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(OpenAiApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(OpenAiApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Sends the request and decodes the completion body.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            endpoint = %self.normalized_endpoint(),
            "sending chat completion"
        );
        let response = self.send_with_retry(request).await?;
        let body = response.bytes().await.map_err(OpenAiApiError::from)?;
        let parsed: ChatCompletionResponse = serde_json::from_slice(&body)?;
        if parsed.choices.is_empty() {
            return Err(OpenAiApiError::EmptyResponse);
        }
        Ok(parsed)
    }
}
