//! Application settings from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use session_store::{CACHE_PATH_ENV_VAR, DEFAULT_MAX_CACHED_FILES};
use thiserror::Error;

use crate::export::SAVE_PATH_ENV_VAR;
use crate::transcript::{DEFAULT_MAX_HISTORY, DEFAULT_SYSTEM_DIRECTIVE};

pub const PROVIDER_ENV_VAR: &str = "CHATLOG_PROVIDER";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV_VAR: &str = "CHATLOG_MODEL";
pub const MODELS_ENV_VAR: &str = "CHATLOG_MODELS";
pub const MAX_HISTORY_ENV_VAR: &str = "CHATLOG_MAX_HISTORY";
pub const MAX_CACHED_FILES_ENV_VAR: &str = "CHATLOG_MAX_CACHED_FILES";
pub const SYSTEM_PROMPT_ENV_VAR: &str = "CHATLOG_SYSTEM_PROMPT";
pub const TIMEOUT_ENV_VAR: &str = "CHATLOG_TIMEOUT_SEC";
pub const RESUME_ENV_VAR: &str = "CHATLOG_RESUME";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "o1-preview", "o1-mini"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {var} is not set")]
    Missing { var: &'static str },

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    /// Offered by `/model_list`; always contains `model`.
    pub models: Vec<String>,
    pub max_history: usize,
    pub max_cached_files: usize,
    pub system_prompt: String,
    pub timeout: Option<Duration>,
    pub cache_dir: PathBuf,
    pub save_dir: Option<PathBuf>,
    pub resume: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let provider = match get(PROVIDER_ENV_VAR) {
            None => ProviderKind::OpenAi,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "openai" => ProviderKind::OpenAi,
                "mock" => ProviderKind::Mock,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: PROVIDER_ENV_VAR,
                        value,
                        reason: "expected 'openai' or 'mock'",
                    })
                }
            },
        };

        let api_key = get(API_KEY_ENV_VAR);
        if provider == ProviderKind::OpenAi && api_key.is_none() {
            return Err(ConfigError::Missing {
                var: API_KEY_ENV_VAR,
            });
        }

        let cache_dir = get(CACHE_PATH_ENV_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing {
                var: CACHE_PATH_ENV_VAR,
            })?;

        let model = get(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mut models = match get(MODELS_ENV_VAR) {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_MODELS.iter().map(|model| model.to_string()).collect(),
        };
        if !models.contains(&model) {
            models.insert(0, model.clone());
        }

        let timeout = get(TIMEOUT_ENV_VAR)
            .map(|raw| positive_number(TIMEOUT_ENV_VAR, raw))
            .transpose()?
            .map(|secs| Duration::from_secs(secs as u64));

        Ok(Self {
            provider,
            api_key,
            base_url: get(BASE_URL_ENV_VAR),
            model,
            models,
            max_history: get(MAX_HISTORY_ENV_VAR)
                .map(|raw| positive_number(MAX_HISTORY_ENV_VAR, raw))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_HISTORY),
            max_cached_files: get(MAX_CACHED_FILES_ENV_VAR)
                .map(|raw| positive_number(MAX_CACHED_FILES_ENV_VAR, raw))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_CACHED_FILES),
            system_prompt: get(SYSTEM_PROMPT_ENV_VAR)
                .unwrap_or_else(|| DEFAULT_SYSTEM_DIRECTIVE.to_string()),
            timeout,
            cache_dir,
            save_dir: get(SAVE_PATH_ENV_VAR).map(PathBuf::from),
            resume: get(RESUME_ENV_VAR),
        })
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn positive_number(var: &'static str, raw: String) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected a whole number greater than zero",
        }),
    }
}
