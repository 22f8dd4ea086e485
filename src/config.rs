//! Rendering configuration from the environment.

use std::env;

pub const NO_COLOR_ENV_VAR: &str = "NO_COLOR";
pub const WIDTH_ENV_VAR: &str = "CHATLOG_WIDTH";
pub const DEFAULT_WIDTH: usize = 100;
pub const MIN_WIDTH: usize = 20;
pub const MAX_WIDTH: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub color: bool,
    pub width: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color: true,
            width: DEFAULT_WIDTH,
        }
    }
}

impl RenderConfig {
    /// `NO_COLOR` with any non-empty value disables styling. `CHATLOG_WIDTH`
    /// is clamped into `MIN_WIDTH..=MAX_WIDTH`; unparsable values fall back to
    /// the default.
    pub fn from_env() -> Self {
        Self {
            color: env_string_opt(NO_COLOR_ENV_VAR).is_none(),
            width: env_string_opt(WIDTH_ENV_VAR)
                .and_then(|value| value.trim().parse::<usize>().ok())
                .map(|width| width.clamp(MIN_WIDTH, MAX_WIDTH))
                .unwrap_or(DEFAULT_WIDTH),
        }
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
