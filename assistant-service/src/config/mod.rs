use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Default request body ceiling (10MB).
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// 100 requests per 15 minutes per client IP on `/api/*`.
const DEFAULT_RATE_LIMIT_MAX: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub common: core_config::Config,
    pub anthropic: AnthropicConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// `None` when `ANTHROPIC_API_KEY` is unset; upstream calls then fail as unauthenticated.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Extra CORS origin allowed in production.
    pub frontend_url: Option<String>,
    /// Host suffix whose HTTPS subdomains are allowed in production (e.g. `.vercel.app`).
    pub cors_origin_suffix: Option<String>,
    pub static_dir: String,
    pub body_limit_bytes: usize,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Identify clients by the first `X-Forwarded-For` hop instead of the socket peer.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_proxy: bool,
    /// Log raw user messages and model replies. Off unless explicitly enabled.
    pub log_conversations: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            anthropic: AnthropicConfig {
                api_key: None,
                model: DEFAULT_ANTHROPIC_MODEL.to_string(),
                base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
                timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            },
            gateway: GatewayConfig {
                frontend_url: None,
                cors_origin_suffix: Some(".vercel.app".to_string()),
                static_dir: "assistant-service/public".to_string(),
                body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
                rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
                rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
                trust_proxy: false,
                log_conversations: false,
            },
        }
    }
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let defaults = Self::default();

        let api_key = optional_env("ANTHROPIC_API_KEY").map(Secret::new);
        if api_key.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY is not set; chat requests will fail until it is configured");
        }

        Ok(AssistantConfig {
            common,
            anthropic: AnthropicConfig {
                api_key,
                model: optional_env("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic.model),
                base_url: optional_env("ANTHROPIC_BASE_URL")
                    .unwrap_or(defaults.anthropic.base_url),
                timeout_secs: parse_env("ANTHROPIC_TIMEOUT_SECS", defaults.anthropic.timeout_secs)?,
            },
            gateway: GatewayConfig {
                frontend_url: optional_env("FRONTEND_URL"),
                cors_origin_suffix: match env::var("CORS_ORIGIN_SUFFIX") {
                    Ok(val) if val.trim().is_empty() => None,
                    Ok(val) => Some(val.trim().to_string()),
                    Err(_) => defaults.gateway.cors_origin_suffix,
                },
                static_dir: optional_env("STATIC_DIR").unwrap_or(defaults.gateway.static_dir),
                body_limit_bytes: parse_env("BODY_LIMIT_BYTES", defaults.gateway.body_limit_bytes)?,
                rate_limit_max: parse_env("RATE_LIMIT_MAX", defaults.gateway.rate_limit_max)?,
                rate_limit_window_secs: parse_env(
                    "RATE_LIMIT_WINDOW_SECS",
                    defaults.gateway.rate_limit_window_secs,
                )?,
                trust_proxy: parse_env("TRUST_PROXY", false)?,
                log_conversations: parse_env("LOG_CONVERSATIONS", false)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}
