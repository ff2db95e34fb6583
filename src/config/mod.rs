use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

use crate::{prompts, retry::RetryPolicy};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MAX_BODY_MB: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format '{other}' (expected pretty or json)")),
        }
    }
}

/// Everything the relay needs, read once at startup.
#[derive(Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub instruction: String,
    pub max_body_bytes: usize,
    pub retry: RetryPolicy,
    pub upstream_timeout: Duration,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("instruction_len", &self.instruction.len())
            .field("max_body_bytes", &self.max_body_bytes)
            .field("retry", &self.retry)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            api_key: None,
            model: DEFAULT_MODEL.into(),
            api_base: DEFAULT_API_BASE.into(),
            instruction: prompts::default_instruction().to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_MB * 1024 * 1024,
            retry: RetryPolicy::default(),
            upstream_timeout: Duration::from_secs(120),
            log_format: LogFormat::Pretty,
        }
    }
}

impl RelayConfig {
    /// Read the process environment (after `dotenvy` has loaded `.env`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let instruction = match (get("ANALYZE_PROMPT_FILE"), get("ANALYZE_PROMPT")) {
            (Some(path), _) => prompts::load_instruction(&PathBuf::from(path))?,
            (None, Some(inline)) => inline,
            (None, None) => defaults.instruction,
        };

        let retry = RetryPolicy::new(
            parse_or(&get, "RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts())?,
            Duration::from_millis(parse_or(
                &get,
                "RETRY_INITIAL_BACKOFF_MS",
                defaults.retry.initial_backoff().as_millis() as u64,
            )?),
            parse_or(&get, "RETRY_BACKOFF_FACTOR", defaults.retry.backoff_factor())?,
        );

        let max_body_mb: usize = parse_or(&get, "MAX_BODY_MB", DEFAULT_MAX_BODY_MB)?;

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            api_key: get("GEMINI_API_KEY").map(|k| k.trim().to_string()),
            model: get("GEMINI_MODEL").unwrap_or(defaults.model),
            api_base: get("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            instruction,
            max_body_bytes: max_body_mb.saturating_mul(1024 * 1024),
            retry,
            upstream_timeout: Duration::from_secs(parse_or(
                &get,
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout.as_secs(),
            )?),
            log_format: match get("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => defaults.log_format,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("{key}={raw} is not valid")),
        None => Ok(default),
    }
}
