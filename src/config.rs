//! Configuration types.
//!
//! Everything comes from environment variables. Unset optional keys fall
//! back to defaults; a set key that does not parse is an error rather than
//! a silent default.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::calls::{CallOptions, bland};
use crate::error::ConfigError;
use crate::llm::{DEFAULT_MODEL, LlmBackend, LlmConfig};
use crate::workflow::PollConfig;

/// HTTP listener and database location.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
}

/// Voice-call provider credentials and per-call options.
#[derive(Debug, Clone)]
pub struct BlandConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub call_options: CallOptions,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub bland: BlandConfig,
    pub poll: PollConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let server = ServerConfig {
            port: env.parse_or("SALES_CALLER_PORT", 8080)?,
            db_path: env
                .get("SALES_CALLER_DB_PATH")
                .unwrap_or_else(|| "./data/sales-caller.db".to_string())
                .into(),
        };

        let backend: LlmBackend = env.parse_or("SALES_CALLER_LLM_BACKEND", LlmBackend::Gemini)?;
        let key_var = match backend {
            LlmBackend::Gemini => "GOOGLE_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        };
        let llm_key = env
            .get(key_var)
            .or_else(|| env.get("LLM_API_KEY"))
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;
        let llm = LlmConfig {
            backend,
            api_key: SecretString::from(llm_key),
            model: env
                .get("SALES_CALLER_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: env.parse_or("SALES_CALLER_TEMPERATURE", 0.7)?,
            max_tokens: env.parse_or("SALES_CALLER_MAX_TOKENS", 2048)?,
        };

        let bland = BlandConfig {
            api_key: SecretString::from(env.require("BLAND_AI_API_KEY")?),
            base_url: env
                .get("BLAND_AI_BASE_URL")
                .unwrap_or_else(|| bland::DEFAULT_BASE_URL.to_string()),
            call_options: call_options(&env)?,
        };

        // Only library and Wizard polling read these; the HTTP routes never
        // start a poll, clients call GET /transcript themselves.
        let poll = PollConfig {
            interval: Duration::from_secs(env.parse_or("SALES_CALLER_POLL_INTERVAL_SECS", 5)?),
            max_duration: Duration::from_secs(env.parse_or("SALES_CALLER_POLL_MAX_SECS", 900)?),
        };
        if poll.interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SALES_CALLER_POLL_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            server,
            llm,
            bland,
            poll,
        })
    }
}

/// `BLAND_*` overrides on top of the default call options.
fn call_options<F>(env: &Env<F>) -> Result<CallOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let d = CallOptions::default();
    Ok(CallOptions {
        record: env.parse_or("BLAND_RECORD", d.record)?,
        voice: env.get("BLAND_VOICE").unwrap_or(d.voice),
        wait_for_greeting: env.parse_or("BLAND_WAIT_FOR_GREETING", d.wait_for_greeting)?,
        answered_by_enabled: env.parse_or("BLAND_ANSWERED_BY_ENABLED", d.answered_by_enabled)?,
        noise_cancellation: env.parse_or("BLAND_NOISE_CANCELLATION", d.noise_cancellation)?,
        interruption_threshold: env
            .parse_or("BLAND_INTERRUPTION_THRESHOLD", d.interruption_threshold)?,
        block_interruptions: env.parse_or("BLAND_BLOCK_INTERRUPTIONS", d.block_interruptions)?,
        max_duration: env.parse_or("BLAND_MAX_DURATION", d.max_duration)?,
        model: env.get("BLAND_MODEL").unwrap_or(d.model),
        language: env.get("BLAND_LANGUAGE").unwrap_or(d.language),
        background_track: env.get("BLAND_BACKGROUND_TRACK").unwrap_or(d.background_track),
        endpoint: env.get("BLAND_ENDPOINT").unwrap_or(d.endpoint),
        voicemail_action: env.parse_or("BLAND_VOICEMAIL_ACTION", d.voicemail_action)?,
    })
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Value of `key`, with blank values treated as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
