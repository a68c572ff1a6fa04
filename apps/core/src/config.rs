//! Runtime configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and are validated before the brain starts.

use crate::brain::encoder::EncodingPolicy;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use validator::Validate;

pub const DEFAULT_ADVICE_URL: &str = "https://api.adviceslip.com/advice";

/// Tunables for memory, training and the self-thought timer.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct BrainConfig {
    /// Maximum retained phrase/response pairs (also caps the chat log).
    #[validate(range(min = 2))]
    pub max_memory: usize,
    /// Width of the hidden ReLU layer.
    #[validate(range(min = 10, max = 16))]
    pub hidden_units: usize,
    /// Full passes over the training data.
    #[validate(range(min = 100, max = 150))]
    pub epochs: usize,
    /// Adam step size, `0 < lr <= 1`.
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub learning_rate: f32,
    #[validate(range(min = 1))]
    pub batch_size: usize,
    pub encoding: EncodingPolicy,
    /// Seconds between self-thought cycles. Zero disables the timer.
    pub think_interval_secs: u64,
    #[validate(url)]
    pub advice_url: String,
    /// When set, every self-thought is taught back as if a user had typed it.
    pub self_thought_teaches: bool,
    /// Fixed training seed; `None` draws a fresh one per training run.
    pub seed: Option<u64>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            max_memory: 500,
            hidden_units: 10,
            epochs: 100,
            learning_rate: 0.01,
            batch_size: 32,
            encoding: EncodingPolicy::WordCount,
            think_interval_secs: 15,
            advice_url: DEFAULT_ADVICE_URL.to_string(),
            self_thought_teaches: false,
            seed: None,
        }
    }
}

impl BrainConfig {
    /// Builds the configuration from `ECHOMIND_*` environment variables.
    ///
    /// Missing variables fall back to [`BrainConfig::default`]; present but
    /// unparsable ones are reported as [`AppError::Config`].
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            max_memory: env_or("ECHOMIND_MAX_MEMORY", defaults.max_memory)?,
            hidden_units: env_or("ECHOMIND_HIDDEN_UNITS", defaults.hidden_units)?,
            epochs: env_or("ECHOMIND_EPOCHS", defaults.epochs)?,
            learning_rate: env_or("ECHOMIND_LEARNING_RATE", defaults.learning_rate)?,
            batch_size: env_or("ECHOMIND_BATCH_SIZE", defaults.batch_size)?,
            encoding: env_or("ECHOMIND_ENCODING", defaults.encoding)?,
            think_interval_secs: env_or(
                "ECHOMIND_THINK_INTERVAL_SECS",
                defaults.think_interval_secs,
            )?,
            advice_url: env::var("ECHOMIND_ADVICE_URL").unwrap_or(defaults.advice_url),
            self_thought_teaches: match env::var("ECHOMIND_SELF_THOUGHT_TEACHES") {
                Ok(raw) => parse_flag("ECHOMIND_SELF_THOUGHT_TEACHES", &raw)?,
                Err(_) => defaults.self_thought_teaches,
            },
            seed: match env::var("ECHOMIND_SEED") {
                Ok(raw) => Some(parse_value("ECHOMIND_SEED", &raw)?),
                Err(_) => None,
            },
        };

        config.validate()?;

        if config.self_thought_teaches {
            warn!("Self-thought teaching is enabled: the brain will learn from its own guesses and may drift");
        }

        Ok(config)
    }

    /// Interval of the self-thought timer, if enabled.
    pub fn think_interval(&self) -> Option<Duration> {
        (self.think_interval_secs > 0).then(|| Duration::from_secs(self.think_interval_secs))
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::Config(format!(
            "{} has invalid value '{}': expected a boolean",
            key, other
        ))),
    }
}
