//! # Configuration Module
//!
//! Runtime configuration for the bot, read from the process environment
//! (optionally seeded from a `.env` file), plus the deploy and edit policies
//! consulted by the project core.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

// Constants for bot configuration
pub const DEFAULT_DATA_FILE: &str = "data/projects.json";
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 255;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Rules deciding when a project may be deployed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployPolicy {
    /// Require at least one attached wallet on top of name, symbol and description
    pub require_wallet: bool,
}

/// Rules applied to free-text values captured by a pending edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPolicy {
    /// Reject blank values and keep waiting for another message
    pub reject_empty: bool,
    /// Maximum accepted length in characters
    pub max_value_len: usize,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            reject_empty: true,
            max_value_len: DEFAULT_MAX_VALUE_LENGTH,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` in any case selects JSON output; anything else is pretty
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Configuration structure for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot credential
    pub telegram_bot_token: String,
    /// Location of the JSON repository document
    pub data_file: PathBuf,
    pub deploy_policy: DeployPolicy,
    pub edit_policy: EditPolicy,
}

impl BotConfig {
    /// Build the configuration from environment variables
    ///
    /// `TELEGRAM_BOT_TOKEN` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

        let data_file = env::var("VORTEX_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE));

        let require_wallet = env_flag("VORTEX_REQUIRE_WALLET", false)?;
        let reject_empty = env_flag("VORTEX_REJECT_EMPTY_VALUES", true)?;

        let max_value_len = match env::var("VORTEX_MAX_VALUE_LENGTH") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid VORTEX_MAX_VALUE_LENGTH: {raw}"))?,
            Err(_) => DEFAULT_MAX_VALUE_LENGTH,
        };

        Ok(Self {
            telegram_bot_token,
            data_file,
            deploy_policy: DeployPolicy { require_wallet },
            edit_policy: EditPolicy {
                reject_empty,
                max_value_len,
            },
        })
    }
}

/// Log format from `VORTEX_LOG_FORMAT`
///
/// Read on its own since tracing starts before the rest of the config loads.
pub fn log_format_from_env() -> LogFormat {
    env::var("VORTEX_LOG_FORMAT")
        .map(|raw| LogFormat::parse(&raw))
        .unwrap_or_default()
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).with_context(|| format!("Invalid boolean in {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Parse a boolean environment value
pub fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
