//! Application-level configuration loading, including the default prize
//! ladder and the gameplay timing knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::models::PrizeLadderEntity;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_LADDER_BACK_CONFIG_PATH";

/// Maximum age of a cached question set before it counts as a miss.
const DEFAULT_QUESTION_SET_TTL_SECS: u64 = 300;
/// Length of the phone-a-friend countdown.
const DEFAULT_PHONE_COUNTDOWN_SECS: u64 = 180;
/// How long the 50/50 indicator stays up before auto-clearing.
const DEFAULT_LIFELINE_CLEAR_DELAY_SECS: u64 = 5;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    prize_ladder: Vec<u64>,
    question_set_ttl: Duration,
    phone_countdown: Duration,
    lifeline_clear_delay: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        rungs = app_config.prize_ladder.len(),
                        "loaded prize ladder from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Number of questions every set is expected to hold (one per ladder rung).
    pub fn question_count(&self) -> u32 {
        self.prize_ladder.len() as u32
    }

    /// The default prize ladder as a store entity, used to seed the store and
    /// to restore it on a factory reset.
    pub fn default_prize_ladder(&self) -> PrizeLadderEntity {
        PrizeLadderEntity {
            amounts: self.prize_ladder.clone(),
        }
    }

    /// Maximum age of a cached question set before it must be refetched.
    pub fn question_set_ttl(&self) -> Duration {
        self.question_set_ttl
    }

    /// Length of the phone-a-friend countdown.
    pub fn phone_countdown(&self) -> Duration {
        self.phone_countdown
    }

    /// Delay before the 50/50 indicator auto-clears.
    pub fn lifeline_clear_delay(&self) -> Duration {
        self.lifeline_clear_delay
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prize_ladder: default_prize_ladder(),
            question_set_ttl: Duration::from_secs(DEFAULT_QUESTION_SET_TTL_SECS),
            phone_countdown: Duration::from_secs(DEFAULT_PHONE_COUNTDOWN_SECS),
            lifeline_clear_delay: Duration::from_secs(DEFAULT_LIFELINE_CLEAR_DELAY_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    prize_ladder: Option<Vec<u64>>,
    question_set_ttl_secs: Option<u64>,
    phone_countdown_secs: Option<u64>,
    lifeline_clear_delay_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            prize_ladder: value
                .prize_ladder
                .filter(|ladder| !ladder.is_empty())
                .unwrap_or(defaults.prize_ladder),
            question_set_ttl: value
                .question_set_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.question_set_ttl),
            phone_countdown: value
                .phone_countdown_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.phone_countdown),
            lifeline_clear_delay: value
                .lifeline_clear_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.lifeline_clear_delay),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in prize ladder shipped with the binary.
fn default_prize_ladder() -> Vec<u64> {
    vec![
        100, 200, 300, 500, 1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 64_000, 125_000, 250_000,
        500_000, 1_000_000,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_one_rung_per_question() {
        let config = AppConfig::default();
        assert_eq!(config.question_count(), 15);
        assert_eq!(
            config.default_prize_ladder().amounts.last().copied(),
            Some(1_000_000)
        );
    }

    #[test]
    fn raw_config_overrides_only_present_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"prize_ladder": [10, 20], "phone_countdown_secs": 60}"#)
                .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.question_count(), 2);
        assert_eq!(config.phone_countdown(), Duration::from_secs(60));
        assert_eq!(
            config.question_set_ttl(),
            Duration::from_secs(DEFAULT_QUESTION_SET_TTL_SECS)
        );
    }

    #[test]
    fn empty_ladder_falls_back_to_default() {
        let raw: RawConfig = serde_json::from_str(r#"{"prize_ladder": []}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.question_count(), 15);
    }
}
