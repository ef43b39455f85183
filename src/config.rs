//! Application-level configuration loading: match rules and detector tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::gesture::DetectorSettings;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "RPS_BACK_CONFIG_PATH";

const DEFAULT_ROUNDS_TO_WIN: u32 = 5;
const DEFAULT_COUNTDOWN_SECS: u32 = 3;
const DEFAULT_MIN_HAND_PRESENCE: f32 = 0.7;
const DEFAULT_STABLE_FRAMES: u32 = 3;
const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_PLAYER_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Wins needed to take the match.
    pub rounds_to_win: u32,
    /// Seconds counted down before capture opens; zero opens capture immediately.
    pub countdown_secs: u32,
    /// Detector settings applied to landmark observations.
    pub detector: DetectorSettings,
    /// Consecutive identical frames required before a streamed gesture is thrown.
    pub stable_frames: u32,
    /// Finished matches kept in memory.
    pub history_limit: usize,
    /// Player name used when a match is started without one.
    pub default_player_name: String,
    /// Seed for the computer's moves; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        rounds_to_win = app_config.rounds_to_win,
                        countdown_secs = app_config.countdown_secs,
                        "loaded configuration"
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

    /// Parse a JSON document. Missing keys take their default value.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        Ok(raw.into())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rounds_to_win: DEFAULT_ROUNDS_TO_WIN,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            detector: DetectorSettings {
                min_presence: DEFAULT_MIN_HAND_PRESENCE,
                mirrored: true,
            },
            stable_frames: DEFAULT_STABLE_FRAMES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_player_name: DEFAULT_PLAYER_NAME.to_string(),
            seed: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    rounds_to_win: Option<u32>,
    countdown_secs: Option<u32>,
    min_hand_presence: Option<f32>,
    mirrored: Option<bool>,
    stable_frames: Option<u32>,
    history_limit: Option<usize>,
    default_player_name: Option<String>,
    seed: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let rounds_to_win = match value.rounds_to_win {
            Some(0) => {
                warn!("rounds_to_win must be at least 1; using default");
                defaults.rounds_to_win
            }
            Some(rounds) => rounds,
            None => defaults.rounds_to_win,
        };

        let min_presence = match value.min_hand_presence {
            Some(presence) if (0.0..=1.0).contains(&presence) => presence,
            Some(presence) => {
                warn!(presence, "min_hand_presence outside 0.0..=1.0; using default");
                defaults.detector.min_presence
            }
            None => defaults.detector.min_presence,
        };

        let default_player_name = value
            .default_player_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.default_player_name);

        Self {
            rounds_to_win,
            countdown_secs: value.countdown_secs.unwrap_or(defaults.countdown_secs),
            detector: DetectorSettings {
                min_presence,
                mirrored: value.mirrored.unwrap_or(defaults.detector.mirrored),
            },
            stable_frames: value.stable_frames.unwrap_or(defaults.stable_frames).max(1),
            history_limit: value.history_limit.unwrap_or(defaults.history_limit),
            default_player_name,
            seed: value.seed,
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
