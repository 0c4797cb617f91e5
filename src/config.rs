//! Game Configuration
//!
//! Defaults mirror the tuned game constants; every value can be overridden
//! from `SUPER_LANCER_*` environment variables.

use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::lane::LaneModel;
use crate::game::tick::RunConfig;
use crate::persistence::leaderboard::MAX_HIGH_SCORES;
use crate::runtime::location::FallbackRegion;
use crate::DEFAULT_MAX_LIVES;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SUPER_LANCER_";

/// Default bound on the location lookup at game over.
pub const DEFAULT_LOCATION_TIMEOUT_MS: u64 = 3000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Value could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name (without prefix)
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// Value parsed but lies outside its allowed range.
    #[error("{key} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Variable name (without prefix)
        key: &'static str,
        /// Parsed value
        value: u64,
        /// Inclusive lower bound
        min: u64,
        /// Inclusive upper bound
        max: u64,
    },
}

/// Full game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Life cap (and starting lives)
    pub max_lives: u8,
    /// Number of evenly spaced lanes
    pub lane_count: u8,
    /// Simulation rules
    pub run: RunConfig,
    /// Leaderboard size
    pub leaderboard_size: usize,
    /// Bound on the location lookup at game over
    pub location_timeout_ms: u64,
    /// Region used when no position is available (None disables)
    pub fallback: Option<FallbackRegion>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_lives: DEFAULT_MAX_LIVES,
            lane_count: 5,
            run: RunConfig::default(),
            leaderboard_size: MAX_HIGH_SCORES,
            location_timeout_ms: DEFAULT_LOCATION_TIMEOUT_MS,
            fallback: Some(FallbackRegion::default()),
        }
    }
}

impl GameConfig {
    /// Create config from environment variables, on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Create config from an arbitrary key lookup (keys without prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_with(&lookup, "MAX_LIVES", &mut config.max_lives)?;
        override_with(&lookup, "LANE_COUNT", &mut config.lane_count)?;
        override_with(&lookup, "HEART_CHANCE", &mut config.run.spawn.heart_chance)?;
        override_with(&lookup, "COIN_CHANCE", &mut config.run.spawn.coin_chance)?;
        override_with(&lookup, "COIN_BONUS", &mut config.run.coin_bonus)?;
        override_with(&lookup, "ROCK_AVOID_BONUS", &mut config.run.rock_avoid_bonus)?;
        override_with(&lookup, "FALL_DURATION_MS", &mut config.run.fall_duration_ms)?;
        override_with(&lookup, "PHYSICS_TICK_MS", &mut config.run.physics_tick_ms)?;
        override_with(&lookup, "DISTANCE_TICK_MS", &mut config.run.distance_tick_ms)?;
        override_with(&lookup, "DISTANCE_STEP", &mut config.run.distance_step)?;
        override_with(&lookup, "LEADERBOARD_SIZE", &mut config.leaderboard_size)?;
        override_with(&lookup, "LOCATION_TIMEOUT_MS", &mut config.location_timeout_ms)?;

        if let Some(raw) = lookup("FALLBACK_REGION") {
            config.fallback = parse_fallback(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("MAX_LIVES", self.max_lives as u64, 1, u8::MAX as u64)?;
        check_range("LANE_COUNT", self.lane_count as u64, 1, u8::MAX as u64)?;
        check_range("HEART_CHANCE", self.run.spawn.heart_chance as u64, 0, 100)?;
        check_range("COIN_CHANCE", self.run.spawn.coin_chance as u64, 0, 100)?;
        check_range("FALL_DURATION_MS", self.run.fall_duration_ms as u64, 1, u32::MAX as u64)?;
        check_range("PHYSICS_TICK_MS", self.run.physics_tick_ms as u64, 1, u32::MAX as u64)?;
        check_range("DISTANCE_TICK_MS", self.run.distance_tick_ms as u64, 1, u32::MAX as u64)?;
        check_range("LEADERBOARD_SIZE", self.leaderboard_size as u64, 1, 1000)?;
        check_range("LOCATION_TIMEOUT_MS", self.location_timeout_ms, 1, 60_000)?;
        Ok(())
    }

    /// Lane layout for this configuration.
    pub fn lanes(&self) -> Result<LaneModel, ConfigError> {
        LaneModel::even(self.lane_count).map_err(|_| ConfigError::InvalidValue {
            key: "LANE_COUNT",
            value: self.lane_count.to_string(),
        })
    }
}

fn override_with<F, T>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue { key, value: raw })?;
    }
    Ok(())
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { key, value, min, max });
    }
    Ok(())
}

/// `off`/`false`/`0` disables the fallback; `lat,lon` moves its centre.
fn parse_fallback(raw: &str) -> Result<Option<FallbackRegion>, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "FALLBACK_REGION",
        value: raw.to_string(),
    };

    match raw.trim().to_lowercase().as_str() {
        "off" | "false" | "0" | "none" => return Ok(None),
        "on" | "true" | "1" | "default" => return Ok(Some(FallbackRegion::default())),
        _ => {}
    }

    let (lat, lon) = raw.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }
    Ok(Some(FallbackRegion {
        latitude: lat,
        longitude: lon,
        ..FallbackRegion::default()
    }))
}
