//! Replay configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use combat_runtime::{EngineConfig, FilterPreset, TurnConfig};

/// Settings of one scenario replay.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub scenario: PathBuf,
    pub max_turns: u32,
    pub max_retries: u32,
    pub filters: FilterPreset,
    pub report_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scenario: PathBuf::from("scenarios/duel.ron"),
            max_turns: 40,
            max_retries: TurnConfig::default().max_retries,
            filters: FilterPreset::default(),
            report_json: false,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `FIGHT_SCENARIO` - Path of the RON scenario to replay
    /// - `FIGHT_MAX_TURNS` - Turns played before giving up on a winner (default: 40)
    /// - `FIGHT_MAX_RETRIES` - Retry budget per turn (default: 3)
    /// - `FIGHT_FILTERS` - Target filter preset, `standard` or `treasure_hunt`
    /// - `FIGHT_REPORT_JSON` - Print every turn report as a JSON line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("FIGHT_SCENARIO") {
            config.scenario = PathBuf::from(path);
        }
        if let Some(turns) = parse::<u32>(&lookup, "FIGHT_MAX_TURNS") {
            config.max_turns = turns.max(1);
        }
        if let Some(retries) = parse::<u32>(&lookup, "FIGHT_MAX_RETRIES") {
            config.max_retries = retries;
        }
        if let Some(filters) = parse::<FilterPreset>(&lookup, "FIGHT_FILTERS") {
            config.filters = filters;
        }
        if let Some(json) = parse::<bool>(&lookup, "FIGHT_REPORT_JSON") {
            config.report_json = json;
        }

        config
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            turn: TurnConfig::default()
                .with_max_retries(self.max_retries)
                .with_filters(self.filters),
            ..EngineConfig::default()
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}
