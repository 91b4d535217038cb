//! Runtime configuration shared by the engine and each turn.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use combat_core::{PlannerConfig, TargetFilter};

/// Ordered target filters tried by the planner, first match wins.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum FilterPreset {
    /// Regular fighters first, summons as a fallback.
    #[default]
    Standard,
    /// Only the treasure-hunt objective monsters, identified by their bone.
    TreasureHunt,
}

impl FilterPreset {
    pub const TREASURE_HUNT_BONES: [u16; 2] = [2672, 91];

    pub fn filters(self) -> Vec<TargetFilter> {
        match self {
            Self::Standard => vec![TargetFilter::new(false, None), TargetFilter::new(true, None)],
            Self::TreasureHunt => Self::TREASURE_HUNT_BONES
                .iter()
                .map(|&bone| TargetFilter::new(true, Some(bone)))
                .collect(),
        }
    }
}

/// Per-turn settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnConfig {
    /// Retryable failures tolerated in one turn before giving up.
    pub max_retries: u32,
    pub filters: FilterPreset,
    pub planner: PlannerConfig,
    /// How long to wait for the answer to a move or cast. `None` waits forever.
    pub action_timeout: Option<Duration>,
}

impl TurnConfig {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_filters(mut self, filters: FilterPreset) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_action_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.action_timeout = timeout;
        self
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            filters: FilterPreset::default(),
            planner: PlannerConfig::default(),
            action_timeout: Some(Self::DEFAULT_ACTION_TIMEOUT),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub turn: TurnConfig,
    /// Capacity of the session event channel and of each event bus topic.
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn: TurnConfig::default(),
            event_buffer_size: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_preset_tries_summons_last() {
        let filters = FilterPreset::Standard.filters();
        assert_eq!(filters.len(), 2);
        assert!(!filters[0].include_summoned);
        assert!(filters[1].include_summoned);
        assert!(filters.iter().all(|f| f.required_bone_id.is_none()));
    }

    #[test]
    fn treasure_hunt_preset_targets_objective_bones() {
        let bones: Vec<_> = FilterPreset::TreasureHunt
            .filters()
            .iter()
            .map(|f| f.required_bone_id)
            .collect();
        assert_eq!(bones, vec![Some(2672), Some(91)]);
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("treasure_hunt".parse::<FilterPreset>().ok(), Some(FilterPreset::TreasureHunt));
        assert_eq!(FilterPreset::Standard.to_string(), "standard");
    }
}
