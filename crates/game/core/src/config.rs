/// Tunable parameters of the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerConfig {
    /// Weight of the average distance to the remaining cast cells in the path
    /// search priority. Higher values pull the frontier harder toward them.
    pub heuristic_weight: u64,
}

impl PlannerConfig {
    pub const DEFAULT_HEURISTIC_WEIGHT: u64 = 10;

    pub fn new() -> Self {
        Self {
            heuristic_weight: Self::DEFAULT_HEURISTIC_WEIGHT,
        }
    }

    pub fn with_heuristic_weight(heuristic_weight: u64) -> Self {
        Self { heuristic_weight }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new()
    }
}
