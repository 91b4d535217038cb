//! Scenario files describing a fight to replay.
//!
//! A scenario bundles the board layout, the spells in play and the fighters
//! with the spell each of them casts. It is stored as RON and turned into a
//! [`SimulatedFight`] for replay.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use combat_core::{Fighter, FighterId, MapLayout, SpellDescriptor, SpellId};

use crate::api::{Result, RuntimeError, SessionEvent};
use crate::session::SimulatedFight;

fn default_level() -> u8 {
    1
}

/// A fighter and the spell it casts every turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterSetup {
    pub fighter: Fighter,
    pub spell: SpellId,
    #[serde(default = "default_level")]
    pub level: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub map: MapLayout,
    pub spells: Vec<SpellDescriptor>,
    /// Fighters in turn order.
    pub fighters: Vec<FighterSetup>,
}

impl Scenario {
    /// Parses and validates a scenario from RON text.
    pub fn from_ron(content: &str) -> Result<Self> {
        let scenario: Scenario = ron::from_str(content)
            .map_err(|e| RuntimeError::Scenario(format!("failed to parse scenario RON: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load scenario from a RON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Scenario(format!("failed to read {}: {}", path.display(), e))
        })?;
        let scenario = Self::from_ron(&content)?;

        tracing::info!(
            "Loaded scenario '{}' with {} fighters and {} spells from {}",
            scenario.name,
            scenario.fighters.len(),
            scenario.spells.len(),
            path.display()
        );
        Ok(scenario)
    }

    /// Checks that fighters are unique, stand on free walkable cells and only
    /// use declared spells.
    pub fn validate(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        let mut cells = BTreeSet::new();

        for setup in &self.fighters {
            let fighter = &setup.fighter;
            if !ids.insert(fighter.id) {
                return Err(RuntimeError::Scenario(format!(
                    "fighter {} is declared twice",
                    fighter.id
                )));
            }
            if let Some(cell) = fighter.cell {
                if !cell.is_valid() || self.map.non_walkable.contains(&cell) {
                    return Err(RuntimeError::Scenario(format!(
                        "fighter {} stands on unusable cell {}",
                        fighter.id, cell
                    )));
                }
                if !cells.insert(cell) {
                    return Err(RuntimeError::Scenario(format!(
                        "cell {} holds more than one fighter",
                        cell
                    )));
                }
            }
            if !self
                .spells
                .iter()
                .any(|s| s.id == setup.spell && s.level == setup.level)
            {
                return Err(RuntimeError::InvalidSpell {
                    spell: setup.spell,
                    level: setup.level,
                });
            }
        }

        let teams: BTreeSet<_> = self.fighters.iter().map(|s| s.fighter.team).collect();
        if teams.len() < 2 {
            return Err(RuntimeError::Scenario("a fight needs at least two teams".into()));
        }
        Ok(())
    }

    /// Spell and level cast by a fighter.
    pub fn spell_for(&self, fighter: FighterId) -> Option<(SpellId, u8)> {
        self.fighters
            .iter()
            .find(|s| s.fighter.id == fighter)
            .map(|s| (s.spell, s.level))
    }

    /// Builds the in-memory session answering on `events`.
    pub fn into_simulation(self, events: mpsc::Sender<SessionEvent>) -> SimulatedFight {
        let fighters = self.fighters.into_iter().map(|s| s.fighter).collect();
        SimulatedFight::new(self.map, self.spells, fighters, events)
    }
}
