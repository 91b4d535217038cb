use std::fmt::Write as _;

use crate::env::CombatEnv;
use crate::state::{Cell, Fighter, FighterId, SpellDescriptor};

/// An opposing fighter selected as a possible spell target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub fighter: FighterId,
    pub cell: Cell,
    /// Distance from the acting fighter when the target was acquired.
    pub distance: u32,
    pub bone_id: u16,
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, cell {}, dist {})", self.fighter, self.cell, self.distance)
    }
}

/// Eligibility knobs applied on top of the fixed rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetFilter {
    pub include_summoned: bool,
    /// Restricts targets to a single visual model class.
    pub required_bone_id: Option<u16>,
}

impl TargetFilter {
    pub const fn new(include_summoned: bool, required_bone_id: Option<u16>) -> Self {
        Self {
            include_summoned,
            required_bone_id,
        }
    }
}

/// One row of the acquisition diagnostics.
struct Evaluation<'a> {
    fighter: &'a Fighter,
    can_hit: bool,
    reason: String,
    eligible: bool,
}

/// Filters the session roster down to the fighters `acting` may attack.
///
/// A fighter is kept when it is on the other team, alive, visible, not a
/// summon (unless the filter allows it), the session lets `spell` be cast on
/// it, it stands on a valid cell, and its bone matches the filter if one is
/// required. Every evaluated fighter is reported in an `info` summary table.
pub fn acquire_targets(
    env: CombatEnv<'_>,
    acting: &Fighter,
    spell: &SpellDescriptor,
    filter: &TargetFilter,
) -> Vec<Target> {
    let Some(origin) = acting.cell else {
        tracing::warn!("Fighter {} is not on the board, no target to acquire", acting.label());
        return Vec::new();
    };

    let roster = env.fight().fighters();
    let mut evaluations = Vec::with_capacity(roster.len());
    let mut targets = Vec::new();

    for fighter in roster.iter().filter(|f| f.id != acting.id) {
        let check = env.fight().can_cast(spell, fighter.cell);
        let on_board = fighter.cell.is_some_and(|c| c.is_valid());
        let eligible = fighter.is_enemy_of(acting)
            && fighter.is_alive()
            && !fighter.is_hidden()
            && (filter.include_summoned || !fighter.is_summoned())
            && check.allowed
            && on_board
            && filter
                .required_bone_id
                .is_none_or(|bone| fighter.bone_id == bone);

        if eligible && let Some(cell) = fighter.cell {
            targets.push(Target {
                fighter: fighter.id,
                cell,
                distance: origin.distance(cell),
                bone_id: fighter.bone_id,
            });
        }

        evaluations.push(Evaluation {
            fighter,
            can_hit: check.allowed,
            reason: check.reason,
            eligible,
        });
    }

    tracing::info!(
        "Target acquisition for {} ({:?}): {} of {} eligible\n{}",
        acting.label(),
        filter,
        targets.len(),
        evaluations.len(),
        summary_table(&evaluations)
    );

    targets
}

fn summary_table(rows: &[Evaluation<'_>]) -> String {
    let mut table = format!(
        "{:<16} {:>8} {:>6} {:>4} {:>5} {:>5} {:>5} {:>6} {:>8} {:>6} {:>5}  reason",
        "name", "id", "bone", "team", "cell", "life", "dead", "hidden", "summoned", "canhit", "kept"
    );
    for row in rows {
        let f = row.fighter;
        let cell = f.cell.map_or_else(|| "-".to_string(), |c| c.to_string());
        let _ = write!(
            table,
            "\n{:<16} {:>8} {:>6} {:>4} {:>5} {:>5} {:>5} {:>6} {:>8} {:>6} {:>5}  {}",
            if f.name.is_empty() { "unknown" } else { f.name.as_str() },
            f.id.0,
            f.bone_id,
            f.team.0,
            cell,
            f.life_points,
            !f.is_alive(),
            f.is_hidden(),
            f.is_summoned(),
            row.can_hit,
            row.eligible,
            row.reason
        );
    }
    table
}
