use crate::state::{Cell, Fighter, FighterFlags};

use super::Target;

/// Fraction of its points `fighter` keeps when leaving `cell`.
///
/// Each adjacent, living, visible opponent multiplies the factor by
/// `(evade + 2) / (2 * (block + 2))`, capped at 1. Untackleable fighters
/// always keep everything.
pub fn tackle_factor(fighter: &Fighter, cell: Cell, roster: &[Fighter]) -> f64 {
    if fighter.flags.contains(FighterFlags::UNTACKLEABLE) {
        return 1.0;
    }

    let evade = f64::from(fighter.tackle_evade.max(0));
    let factor = roster
        .iter()
        .filter(|other| other.id != fighter.id)
        .filter(|other| other.is_enemy_of(fighter) && other.is_alive() && !other.is_hidden())
        .filter(|other| other.cell.is_some_and(|c| c.is_adjacent(cell)))
        .fold(1.0_f64, |acc, other| {
            let block = f64::from(other.tackle_block.max(0));
            acc * ((evade + 2.0) / (2.0 * (block + 2.0))).min(1.0)
        });

    factor.clamp(0.0, 1.0)
}

/// What remains of a planned path once tackle losses are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TackleOutcome {
    /// The fighter still ends on its cast cell with enough AP for the spell.
    pub can_hit: bool,
    /// Prefix of the path actually walkable, current cell included.
    pub usable_path: Vec<Cell>,
    pub mp_used: u32,
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Walks `path` step by step and cuts it where tackle drains the remaining MP.
///
/// `path[0]` is the fighter's current cell. Leaving a cell with factor `t`
/// costs `round((total_mp - steps_taken) * (1 - t))` MP and
/// `round(ap * (1 - t))` AP, where `ap` is the AP left after the losses so
/// far. The losses accumulate; the walk stops once the steps taken reach the
/// MP left.
pub fn analyze_tackle_path<F>(
    path: &[Cell],
    target: Option<&Target>,
    total_mp: i32,
    total_ap: i32,
    spell_ap_cost: i32,
    tackle: F,
) -> TackleOutcome
where
    F: Fn(Cell) -> f64,
{
    if path.len() < 2 {
        return TackleOutcome {
            can_hit: target.is_some(),
            usable_path: Vec::new(),
            mp_used: 0,
        };
    }

    let mut mp_lost: i64 = 0;
    let mut ap_lost: i64 = 0;
    let mut mp_count: i64 = 0;
    let mut ap = i64::from(total_ap);

    for &cell in &path[..path.len() - 1] {
        let factor = tackle(cell).clamp(0.0, 1.0);
        let keep = 1.0 - factor;

        mp_lost += round_half_up((i64::from(total_mp) - mp_count) as f64 * keep);
        ap_lost += round_half_up(ap as f64 * keep);

        let mp = (i64::from(total_mp) - mp_lost).max(0);
        ap = (i64::from(total_ap) - ap_lost).max(0);

        if mp_count >= mp {
            tracing::debug!(
                "Tackled on cell {}: walk stops after {} step(s), {} MP / {} AP left",
                cell,
                mp_count,
                mp,
                ap
            );
            break;
        }
        mp_count += 1;
    }

    let last = mp_count as usize;
    let can_hit = target.is_some() && ap >= i64::from(spell_ap_cost) && last >= path.len() - 1;

    TackleOutcome {
        can_hit,
        usable_path: path[..=last].to_vec(),
        mp_used: mp_count as u32,
    }
}
