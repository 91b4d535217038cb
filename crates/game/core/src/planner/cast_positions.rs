use std::collections::BTreeMap;

use crate::env::MapOracle;
use crate::geometry::Zone;
use crate::state::{Cell, SpellDescriptor};

use super::Target;

/// Cells from which at least one target can be hit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastPositions {
    /// Largest acquisition distance among the targets that contributed a
    /// cell; bounds the reachability search. Zero when casting in place.
    pub radius: u32,
    pub cells: BTreeMap<Cell, Vec<Target>>,
}

impl CastPositions {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains_key(&cell)
    }

    /// First target castable from `cell`.
    pub fn first_target(&self, cell: Cell) -> Option<&Target> {
        self.cells.get(&cell).and_then(|targets| targets.first())
    }

    /// Sum of the distances from `cell` to every cast cell.
    pub fn total_distance_from(&self, cell: Cell) -> u64 {
        self.cells.keys().map(|&c| u64::from(cell.distance(c))).sum()
    }
}

/// Finds every cell from which `spell` reaches at least one of `targets`.
///
/// Candidates come from the spell zone around each target and must see the
/// target. When the fighter's own cell qualifies the search stops right away
/// and returns it as the only position, with a radius of zero.
pub fn find_cast_positions<M>(
    map: &M,
    spell: &SpellDescriptor,
    targets: &[Target],
    fighter_cell: Cell,
) -> CastPositions
where
    M: MapOracle + ?Sized,
{
    let zone = Zone::for_spell(spell);
    let mut positions = CastPositions::default();

    tracing::debug!(
        "Searching cast positions for {} from cell {} against {} target(s), zone {:?}",
        spell.id,
        fighter_cell,
        targets.len(),
        zone
    );

    for target in targets {
        for candidate in map.cells_in_zone(&zone, target.cell) {
            if !map.has_line_of_sight(target.cell, candidate) {
                continue;
            }

            if candidate == fighter_cell {
                tracing::debug!("Target {} castable from current cell {}", target, fighter_cell);
                return CastPositions {
                    radius: 0,
                    cells: BTreeMap::from([(fighter_cell, vec![target.clone()])]),
                };
            }

            positions
                .cells
                .entry(candidate)
                .or_default()
                .push(target.clone());
            positions.radius = positions.radius.max(target.distance);
        }
    }

    tracing::debug!(
        "Found {} cast position(s), search radius {}",
        positions.len(),
        positions.radius
    );

    positions
}
