use std::collections::{BTreeSet, VecDeque};

use arrayvec::ArrayVec;

use crate::geometry::{self, Zone};
use crate::state::{Cell, Fighter};

/// Geometry collaborator exposing the combat board.
///
/// Implementors only have to answer the per-cell questions; adjacency,
/// distances, sight lines, zones and reachability have default implementations
/// built on top of them.
pub trait MapOracle: Send + Sync {
    /// Returns false when nothing may stand on the cell (walls, holes, fighters).
    fn is_walkable(&self, cell: Cell) -> bool;

    /// Returns false when the cell obstructs sight lines.
    fn point_los(&self, cell: Cell) -> bool;

    fn is_in_map(&self, cell: Cell) -> bool {
        cell.is_valid()
    }

    fn adjacency(&self, cell: Cell) -> ArrayVec<Cell, 4> {
        cell.vicinity()
    }

    fn distance(&self, from: Cell, to: Cell) -> u32 {
        from.distance(to)
    }

    fn has_line_of_sight(&self, from: Cell, to: Cell) -> bool {
        geometry::has_line_of_sight(self, from, to)
    }

    fn cells_in_zone(&self, zone: &Zone, center: Cell) -> BTreeSet<Cell> {
        zone.cells(center)
            .into_iter()
            .filter(|&cell| self.is_in_map(cell))
            .collect()
    }

    /// Cells the fighter could occupy within `radius` steps from `from`.
    ///
    /// The starting cell itself is not part of the result.
    fn reachable_cells(&self, _fighter: &Fighter, from: Cell, radius: u32) -> BTreeSet<Cell> {
        let mut reachable = BTreeSet::new();
        let mut seen = BTreeSet::from([from]);
        let mut frontier = VecDeque::from([(from, 0u32)]);

        while let Some((cell, steps)) = frontier.pop_front() {
            if steps >= radius {
                continue;
            }
            for next in self.adjacency(cell) {
                if !seen.insert(next) || !self.is_walkable(next) {
                    continue;
                }
                reachable.insert(next);
                frontier.push_back((next, steps + 1));
            }
        }

        reachable
    }
}

/// Static board layout: which cells can be stood on and which block sight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapLayout {
    /// Cells nobody can stand on.
    #[cfg_attr(feature = "serde", serde(default))]
    pub non_walkable: BTreeSet<Cell>,
    /// Cells that obstruct sight lines.
    #[cfg_attr(feature = "serde", serde(default))]
    pub los_blockers: BTreeSet<Cell>,
}

impl MapLayout {
    /// A board without any obstacle.
    pub fn open() -> Self {
        Self::default()
    }

    /// Adds walls: cells that are neither walkable nor transparent.
    pub fn with_walls(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        for cell in cells {
            self.non_walkable.insert(cell);
            self.los_blockers.insert(cell);
        }
        self
    }

    /// Adds holes: cells that cannot be stood on but can be seen through.
    pub fn with_holes(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.non_walkable.extend(cells);
        self
    }

    pub fn with_los_blockers(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.los_blockers.extend(cells);
        self
    }
}

impl MapOracle for MapLayout {
    fn is_walkable(&self, cell: Cell) -> bool {
        cell.is_valid() && !self.non_walkable.contains(&cell)
    }

    fn point_los(&self, cell: Cell) -> bool {
        !self.los_blockers.contains(&cell)
    }
}
