use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::config::PlannerConfig;
use crate::env::CombatEnv;
use crate::state::{Cell, Fighter, SpellDescriptor};

use super::Target;
use super::cast_positions::{CastPositions, find_cast_positions};

/// Result of searching a route toward a castable position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSearch {
    /// The fighter already stands on a cell from which it can hit.
    CastInPlace(Target),
    /// A cast cell is reachable; `path` starts on the current cell and ends on it.
    Reach { target: Target, path: Vec<Cell> },
    /// No cast cell is reachable; `path` leads to the closest explored cell.
    Approach { path: Vec<Cell> },
    NoPath,
}

impl PathSearch {
    pub fn path(&self) -> &[Cell] {
        match self {
            Self::Reach { path, .. } | Self::Approach { path } => path,
            Self::CastInPlace(_) | Self::NoPath => &[],
        }
    }

    pub fn target(&self) -> Option<&Target> {
        match self {
            Self::CastInPlace(target) | Self::Reach { target, .. } => Some(target),
            Self::Approach { .. } | Self::NoPath => None,
        }
    }
}

/// Priority of a frontier cell: steps so far plus the weighted average
/// distance to every cast cell, scaled by the number of cast cells so it stays
/// integral.
fn search_cost(positions: &CastPositions, cell: Cell, steps: u64, weight: u64) -> u64 {
    let count = positions.len() as u64;
    (steps + 1) * count + weight * positions.total_distance_from(cell)
}

fn rebuild_path(parents: &BTreeMap<Cell, Cell>, start: Cell, end: Cell) -> Vec<Cell> {
    let mut path = vec![end];
    let mut cursor = end;
    while cursor != start {
        match parents.get(&cursor) {
            Some(&parent) => {
                path.push(parent);
                cursor = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Searches a walkable route from the fighter to a cell it can cast from.
///
/// The search is best-first over the cells reachable within the cast
/// positions' radius, skipping `forbidden` cells. The first discovered cast
/// cell wins. When none is reachable the cheapest explored cell (lowest cost,
/// then lowest id) becomes an approach target.
pub fn find_path_to_target(
    env: CombatEnv<'_>,
    spell: &SpellDescriptor,
    targets: &[Target],
    fighter: &Fighter,
    forbidden: &BTreeSet<Cell>,
    config: &PlannerConfig,
) -> PathSearch {
    if targets.is_empty() {
        return PathSearch::NoPath;
    }
    let Some(start) = fighter.cell else {
        return PathSearch::NoPath;
    };

    let map = env.map();
    let positions = find_cast_positions(map, spell, targets, start);
    if positions.is_empty() {
        tracing::debug!("No cast position for {} against {} target(s)", spell.id, targets.len());
        return PathSearch::NoPath;
    }

    if let Some(target) = positions.first_target(start) {
        return PathSearch::CastInPlace(target.clone());
    }

    if fighter.movement_points <= 0 {
        tracing::debug!("{} has no movement point left", fighter.label());
        return PathSearch::NoPath;
    }

    let reachable = map.reachable_cells(fighter, start, positions.radius);
    let weight = config.heuristic_weight;

    let mut frontier = BinaryHeap::new();
    let mut visited = BTreeSet::from([start]);
    let mut parents = BTreeMap::new();
    let mut best: Option<(u64, Cell)> = None;

    frontier.push(Reverse((search_cost(&positions, start, 0, weight), 0u64, start)));

    while let Some(Reverse((_, steps, cell))) = frontier.pop() {
        for next in map.adjacency(cell) {
            if forbidden.contains(&next) || !reachable.contains(&next) || !visited.insert(next) {
                continue;
            }
            parents.insert(next, cell);

            if let Some(target) = positions.first_target(next) {
                let path = rebuild_path(&parents, start, next);
                tracing::debug!(
                    "Reached cast cell {} for target {} in {} step(s)",
                    next,
                    target,
                    path.len() - 1
                );
                return PathSearch::Reach {
                    target: target.clone(),
                    path,
                };
            }

            let cost = search_cost(&positions, next, steps + 1, weight);
            if best.is_none_or(|candidate| (cost, next) < candidate) {
                best = Some((cost, next));
            }
            frontier.push(Reverse((cost, steps + 1, next)));
        }
    }

    match best {
        Some((cost, cell)) => {
            tracing::debug!("No cast cell reachable, approaching through {} (cost {})", cell, cost);
            PathSearch::Approach {
                path: rebuild_path(&parents, start, cell),
            }
        }
        None => PathSearch::NoPath,
    }
}
