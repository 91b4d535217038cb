use std::collections::BTreeSet;

use crate::state::{Cell, Point, SpellDescriptor, ZoneShape};

const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Set of cells a spell can be aimed from, relative to a centre cell.
///
/// Ranges are symmetric, so the zone around a target is exactly the set of
/// cells a caster could stand on to reach it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// Only the centre cell.
    Point,
    /// Straight rays from the centre.
    Cross {
        min_range: u32,
        range: u32,
        orthogonal: bool,
        diagonal: bool,
    },
    /// Every cell whose distance lies between the two ranges (a diamond).
    Lozenge { min_range: u32, range: u32 },
}

impl Zone {
    /// Resolves the cast zone of a spell from its shape and line flags.
    pub fn for_spell(spell: &SpellDescriptor) -> Self {
        let min_range = spell.min_range;
        let range = spell.effective_range();
        let in_line = spell.cast_in_line || spell.shape == ZoneShape::Line;
        let in_diagonal = spell.cast_in_diagonal || spell.shape == ZoneShape::DiagonalLine;

        if in_line {
            Zone::Cross {
                min_range,
                range,
                orthogonal: true,
                diagonal: spell.cast_in_diagonal,
            }
        } else if in_diagonal {
            Zone::Cross {
                min_range,
                range,
                orthogonal: false,
                diagonal: true,
            }
        } else if range == 0 {
            Zone::Point
        } else {
            Zone::Lozenge { min_range, range }
        }
    }

    /// Enumerates the on-board cells of the zone centred on `center`.
    pub fn cells(&self, center: Cell) -> BTreeSet<Cell> {
        let origin = center.point();
        let mut cells = BTreeSet::new();

        match *self {
            Zone::Point => {
                cells.insert(center);
            }
            Zone::Cross {
                min_range,
                range,
                orthogonal,
                diagonal,
            } => {
                if min_range == 0 {
                    cells.insert(center);
                }
                let directions = ORTHOGONAL
                    .iter()
                    .filter(|_| orthogonal)
                    .chain(DIAGONAL.iter().filter(|_| diagonal));
                for &(dx, dy) in directions {
                    for step in min_range.max(1)..=range {
                        let step = step as i32;
                        let point = Point::new(origin.x + dx * step, origin.y + dy * step);
                        if let Some(cell) = point.to_cell() {
                            cells.insert(cell);
                        }
                    }
                }
            }
            Zone::Lozenge { min_range, range } => {
                let reach = range as i32;
                for dx in -reach..=reach {
                    let rest = reach - dx.abs();
                    for dy in -rest..=rest {
                        let distance = (dx.abs() + dy.abs()) as u32;
                        if distance < min_range {
                            continue;
                        }
                        if let Some(cell) = Point::new(origin.x + dx, origin.y + dy).to_cell() {
                            cells.insert(cell);
                        }
                    }
                }
            }
        }

        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SpellId;

    fn spell(min_range: u32, range: u32) -> SpellDescriptor {
        SpellDescriptor::new(SpellId(1), 1, min_range, range, 3)
    }

    #[test]
    fn lozenge_respects_both_ranges() {
        let center = Cell(300);
        let cells = Zone::for_spell(&spell(2, 3)).cells(center);
        assert!(!cells.is_empty());
        assert!(cells.iter().all(|c| (2..=3).contains(&center.distance(*c))));
        // Full ring sizes away from edges: 8 cells at distance 2, 12 at distance 3.
        assert_eq!(cells.len(), 20);
    }

    #[test]
    fn line_spells_resolve_to_orthogonal_cross() {
        let zone = Zone::for_spell(&spell(1, 4).in_line(true, false));
        let center = Cell(300);
        let cells = zone.cells(center);
        let origin = center.point();
        assert!(cells.iter().all(|c| {
            let p = c.point();
            p.x == origin.x || p.y == origin.y
        }));
        assert!(!cells.contains(&center));
    }

    #[test]
    fn diagonal_shape_resolves_to_diagonal_cross() {
        let zone = Zone::for_spell(&spell(0, 2).with_shape(ZoneShape::DiagonalLine));
        assert_eq!(
            zone,
            Zone::Cross {
                min_range: 0,
                range: 2,
                orthogonal: false,
                diagonal: true
            }
        );
        let center = Cell(300);
        let cells = zone.cells(center);
        assert!(cells.contains(&center));
        assert_eq!(cells.len(), 9);
    }

    #[test]
    fn range_below_min_range_is_raised() {
        let zone = Zone::for_spell(&spell(3, 1));
        assert_eq!(
            zone,
            Zone::Lozenge {
                min_range: 3,
                range: 3
            }
        );
    }

    #[test]
    fn zero_range_is_a_point() {
        let center = Cell(120);
        let cells = Zone::for_spell(&spell(0, 0)).cells(center);
        assert_eq!(cells.into_iter().collect::<Vec<_>>(), vec![center]);
    }

    #[test]
    fn point_shape_with_range_is_a_lozenge() {
        let zone = Zone::for_spell(&spell(1, 5).with_shape(ZoneShape::Point));
        assert_eq!(zone, Zone::Lozenge { min_range: 1, range: 5 });
    }
}
