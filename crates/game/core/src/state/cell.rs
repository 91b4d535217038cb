use std::fmt;

use arrayvec::ArrayVec;

/// Number of cells in one half-row of the combat board.
pub const MAP_WIDTH: i32 = 14;
/// Number of full (double) rows of the combat board.
pub const MAP_HEIGHT: i32 = 20;
/// Total number of addressable cells.
pub const CELL_COUNT: u16 = (MAP_WIDTH * MAP_HEIGHT * 2) as u16;

/// Planar coordinates of a cell on the staggered isometric board.
///
/// The board is stored row by row, but adjacency and distance are computed in
/// this rotated coordinate system where each step changes exactly one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true if the point lies on the board.
    pub const fn is_in_map(self) -> bool {
        self.x + self.y >= 0
            && self.x - self.y >= 0
            && self.x - self.y < MAP_HEIGHT * 2
            && self.x + self.y < MAP_WIDTH * 2
    }

    /// Converts the point back to a cell, or `None` when off the board.
    pub fn to_cell(self) -> Option<Cell> {
        if !self.is_in_map() {
            return None;
        }
        let id = (self.x - self.y) * MAP_WIDTH + self.y + (self.x - self.y) / 2;
        Some(Cell(id as u16))
    }

    pub const fn manhattan(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Integer-addressable combat cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Cell(pub u16);

impl Cell {
    /// Offsets of the four cells sharing an edge with a cell.
    const VICINITY: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

    /// Creates a cell, rejecting ids outside the board.
    pub fn new(id: u16) -> Option<Self> {
        (id < CELL_COUNT).then_some(Self(id))
    }

    /// Creates a cell from a signed id as reported by sessions (`-1` = nowhere).
    pub fn from_signed(id: i32) -> Option<Self> {
        u16::try_from(id).ok().and_then(Self::new)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 < CELL_COUNT
    }

    pub const fn point(self) -> Point {
        let id = self.0 as i32;
        let row = id / (MAP_WIDTH * 2);
        let k = id % (MAP_WIDTH * 2);
        if k < MAP_WIDTH {
            Point::new(row + k, k - row)
        } else {
            let b = k - MAP_WIDTH;
            Point::new(row + 1 + b, b - row)
        }
    }

    /// Manhattan distance in board coordinates.
    pub const fn distance(self, other: Cell) -> u32 {
        self.point().manhattan(other.point())
    }

    /// Cells sharing an edge with this one that lie on the board.
    pub fn vicinity(self) -> ArrayVec<Cell, 4> {
        let origin = self.point();
        Self::VICINITY
            .iter()
            .filter_map(|&(dx, dy)| Point::new(origin.x + dx, origin.y + dy).to_cell())
            .collect()
    }

    pub fn is_adjacent(self, other: Cell) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Cell> for Point {
    fn from(cell: Cell) -> Self {
        cell.point()
    }
}
