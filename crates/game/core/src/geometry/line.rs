use crate::env::MapOracle;
use crate::state::{Cell, Point};

/// Rasterizes the straight segment between two cells.
///
/// The start cell is excluded and the end cell included, so the returned line
/// is empty when both cells are the same.
pub fn cell_line(from: Cell, to: Cell) -> Vec<Cell> {
    let start = from.point();
    let end = to.point();

    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let sx = if start.x < end.x { 1 } else { -1 };
    let sy = if start.y < end.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (start.x, start.y);

    let mut line = Vec::with_capacity((dx - dy) as usize);
    while x != end.x || y != end.y {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        if let Some(cell) = Point::new(x, y).to_cell() {
            line.push(cell);
        }
    }
    line
}

/// Returns true when nothing between `from` and `to` obstructs the view.
///
/// Both endpoints are ignored: the caster and whatever stands on the aimed
/// cell never block their own line.
pub fn has_line_of_sight<M>(map: &M, from: Cell, to: Cell) -> bool
where
    M: MapOracle + ?Sized,
{
    let line = cell_line(from, to);
    match line.split_last() {
        Some((_, between)) => between.iter().all(|&cell| map.point_los(cell)),
        None => true,
    }
}
