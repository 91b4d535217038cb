//! Zone resolution and line-of-sight rasterization.
mod line;
mod zone;

pub use line::{cell_line, has_line_of_sight};
pub use zone::Zone;
