use std::fmt;

/// Identifier of a spell in the game data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SpellId(pub u32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spell {}", self.0)
    }
}

/// Geometric pattern of the cells a spell can be cast at.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ZoneShape {
    Point,
    Line,
    DiagonalLine,
    #[default]
    Area,
}

/// Read-only spell metadata supplied by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellDescriptor {
    pub id: SpellId,
    pub level: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub range: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_range: u32,
    pub ap_cost: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub shape: ZoneShape,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cast_in_line: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cast_in_diagonal: bool,
    /// Damage dealt on hit. Only consulted by simulated sessions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_damage: i32,
}

impl SpellDescriptor {
    pub fn new(id: SpellId, level: u8, min_range: u32, range: u32, ap_cost: i32) -> Self {
        Self {
            id,
            level,
            name: String::new(),
            range,
            min_range,
            ap_cost,
            shape: ZoneShape::Area,
            cast_in_line: false,
            cast_in_diagonal: false,
            base_damage: 0,
        }
    }

    pub fn with_shape(mut self, shape: ZoneShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn in_line(mut self, in_line: bool, in_diagonal: bool) -> Self {
        self.cast_in_line = in_line;
        self.cast_in_diagonal = in_diagonal;
        self
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.base_damage = damage;
        self
    }

    /// Range actually used for zone resolution; never below the minimum range.
    pub fn effective_range(&self) -> u32 {
        self.range.max(self.min_range)
    }
}
