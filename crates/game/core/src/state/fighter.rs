use std::fmt;

use bitflags::bitflags;

use super::Cell;

/// Contextual identifier of a combat participant.
///
/// Monsters carry negative ids in most sessions, players positive ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FighterId(pub i64);

impl fmt::Display for FighterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side a fighter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TeamId(pub u8);

bitflags! {
    /// Status bits carried by a fighter snapshot.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FighterFlags: u8 {
        const DEAD = 1 << 0;
        const HIDDEN = 1 << 1;
        const SUMMONED = 1 << 2;
        /// Ignores tackle entirely (carried, rooted-immune states...).
        const UNTACKLEABLE = 1 << 3;
    }
}

/// Snapshot of a combat participant.
///
/// Owned by the session; the planner only ever reads a copy taken at the start
/// of a decision cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fighter {
    pub id: FighterId,
    pub team: TeamId,
    /// `None` while the fighter is not standing on the board.
    pub cell: Option<Cell>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: FighterFlags,
    pub action_points: i32,
    pub movement_points: i32,
    #[cfg_attr(feature = "serde", serde(default = "Fighter::default_life"))]
    pub life_points: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tackle_block: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tackle_evade: i32,
    /// Visual model class, used to single out objective targets.
    #[cfg_attr(feature = "serde", serde(default = "Fighter::default_bone"))]
    pub bone_id: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
}

impl Fighter {
    pub const DEFAULT_LIFE: i32 = 100;
    pub const DEFAULT_BONE: u16 = 1;

    #[cfg(feature = "serde")]
    fn default_life() -> i32 {
        Self::DEFAULT_LIFE
    }

    #[cfg(feature = "serde")]
    fn default_bone() -> u16 {
        Self::DEFAULT_BONE
    }

    pub fn new(id: FighterId, team: TeamId, cell: Cell) -> Self {
        Self {
            id,
            team,
            cell: Some(cell),
            flags: FighterFlags::empty(),
            action_points: 6,
            movement_points: 3,
            life_points: Self::DEFAULT_LIFE,
            tackle_block: 0,
            tackle_evade: 0,
            bone_id: Self::DEFAULT_BONE,
            name: String::new(),
        }
    }

    pub fn with_points(mut self, action_points: i32, movement_points: i32) -> Self {
        self.action_points = action_points;
        self.movement_points = movement_points;
        self
    }

    pub fn with_flags(mut self, flags: FighterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_tackle(mut self, block: i32, evade: i32) -> Self {
        self.tackle_block = block;
        self.tackle_evade = evade;
        self
    }

    pub fn with_bone(mut self, bone_id: u16) -> Self {
        self.bone_id = bone_id;
        self
    }

    pub fn with_life(mut self, life_points: i32) -> Self {
        self.life_points = life_points;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.flags.contains(FighterFlags::DEAD)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(FighterFlags::HIDDEN)
    }

    pub fn is_summoned(&self) -> bool {
        self.flags.contains(FighterFlags::SUMMONED)
    }

    pub fn is_enemy_of(&self, other: &Fighter) -> bool {
        self.team != other.team
    }

    /// Label used in logs: the name when known, the id otherwise.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            format!("{} ({})", self.name, self.id)
        }
    }
}
