//! Turn planning: from a fight snapshot to an ordered list of actions.
//!
//! Each stage is a plain function over [`CombatEnv`] so it can be exercised on
//! its own:
//!
//! 1. [`acquire_targets`] filters the roster down to attackable fighters.
//! 2. [`find_cast_positions`] lists the cells each target can be hit from.
//! 3. [`find_path_to_target`] searches a walkable route toward one of them.
//! 4. [`analyze_tackle_path`] cuts that route where tackle drains the budget.
//!
//! [`plan_turn`] chains them for every target filter in priority order.
pub mod cast_positions;
pub mod path;
pub mod tackle;
pub mod targets;

use std::collections::BTreeSet;

pub use cast_positions::{CastPositions, find_cast_positions};
pub use path::{PathSearch, find_path_to_target};
pub use tackle::{TackleOutcome, analyze_tackle_path, tackle_factor};
pub use targets::{Target, TargetFilter, acquire_targets};

use crate::config::PlannerConfig;
use crate::env::CombatEnv;
use crate::error::PlanError;
use crate::state::{Cell, Fighter, SpellDescriptor};

/// One step of a turn plan, executed in order against the session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlannedAction {
    /// Walk along the path; the first cell is the current one.
    Move(Vec<Cell>),
    Cast(Target),
    EndTurn,
}

impl PlannedAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Cast(_) => "cast",
            Self::EndTurn => "end_turn",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnPlan {
    Actions(Vec<PlannedAction>),
    /// No filter produced a target that can be reached or hit.
    NoTargets,
}

/// Builds the action list of one decision cycle.
pub fn plan_turn(
    env: CombatEnv<'_>,
    fighter: &Fighter,
    spell: &SpellDescriptor,
    filters: &[TargetFilter],
    forbidden: &BTreeSet<Cell>,
    config: &PlannerConfig,
) -> Result<TurnPlan, PlanError> {
    if fighter.cell.is_none() {
        return Err(PlanError::FighterOffBoard { fighter: fighter.id });
    }
    if spell.ap_cost < 0 {
        return Err(PlanError::InvalidSpellCost {
            spell: spell.id,
            ap_cost: spell.ap_cost,
        });
    }

    for filter in filters {
        let targets = acquire_targets(env, fighter, spell, filter);
        if targets.is_empty() {
            continue;
        }

        let search = find_path_to_target(env, spell, &targets, fighter, forbidden, config);
        match search {
            PathSearch::NoPath => {
                tracing::debug!("No path with filter {:?}, trying the next one", filter);
                continue;
            }
            PathSearch::CastInPlace(target) => {
                tracing::info!("{} casts {} in place on {}", fighter.label(), spell.id, target);
                return Ok(TurnPlan::Actions(vec![PlannedAction::Cast(target)]));
            }
            PathSearch::Reach { .. } | PathSearch::Approach { .. } => {}
        }

        let outcome = analyze_tackle_path(
            search.path(),
            search.target(),
            fighter.movement_points,
            fighter.action_points,
            spell.ap_cost,
            |cell| env.fight().tackle_factor(fighter, cell),
        );

        let mut actions = Vec::with_capacity(2);
        if outcome.usable_path.len() > 1 {
            actions.push(PlannedAction::Move(outcome.usable_path));
        }
        match search.target() {
            Some(target) if outcome.can_hit => actions.push(PlannedAction::Cast(target.clone())),
            _ => actions.push(PlannedAction::EndTurn),
        }

        tracing::info!(
            "{} planned {:?} ({} MP used)",
            fighter.label(),
            actions.iter().map(PlannedAction::kind).collect::<Vec<_>>(),
            outcome.mp_used
        );
        return Ok(TurnPlan::Actions(actions));
    }

    Ok(TurnPlan::NoTargets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{CastCheck, FightOracle, MapLayout};
    use crate::state::{FighterFlags, FighterId, Point, SpellId, TeamId, ZoneShape};

    struct Arena {
        fighters: Vec<Fighter>,
    }

    impl FightOracle for Arena {
        fn active_fighter(&self) -> Option<Fighter> {
            self.fighters.first().cloned()
        }

        fn fighters(&self) -> Vec<Fighter> {
            self.fighters.clone()
        }

        fn spell(&self, _spell: SpellId, _level: u8) -> Option<SpellDescriptor> {
            None
        }

        fn can_cast(&self, _spell: &SpellDescriptor, _target: Option<Cell>) -> CastCheck {
            CastCheck::allowed()
        }
    }

    fn offset(cell: Cell, dx: i32, dy: i32) -> Cell {
        let p = cell.point();
        Point::new(p.x + dx, p.y + dy).to_cell().unwrap()
    }

    fn standard_filters() -> [TargetFilter; 2] {
        [TargetFilter::new(false, None), TargetFilter::new(true, None)]
    }

    fn arena(me: Fighter, enemy: Fighter) -> Arena {
        Arena {
            fighters: vec![me, enemy],
        }
    }

    #[test]
    fn enemy_in_range_and_sight_is_cast_on_directly() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), offset(start, 3, 0));
        let fight = arena(me.clone(), enemy.clone());
        let map = MapLayout::open();
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 5, 3);

        let plan = plan_turn(
            CombatEnv::new(&map, &fight),
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();

        let TurnPlan::Actions(actions) = plan else {
            panic!("expected actions");
        };
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], PlannedAction::Cast(t) if t.fighter == enemy.id));
    }

    #[test]
    fn point_shaped_spell_with_range_is_cast_in_place() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), offset(start, 2, 0));
        let fight = arena(me.clone(), enemy.clone());
        let map = MapLayout::open();
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 5, 3).with_shape(ZoneShape::Point);

        let plan = plan_turn(
            CombatEnv::new(&map, &fight),
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();

        let TurnPlan::Actions(actions) = plan else {
            panic!("expected actions");
        };
        assert_eq!(actions.len(), 1, "unexpected plan {:?}", actions);
        assert!(matches!(&actions[0], PlannedAction::Cast(t) if t.cell == enemy.cell.unwrap()));
    }

    #[test]
    fn distant_enemy_is_approached_then_hit() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start).with_points(6, 4);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), offset(start, 6, 0));
        let fight = arena(me.clone(), enemy);
        let map = MapLayout::open();
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 2, 3);

        let plan = plan_turn(
            CombatEnv::new(&map, &fight),
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();

        let TurnPlan::Actions(actions) = plan else {
            panic!("expected actions");
        };
        assert_eq!(actions.len(), 2);
        let PlannedAction::Move(path) = &actions[0] else {
            panic!("expected a move first, got {:?}", actions[0]);
        };
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.len(), 5);
        assert!(matches!(actions[1], PlannedAction::Cast(_)));
    }

    #[test]
    fn short_on_movement_walks_then_ends_turn() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start).with_points(6, 2);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), offset(start, 6, 0));
        let fight = arena(me.clone(), enemy);
        let map = MapLayout::open();
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 2, 3);

        let plan = plan_turn(
            CombatEnv::new(&map, &fight),
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();

        let TurnPlan::Actions(actions) = plan else {
            panic!("expected actions");
        };
        assert!(matches!(&actions[0], PlannedAction::Move(path) if path.len() == 3));
        assert_eq!(actions[1], PlannedAction::EndTurn);
    }

    #[test]
    fn hidden_line_of_sight_leaves_no_target() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start).with_points(6, 0);
        let enemy_cell = offset(start, 6, 0);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), enemy_cell);
        let fight = arena(me.clone(), enemy);
        let ring: Vec<Cell> = [(1, 0), (0, 1), (-1, 0), (0, -1), (1, 1), (-1, 1), (-1, -1), (1, -1)]
            .into_iter()
            .map(|(dx, dy)| offset(enemy_cell, dx, dy))
            .collect();
        let map = MapLayout::open().with_los_blockers(ring);
        let spell = SpellDescriptor::new(SpellId(161), 1, 3, 3, 3);

        let plan = plan_turn(
            CombatEnv::new(&map, &fight),
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();
        assert_eq!(plan, TurnPlan::NoTargets);
    }

    #[test]
    fn summons_are_only_used_by_the_fallback_filter() {
        let start = Cell(300);
        let me = Fighter::new(FighterId(1), TeamId(0), start);
        let summon = Fighter::new(FighterId(-7), TeamId(1), offset(start, 2, 0))
            .with_flags(FighterFlags::SUMMONED);
        let fight = arena(me.clone(), summon);
        let map = MapLayout::open();
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 5, 3);
        let env = CombatEnv::new(&map, &fight);

        let strict = plan_turn(
            env,
            &me,
            &spell,
            &[TargetFilter::new(false, None)],
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();
        assert_eq!(strict, TurnPlan::NoTargets);

        let plan = plan_turn(
            env,
            &me,
            &spell,
            &standard_filters(),
            &BTreeSet::new(),
            &PlannerConfig::default(),
        )
        .unwrap();
        assert!(matches!(plan, TurnPlan::Actions(ref a) if matches!(a[0], PlannedAction::Cast(_))));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let mut me = Fighter::new(FighterId(1), TeamId(0), Cell(300));
        let enemy = Fighter::new(FighterId(-1), TeamId(1), Cell(310));
        let fight = arena(me.clone(), enemy);
        let map = MapLayout::open();
        let env = CombatEnv::new(&map, &fight);
        let config = PlannerConfig::default();

        let bad_spell = SpellDescriptor::new(SpellId(2), 1, 1, 5, -1);
        assert!(matches!(
            plan_turn(env, &me, &bad_spell, &standard_filters(), &BTreeSet::new(), &config),
            Err(PlanError::InvalidSpellCost { ap_cost: -1, .. })
        ));

        me.cell = None;
        let spell = SpellDescriptor::new(SpellId(2), 1, 1, 5, 3);
        assert!(matches!(
            plan_turn(env, &me, &spell, &standard_filters(), &BTreeSet::new(), &config),
            Err(PlanError::FighterOffBoard { .. })
        ));
    }
}
