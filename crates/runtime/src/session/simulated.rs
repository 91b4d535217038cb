//! In-memory fight session.
//!
//! [`SimulatedFight`] plays the game server's role: it owns the fighters,
//! validates moves and casts the way a server would, answers on the session
//! event channel and rotates turns. Failures can be scripted to exercise the
//! retry paths.
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use combat_core::{
    CastCheck, Cell, FightOracle, Fighter, FighterFlags, FighterId, MapLayout, MapOracle,
    SpellDescriptor, SpellId, TeamId, Zone,
};

use crate::api::{
    ActionResult, ActionSession, ResultDetails, Result, RuntimeError, SessionCommand,
    SessionEvent, SessionEventKind, TurnId,
};
use crate::turn::{CastFailure, Failure, MoveFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Move,
    Cast,
}

/// A failure returned for the next matching command instead of executing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedFailure {
    pub command: CommandKind,
    pub code: i32,
    pub message: String,
}

/// A command received by the session, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRecord {
    pub turn: TurnId,
    pub command: SessionCommand,
}

/// Board view over the layout and the fighters standing on it.
///
/// Living fighters can't be walked through and block sight lines.
struct Board<'a> {
    layout: &'a MapLayout,
    fighters: &'a [Fighter],
}

impl Board<'_> {
    fn occupied(&self, cell: Cell) -> bool {
        self.fighters
            .iter()
            .any(|f| f.is_alive() && f.cell == Some(cell))
    }
}

impl MapOracle for Board<'_> {
    fn is_walkable(&self, cell: Cell) -> bool {
        self.layout.is_walkable(cell) && !self.occupied(cell)
    }

    fn point_los(&self, cell: Cell) -> bool {
        self.layout.point_los(cell) && !self.occupied(cell)
    }
}

struct FightState {
    fighters: Vec<Fighter>,
    base_points: BTreeMap<FighterId, (i32, i32)>,
    active: Option<usize>,
    turn: TurnId,
    connected: bool,
    sequence_executing: bool,
    disconnect_on_next_command: bool,
    scripted: VecDeque<ScriptedFailure>,
    log: Vec<CommandRecord>,
}

impl FightState {
    fn active_fighter(&self) -> Option<&Fighter> {
        self.active.and_then(|index| self.fighters.get(index))
    }

    fn take_scripted(&mut self, kind: CommandKind) -> Option<ScriptedFailure> {
        let index = self.scripted.iter().position(|s| s.command == kind)?;
        self.scripted.remove(index)
    }
}

pub struct SimulatedFight {
    layout: MapLayout,
    spells: Vec<SpellDescriptor>,
    state: Mutex<FightState>,
    events: mpsc::Sender<SessionEvent>,
}

impl SimulatedFight {
    /// Creates a fight; the first living fighter plays first.
    pub fn new(
        layout: MapLayout,
        spells: Vec<SpellDescriptor>,
        fighters: Vec<Fighter>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let base_points = fighters
            .iter()
            .map(|f| (f.id, (f.action_points, f.movement_points)))
            .collect();
        let active = fighters.iter().position(Fighter::is_alive);

        Self {
            layout,
            spells,
            state: Mutex::new(FightState {
                fighters,
                base_points,
                active,
                turn: TurnId::default(),
                connected: true,
                sequence_executing: false,
                disconnect_on_next_command: false,
                scripted: VecDeque::new(),
                log: Vec::new(),
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, turn: TurnId, kind: SessionEventKind) {
        if let Err(err) = self.events.try_send(SessionEvent::new(turn, kind)) {
            tracing::warn!("Simulated session could not emit event: {}", err);
        }
    }

    pub fn layout(&self) -> &MapLayout {
        &self.layout
    }

    /// Makes the next move or cast fail with `code` instead of executing.
    pub fn fail_next(&self, command: CommandKind, code: i32, message: impl Into<String>) {
        self.lock().scripted.push_back(ScriptedFailure {
            command,
            code,
            message: message.into(),
        });
    }

    /// Drops the connection right away and notifies the engine.
    pub fn disconnect(&self) {
        let turn = {
            let mut state = self.lock();
            state.connected = false;
            state.turn
        };
        self.emit(turn, SessionEventKind::Disconnected);
    }

    /// Drops the connection when the next command arrives, leaving it unanswered.
    pub fn disconnect_on_next_command(&self) {
        self.lock().disconnect_on_next_command = true;
    }

    pub fn start_sequence(&self) {
        self.lock().sequence_executing = true;
    }

    pub fn finish_sequence(&self) {
        let turn = {
            let mut state = self.lock();
            state.sequence_executing = false;
            state.turn
        };
        self.emit(turn, SessionEventKind::SequenceFinished);
    }

    /// Kills a fighter; the engine is told when it is the active one.
    pub fn kill(&self, id: FighterId) {
        let (turn, was_active) = {
            let mut state = self.lock();
            let active = state.active_fighter().map(|f| f.id);
            if let Some(fighter) = state.fighters.iter_mut().find(|f| f.id == id) {
                fighter.flags.insert(FighterFlags::DEAD);
                fighter.life_points = 0;
            }
            (state.turn, active == Some(id))
        };
        if was_active {
            self.emit(turn, SessionEventKind::FighterDied);
        }
    }

    /// Every command received so far.
    pub fn commands(&self) -> Vec<CommandRecord> {
        self.lock().log.clone()
    }

    /// The only team with living fighters, once the fight is decided.
    pub fn winner(&self) -> Option<TeamId> {
        let state = self.lock();
        let mut alive = state.fighters.iter().filter(|f| f.is_alive()).map(|f| f.team);
        let first = alive.next()?;
        alive.all(|team| team == first).then_some(first)
    }

    /// Hands the turn to the next living fighter without an end-of-turn command.
    pub fn advance_turn(&self) {
        Self::rotate(&mut self.lock());
    }

    fn rotate(state: &mut FightState) {
        let count = state.fighters.len();
        let current = state.active.unwrap_or(count.saturating_sub(1));
        let next = (1..=count)
            .map(|offset| (current + offset) % count)
            .find(|&index| state.fighters[index].is_alive());

        state.active = next;
        if let Some(index) = next {
            let fighter = &mut state.fighters[index];
            if let Some(&(ap, mp)) = state.base_points.get(&fighter.id) {
                fighter.action_points = ap;
                fighter.movement_points = mp;
            }
            tracing::debug!("Simulated fight hands the turn to {}", fighter.label());
        }
    }

    fn resolve_move(&self, state: &mut FightState, path: &[Cell]) -> ActionResult {
        if let Some(scripted) = state.take_scripted(CommandKind::Move) {
            let mut result = ActionResult::failure(scripted.code, scripted.message);
            if MoveFailure::from_code(scripted.code) == MoveFailure::PathBlocked {
                result = result.with_details(ResultDetails {
                    blocked_cell: path.get(1).copied(),
                    stopped_at: path.first().copied(),
                });
            }
            return result;
        }

        let Some(index) = state.active else {
            return ActionResult::failure(MoveFailure::NoFighterPosition.code(), "no active fighter");
        };
        let fighter = &state.fighters[index];
        let Some(start) = fighter.cell else {
            return ActionResult::failure(
                MoveFailure::NoFighterPosition.code(),
                "fighter has no position",
            );
        };

        if path.len() < 2 || path[0] != start {
            return ActionResult::failure(
                MoveFailure::InvalidPath.code(),
                "path must start on the fighter cell",
            );
        }
        if path.windows(2).any(|pair| !pair[0].is_adjacent(pair[1])) {
            return ActionResult::failure(MoveFailure::InvalidPath.code(), "path is not contiguous");
        }

        let steps = (path.len() - 1) as i32;
        if steps > fighter.movement_points {
            return ActionResult::failure(
                MoveFailure::InsufficientMovementPoints.code(),
                format!("{} steps with {} MP", steps, fighter.movement_points),
            );
        }

        let board = Board {
            layout: &self.layout,
            fighters: &state.fighters,
        };
        if let Some(&blocked) = path[1..].iter().find(|&&cell| !board.is_walkable(cell)) {
            return ActionResult::failure(MoveFailure::PathBlocked.code(), "cell is blocked")
                .with_details(ResultDetails {
                    blocked_cell: Some(blocked),
                    stopped_at: Some(start),
                });
        }

        let end = path[path.len() - 1];
        let fighter = &mut state.fighters[index];
        fighter.cell = Some(end);
        fighter.movement_points -= steps;
        ActionResult::success().with_details(ResultDetails {
            blocked_cell: None,
            stopped_at: Some(end),
        })
    }

    fn resolve_cast(
        &self,
        state: &mut FightState,
        spell: SpellId,
        level: u8,
        target: Cell,
    ) -> ActionResult {
        if let Some(scripted) = state.take_scripted(CommandKind::Cast) {
            return ActionResult::failure(scripted.code, scripted.message);
        }

        let Some(index) = state.active else {
            return ActionResult::failure(CastFailure::NoFighterPosition.code(), "no active fighter");
        };
        let Some(origin) = state.fighters[index].cell else {
            return ActionResult::failure(
                CastFailure::NoFighterPosition.code(),
                "fighter has no position",
            );
        };
        let Some(descriptor) = self.find_spell(spell, level) else {
            return ActionResult::failure(CastFailure::CannotCast.code(), "unknown spell");
        };
        if state.fighters[index].action_points < descriptor.ap_cost {
            return ActionResult::failure(CastFailure::CannotCast.code(), "not enough action points");
        }

        let board = Board {
            layout: &self.layout,
            fighters: &state.fighters,
        };
        let in_zone = Zone::for_spell(descriptor).cells(target).contains(&origin);
        if !in_zone || !board.has_line_of_sight(target, origin) {
            return ActionResult::failure(
                CastFailure::NoLineOfSight.code(),
                format!("cell {} is out of range or sight", target),
            );
        }

        state.fighters[index].action_points -= descriptor.ap_cost;
        if let Some(victim) = state
            .fighters
            .iter_mut()
            .find(|f| f.is_alive() && f.cell == Some(target))
        {
            victim.life_points -= descriptor.base_damage;
            tracing::debug!(
                "{} takes {} damage, {} life left",
                victim.label(),
                descriptor.base_damage,
                victim.life_points
            );
            if victim.life_points <= 0 {
                victim.flags.insert(FighterFlags::DEAD);
            }
        }
        ActionResult::success()
    }

    fn find_spell(&self, spell: SpellId, level: u8) -> Option<&SpellDescriptor> {
        self.spells
            .iter()
            .find(|s| s.id == spell && s.level == level)
    }
}

impl MapOracle for SimulatedFight {
    fn is_walkable(&self, cell: Cell) -> bool {
        let state = self.lock();
        Board {
            layout: &self.layout,
            fighters: &state.fighters,
        }
        .is_walkable(cell)
    }

    fn point_los(&self, cell: Cell) -> bool {
        let state = self.lock();
        Board {
            layout: &self.layout,
            fighters: &state.fighters,
        }
        .point_los(cell)
    }
}

impl FightOracle for SimulatedFight {
    fn active_fighter(&self) -> Option<Fighter> {
        self.lock().active_fighter().cloned()
    }

    fn fighters(&self) -> Vec<Fighter> {
        self.lock().fighters.clone()
    }

    fn spell(&self, spell: SpellId, level: u8) -> Option<SpellDescriptor> {
        self.find_spell(spell, level).cloned()
    }

    fn can_cast(&self, spell: &SpellDescriptor, target: Option<Cell>) -> CastCheck {
        let state = self.lock();
        let Some(fighter) = state.active_fighter().filter(|f| f.is_alive()) else {
            return CastCheck::denied("no living active fighter");
        };
        if fighter.action_points < spell.ap_cost {
            return CastCheck::denied(format!(
                "{} AP left, {} needed",
                fighter.action_points, spell.ap_cost
            ));
        }
        if target.is_some_and(|cell| !cell.is_valid()) {
            return CastCheck::denied("target cell is off the board");
        }
        CastCheck::allowed()
    }

    fn is_sequence_executing(&self) -> bool {
        self.lock().sequence_executing
    }
}

#[async_trait]
impl ActionSession for SimulatedFight {
    async fn begin_turn(&self, turn: TurnId) -> Result<()> {
        self.lock().turn = turn;
        Ok(())
    }

    async fn submit(&self, turn: TurnId, command: SessionCommand) -> Result<()> {
        let reply = {
            let mut state = self.lock();
            if !state.connected {
                return Err(RuntimeError::Session("simulated session is disconnected".into()));
            }
            state.log.push(CommandRecord {
                turn,
                command: command.clone(),
            });

            if state.disconnect_on_next_command {
                state.disconnect_on_next_command = false;
                state.connected = false;
                Some(SessionEventKind::Disconnected)
            } else {
                match command {
                    SessionCommand::Move { path } => {
                        Some(SessionEventKind::MoveResolved(self.resolve_move(&mut state, &path)))
                    }
                    SessionCommand::Cast {
                        spell,
                        level,
                        target,
                    } => Some(SessionEventKind::CastResolved(
                        self.resolve_cast(&mut state, spell, level, target),
                    )),
                    SessionCommand::EndTurn => {
                        Self::rotate(&mut state);
                        None
                    }
                }
            }
        };

        if let Some(kind) = reply {
            self.events
                .send(SessionEvent::new(turn, kind))
                .await
                .map_err(|_| RuntimeError::Session("session event channel closed".into()))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session_channel;
    use combat_core::Point;

    fn offset(cell: Cell, dx: i32, dy: i32) -> Cell {
        let p = cell.point();
        Point::new(p.x + dx, p.y + dy).to_cell().unwrap()
    }

    fn duel() -> (SimulatedFight, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = session_channel(16);
        let me = Fighter::new(FighterId(1), TeamId(0), Cell(300)).with_points(6, 3);
        let enemy = Fighter::new(FighterId(-1), TeamId(1), offset(Cell(300), 3, 0)).with_life(10);
        let spell = SpellDescriptor::new(SpellId(161), 1, 1, 4, 3).with_damage(6);
        (
            SimulatedFight::new(MapLayout::open(), vec![spell], vec![me, enemy], tx),
            rx,
        )
    }

    async fn answer(rx: &mut mpsc::Receiver<SessionEvent>) -> ActionResult {
        match rx.recv().await.map(|e| e.kind) {
            Some(SessionEventKind::MoveResolved(r)) | Some(SessionEventKind::CastResolved(r)) => r,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn move_spends_movement_points() {
        let (fight, mut rx) = duel();
        let path = vec![Cell(300), offset(Cell(300), 1, 0)];
        fight
            .submit(TurnId(1), SessionCommand::Move { path: path.clone() })
            .await
            .unwrap();

        assert!(answer(&mut rx).await.is_success());
        let me = fight.active_fighter().unwrap();
        assert_eq!(me.cell, Some(path[1]));
        assert_eq!(me.movement_points, 2);
    }

    #[tokio::test]
    async fn move_through_a_fighter_is_blocked() {
        let (fight, mut rx) = duel();
        let path: Vec<Cell> = (0..=3).map(|dx| offset(Cell(300), dx, 0)).collect();
        fight
            .submit(TurnId(1), SessionCommand::Move { path: path.clone() })
            .await
            .unwrap();

        let result = answer(&mut rx).await;
        assert_eq!(result.code, MoveFailure::PathBlocked.code());
        assert_eq!(result.blocked_cell(), Some(path[3]));
    }

    #[tokio::test]
    async fn cast_damages_and_kills() {
        let (fight, mut rx) = duel();
        let target = offset(Cell(300), 3, 0);
        for _ in 0..2 {
            fight
                .submit(
                    TurnId(1),
                    SessionCommand::Cast {
                        spell: SpellId(161),
                        level: 1,
                        target,
                    },
                )
                .await
                .unwrap();
            assert!(answer(&mut rx).await.is_success());
        }

        assert_eq!(fight.winner(), Some(TeamId(0)));
        let me = fight.active_fighter().unwrap();
        assert_eq!(me.action_points, 0);
    }

    #[tokio::test]
    async fn end_turn_rotates_and_restores_points() {
        let (fight, _rx) = duel();
        fight
            .submit(
                TurnId(1),
                SessionCommand::Move {
                    path: vec![Cell(300), offset(Cell(300), 0, 1)],
                },
            )
            .await
            .unwrap();
        fight.submit(TurnId(1), SessionCommand::EndTurn).await.unwrap();
        assert_eq!(fight.active_fighter().map(|f| f.id), Some(FighterId(-1)));

        fight.submit(TurnId(2), SessionCommand::EndTurn).await.unwrap();
        let me = fight.active_fighter().unwrap();
        assert_eq!(me.id, FighterId(1));
        assert_eq!(me.movement_points, 3);
        assert_eq!(fight.commands().len(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_replaces_execution() {
        let (fight, mut rx) = duel();
        fight.fail_next(CommandKind::Cast, CastFailure::CastFailed.code(), "server hiccup");
        fight
            .submit(
                TurnId(1),
                SessionCommand::Cast {
                    spell: SpellId(161),
                    level: 1,
                    target: offset(Cell(300), 3, 0),
                },
            )
            .await
            .unwrap();

        let result = answer(&mut rx).await;
        assert_eq!(result.code, 3);
        assert_eq!(fight.active_fighter().unwrap().action_points, 6);
    }
}
