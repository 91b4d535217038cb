//! The per-turn state machine.
//!
//! A [`FightTurn`] owns everything scoped to one turn (action queue, forbidden
//! cells, retry budget, end-of-turn guard) and drives the session through an
//! explicit [`TurnState`]. Results of submitted actions arrive as
//! [`SessionEvent`]s; only one action is ever in flight.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use combat_core::{
    Cell, CombatEnv, FightOracle, MapOracle, PlannedAction, SpellDescriptor, SpellId, Target,
    TurnPlan, plan_turn,
};

use super::outcome::{TurnOutcome, TurnReport};
use super::policy::{CastFailure, Failure, MoveFailure, RetryBudget, RetryDecision};
use super::queue::ActionQueue;
use crate::api::{
    ActionResult, ActionSession, Result, RuntimeError, SessionCommand, SessionEvent,
    SessionEventKind, TurnId,
};
use crate::config::TurnConfig;
use crate::events::{ActionEvent, Event, EventBus, TurnEvent};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    Initializing,
    Planning,
    Moving,
    Casting,
    /// Waiting for the session to finish animating a previous action.
    AwaitingSequence,
    EndingTurn,
    Finished,
}

/// Shared collaborators a turn reads from and writes to.
#[derive(Clone, Copy)]
pub struct TurnContext<'a> {
    pub map: &'a dyn MapOracle,
    pub fight: &'a dyn FightOracle,
    pub session: &'a dyn ActionSession,
    pub bus: &'a EventBus,
    pub config: &'a TurnConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expected {
    Move,
    Cast,
}

impl Expected {
    fn timeout_code(self) -> i32 {
        match self {
            Self::Move => MoveFailure::Timeout.code(),
            Self::Cast => CastFailure::Timeout.code(),
        }
    }
}

enum Wait {
    Event(SessionEventKind),
    TimedOut,
    Closed,
}

enum Interrupt {
    Disconnected,
    FighterDied,
}

enum Awaited {
    Result(ActionResult),
    Interrupted(Interrupt),
}

/// One turn of the active fighter, from initialization to end-of-turn.
pub struct FightTurn<'a> {
    id: TurnId,
    spell: SpellId,
    level: u8,
    state: TurnState,
    ctx: TurnContext<'a>,
    events: &'a mut mpsc::Receiver<SessionEvent>,
    queue: ActionQueue,
    forbidden: BTreeSet<Cell>,
    retries: RetryBudget,
    ended: bool,
    end_turn_sent: bool,
    actions_executed: u32,
    message: Option<String>,
}

impl<'a> FightTurn<'a> {
    pub fn new(
        id: TurnId,
        spell: SpellId,
        level: u8,
        ctx: TurnContext<'a>,
        events: &'a mut mpsc::Receiver<SessionEvent>,
    ) -> Self {
        Self {
            id,
            spell,
            level,
            state: TurnState::Idle,
            retries: RetryBudget::new(ctx.config.max_retries),
            ctx,
            events,
            queue: ActionQueue::new(),
            forbidden: BTreeSet::new(),
            ended: false,
            end_turn_sent: false,
            actions_executed: 0,
            message: None,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn forbidden_cells(&self) -> &BTreeSet<Cell> {
        &self.forbidden
    }

    pub fn retries_used(&self) -> u32 {
        self.retries.used()
    }

    /// Plays the turn to completion.
    pub async fn run(mut self) -> Result<TurnReport> {
        self.ctx.bus.publish(Event::Turn(TurnEvent::Started {
            turn: self.id,
            fighter: self.ctx.fight.active_fighter().map(|f| f.id),
        }));

        let outcome = self.drive().await?;
        Ok(self.finish(outcome))
    }

    /// Closes the turn: sends the end-of-turn signal once, when connected.
    ///
    /// The requested outcome is replaced by `PlayerDead` when the fighter died
    /// and by `NoFighterInfo` when the session lost its snapshot. Calling this
    /// twice is an invariant violation.
    pub async fn end_turn(&mut self, outcome: TurnOutcome) -> Result<TurnOutcome> {
        if self.ended {
            error!("End-of-turn requested twice for {}", self.id);
            return Err(RuntimeError::EndTurnAlreadySent { turn: self.id });
        }
        self.ended = true;
        self.transition(TurnState::EndingTurn);

        let outcome = match self.ctx.fight.active_fighter() {
            None => TurnOutcome::NoFighterInfo,
            Some(fighter) if !fighter.is_alive() => TurnOutcome::PlayerDead,
            Some(_) => outcome,
        };

        if self.ctx.session.is_connected() {
            self.ctx.session.submit(self.id, SessionCommand::EndTurn).await?;
            self.end_turn_sent = true;
            info!("{} ended with {}", self.id, outcome);
        } else {
            warn!("{} ended with {} but the session is disconnected", self.id, outcome);
        }

        Ok(outcome)
    }

    async fn drive(&mut self) -> Result<TurnOutcome> {
        self.transition(TurnState::Initializing);

        if !self.ctx.session.is_connected() {
            return Ok(self.settle(TurnOutcome::Disconnected, "session is not connected"));
        }
        let Some(fighter) = self.ctx.fight.active_fighter() else {
            return Ok(self.settle(TurnOutcome::InvalidState, "no active fighter"));
        };
        let Some(spell) = self.ctx.fight.spell(self.spell, self.level) else {
            let message = format!("{} level {} is unknown", self.spell, self.level);
            return Ok(self.settle(TurnOutcome::InvalidState, message));
        };
        if !fighter.is_alive() {
            return Ok(self.settle(TurnOutcome::PlayerDead, "fighter is dead"));
        }

        debug!("{} starts for {} with {}", self.id, fighter.label(), spell.id);

        loop {
            if let Some(outcome) = self.await_sequence().await? {
                return Ok(outcome);
            }

            let Some(action) = self.queue.pop() else {
                if let Some(outcome) = self.plan(&spell).await? {
                    return Ok(outcome);
                }
                continue;
            };

            let step = match action {
                PlannedAction::Move(path) => self.execute_move(path).await?,
                PlannedAction::Cast(target) => self.execute_cast(&spell, target).await?,
                PlannedAction::EndTurn => {
                    Some(self.conclude(TurnOutcome::Success, "plan completed").await?)
                }
            };
            if let Some(outcome) = step {
                return Ok(outcome);
            }
        }
    }

    async fn plan(&mut self, spell: &SpellDescriptor) -> Result<Option<TurnOutcome>> {
        if self.ended {
            error!("Planning requested after end-of-turn for {}", self.id);
            return Err(RuntimeError::PlanningAfterEndTurn { turn: self.id });
        }
        debug_assert!(self.queue.is_empty(), "planning with actions still queued");
        self.transition(TurnState::Planning);

        let Some(fighter) = self.ctx.fight.active_fighter() else {
            return self
                .conclude(TurnOutcome::NoFighterInfo, "fighter snapshot vanished")
                .await
                .map(Some);
        };
        if !fighter.is_alive() {
            return self.conclude(TurnOutcome::PlayerDead, "fighter died").await.map(Some);
        }
        if fighter.cell.is_none() {
            return self
                .conclude(TurnOutcome::NoFighterInfo, "fighter is not on the board")
                .await
                .map(Some);
        }

        let enemies_alive = self
            .ctx
            .fight
            .fighters()
            .iter()
            .any(|other| other.is_enemy_of(&fighter) && other.is_alive());
        if !enemies_alive {
            return self.conclude(TurnOutcome::Success, "no living enemy left").await.map(Some);
        }

        let check = self.ctx.fight.can_cast(spell, None);
        if !check.allowed {
            return self.conclude(TurnOutcome::CannotCast, check.reason).await.map(Some);
        }

        let env = CombatEnv::new(self.ctx.map, self.ctx.fight);
        let filters = self.ctx.config.filters.filters();
        let plan = plan_turn(
            env,
            &fighter,
            spell,
            &filters,
            &self.forbidden,
            &self.ctx.config.planner,
        )?;

        match plan {
            TurnPlan::NoTargets => self
                .conclude(TurnOutcome::NoTargets, "no target reachable with any filter")
                .await
                .map(Some),
            TurnPlan::Actions(actions) => {
                self.ctx.bus.publish(Event::Action(ActionEvent::Planned {
                    turn: self.id,
                    actions: actions.clone(),
                }));
                self.queue.extend(actions);
                debug!("{} queued {} action(s)", self.id, self.queue.len());
                Ok(None)
            }
        }
    }

    async fn execute_move(&mut self, path: Vec<Cell>) -> Result<Option<TurnOutcome>> {
        self.transition(TurnState::Moving);
        let action = PlannedAction::Move(path.clone());
        self.submit(SessionCommand::Move { path }, &action).await?;

        let result = match self.await_result(Expected::Move).await {
            Awaited::Result(result) => result,
            Awaited::Interrupted(interrupt) => return self.interrupted(interrupt).await.map(Some),
        };
        self.publish_resolved(action, &result);

        if result.is_success() {
            self.actions_executed += 1;
            return Ok(None);
        }

        let failure = MoveFailure::from_code(result.code);
        match self.retries.decide(&failure) {
            RetryDecision::Retry => {
                if let Some(cell) = result.blocked_cell() {
                    self.forbidden.insert(cell);
                }
                self.queue.clear();
                self.publish_retry(&failure);
                warn!(
                    "Move failed with {:?} ({}), replanning ({} retries left, {} forbidden cells)",
                    failure,
                    result.message,
                    self.retries.remaining(),
                    self.forbidden.len()
                );
                Ok(None)
            }
            RetryDecision::EndTurn => {
                let message = format!("move failed with {:?}: {}", failure, result.message);
                self.conclude(TurnOutcome::NoPath, message).await.map(Some)
            }
        }
    }

    async fn execute_cast(
        &mut self,
        spell: &SpellDescriptor,
        target: Target,
    ) -> Result<Option<TurnOutcome>> {
        self.transition(TurnState::Casting);
        let command = SessionCommand::Cast {
            spell: spell.id,
            level: spell.level,
            target: target.cell,
        };
        let action = PlannedAction::Cast(target);
        self.submit(command, &action).await?;

        let result = match self.await_result(Expected::Cast).await {
            Awaited::Result(result) => result,
            Awaited::Interrupted(interrupt) => return self.interrupted(interrupt).await.map(Some),
        };
        self.publish_resolved(action, &result);

        if result.is_success() {
            self.actions_executed += 1;
            return Ok(None);
        }

        let failure = CastFailure::from_code(result.code);
        match self.retries.decide(&failure) {
            RetryDecision::Retry => {
                self.queue.clear();
                self.publish_retry(&failure);
                warn!(
                    "Cast failed with {:?} ({}), replanning ({} retries left)",
                    failure,
                    result.message,
                    self.retries.remaining()
                );
                Ok(None)
            }
            RetryDecision::EndTurn => {
                let message = format!("cast failed with {:?}: {}", failure, result.message);
                self.conclude(TurnOutcome::CannotCast, message).await.map(Some)
            }
        }
    }

    async fn submit(&mut self, command: SessionCommand, action: &PlannedAction) -> Result<()> {
        debug!("{} submits {}", self.id, command.label());
        self.ctx.bus.publish(Event::Action(ActionEvent::Submitted {
            turn: self.id,
            action: action.clone(),
        }));
        self.ctx.session.submit(self.id, command).await
    }

    /// Blocks while the session is animating, if it is.
    async fn await_sequence(&mut self) -> Result<Option<TurnOutcome>> {
        if !self.ctx.fight.is_sequence_executing() {
            return Ok(None);
        }

        let resume = self.state;
        self.transition(TurnState::AwaitingSequence);
        loop {
            match self.next_event().await {
                Wait::Event(SessionEventKind::SequenceFinished) => break,
                Wait::TimedOut => {
                    warn!("Sequence still running after timeout, resuming {}", self.id);
                    break;
                }
                Wait::Closed | Wait::Event(SessionEventKind::Disconnected) => {
                    return self.interrupted(Interrupt::Disconnected).await.map(Some);
                }
                Wait::Event(SessionEventKind::FighterDied) if resume == TurnState::Initializing => {
                    return Ok(Some(self.settle(TurnOutcome::PlayerDead, "fighter died")));
                }
                Wait::Event(SessionEventKind::FighterDied) => {
                    return self.interrupted(Interrupt::FighterDied).await.map(Some);
                }
                Wait::Event(other) => debug!("Ignoring {:?} while awaiting sequence end", other),
            }
        }
        self.transition(resume);
        Ok(None)
    }

    async fn await_result(&mut self, expected: Expected) -> Awaited {
        loop {
            match self.next_event().await {
                Wait::Closed => return Awaited::Interrupted(Interrupt::Disconnected),
                Wait::TimedOut => {
                    return Awaited::Result(ActionResult::failure(
                        expected.timeout_code(),
                        "no answer before timeout",
                    ));
                }
                Wait::Event(kind) => match (kind, expected) {
                    (SessionEventKind::MoveResolved(result), Expected::Move)
                    | (SessionEventKind::CastResolved(result), Expected::Cast) => {
                        return Awaited::Result(result);
                    }
                    (SessionEventKind::Disconnected, _) => {
                        return Awaited::Interrupted(Interrupt::Disconnected);
                    }
                    (SessionEventKind::FighterDied, _) => {
                        return Awaited::Interrupted(Interrupt::FighterDied);
                    }
                    (SessionEventKind::SequenceFinished, _) => {
                        debug!("Sequence finished while awaiting {:?} result", expected);
                    }
                    (other, _) => {
                        warn!("Ignoring {:?} while awaiting {:?} result", other, expected);
                    }
                },
            }
        }
    }

    /// Next event of this turn. Events tagged with another turn are dropped.
    async fn next_event(&mut self) -> Wait {
        loop {
            let received = match self.ctx.config.action_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.events.recv()).await {
                    Ok(received) => received,
                    Err(_) => return Wait::TimedOut,
                },
                None => self.events.recv().await,
            };

            let Some(event) = received else {
                return Wait::Closed;
            };
            if event.turn != self.id {
                debug!("Dropping stale {:?} from {} during {}", event.kind, event.turn, self.id);
                continue;
            }
            return Wait::Event(event.kind);
        }
    }

    async fn interrupted(&mut self, interrupt: Interrupt) -> Result<TurnOutcome> {
        match interrupt {
            Interrupt::Disconnected => {
                Ok(self.settle(TurnOutcome::Disconnected, "session disconnected"))
            }
            Interrupt::FighterDied => {
                self.conclude(TurnOutcome::PlayerDead, "fighter died during the turn")
                    .await
            }
        }
    }

    /// Records the reason and ends the turn through the session.
    async fn conclude(
        &mut self,
        outcome: TurnOutcome,
        message: impl Into<String>,
    ) -> Result<TurnOutcome> {
        self.message = Some(message.into());
        self.end_turn(outcome).await
    }

    /// Records the reason without sending anything.
    fn settle(&mut self, outcome: TurnOutcome, message: impl Into<String>) -> TurnOutcome {
        let message = message.into();
        warn!("{} aborted with {}: {}", self.id, outcome, message);
        self.message = Some(message);
        outcome
    }

    fn finish(mut self, outcome: TurnOutcome) -> TurnReport {
        self.transition(TurnState::Finished);
        let report = TurnReport {
            turn: self.id,
            outcome,
            message: self.message.take(),
            actions_executed: self.actions_executed,
            retries_used: self.retries.used(),
            end_turn_sent: self.end_turn_sent,
        };
        info!(
            "{} finished: {} ({} action(s), {} retries)",
            report.turn, report.outcome, report.actions_executed, report.retries_used
        );
        self.ctx.bus.publish(Event::Turn(TurnEvent::Finished(report.clone())));
        report
    }

    fn transition(&mut self, to: TurnState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        debug!("{}: {} -> {}", self.id, from, to);
        self.ctx.bus.publish(Event::Turn(TurnEvent::StateChanged {
            turn: self.id,
            from,
            to,
        }));
    }

    fn publish_resolved(&self, action: PlannedAction, result: &ActionResult) {
        self.ctx.bus.publish(Event::Action(ActionEvent::Resolved {
            turn: self.id,
            action,
            code: result.code,
            message: result.message.clone(),
        }));
    }

    fn publish_retry(&self, failure: &dyn Failure) {
        self.ctx.bus.publish(Event::Action(ActionEvent::RetryScheduled {
            turn: self.id,
            code: failure.code(),
            retries_used: self.retries.used(),
        }));
    }
}
