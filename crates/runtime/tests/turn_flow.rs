use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use combat_core::{
    Cell, CombatError, ErrorSeverity, Fighter, FighterId, MapLayout, Point, SpellDescriptor,
    SpellId, TeamId,
};
use combat_runtime::{
    ActionSession, CommandKind, EngineConfig, Event, Result, RuntimeError, SessionCommand,
    SessionEvent, SessionEventKind, SimulatedFight, Topic, TurnConfig, TurnEngine, TurnEvent,
    TurnId, TurnOutcome, TurnState, session_channel,
};

const SPELL: SpellId = SpellId(161);
const START: Cell = Cell(300);

fn offset(cell: Cell, dx: i32, dy: i32) -> Cell {
    let p = cell.point();
    Point::new(p.x + dx, p.y + dy)
        .to_cell()
        .expect("offset stays on the board")
}

fn spell() -> SpellDescriptor {
    SpellDescriptor::new(SPELL, 1, 1, 2, 3).with_damage(5)
}

fn me() -> Fighter {
    Fighter::new(FighterId(1), TeamId(0), START)
        .with_points(3, 4)
        .named("Iop")
}

fn enemy_at(dx: i32) -> Fighter {
    Fighter::new(FighterId(-1), TeamId(1), offset(START, dx, 0)).named("Tofu")
}

struct Harness {
    fight: Arc<SimulatedFight>,
    engine: TurnEngine,
    tx: mpsc::Sender<SessionEvent>,
}

fn harness(fighters: Vec<Fighter>, layout: MapLayout, config: EngineConfig) -> Harness {
    let (tx, rx) = session_channel(config.event_buffer_size);
    let fight = Arc::new(SimulatedFight::new(layout, vec![spell()], fighters, tx.clone()));
    let engine = TurnEngine::builder()
        .config(config)
        .simulated(fight.clone())
        .events(rx)
        .build()
        .expect("all collaborators are set");
    Harness { fight, engine, tx }
}

fn duel(enemy: Fighter) -> Harness {
    harness(vec![me(), enemy], MapLayout::open(), EngineConfig::default())
}

fn labels(fight: &SimulatedFight) -> Vec<&'static str> {
    fight.commands().iter().map(|c| c.command.label()).collect()
}

/// Enemy already in range: one cast kills it and the turn ends cleanly.
#[tokio::test]
async fn cast_from_current_cell_and_finish() {
    let mut h = duel(enemy_at(2).with_life(5));

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::Success);
    assert_eq!(report.actions_executed, 1);
    assert!(report.end_turn_sent);
    assert_eq!(labels(&h.fight), vec!["cast", "end_turn"]);
    assert_eq!(h.fight.winner(), Some(TeamId(0)));
}

/// Enemy out of range: walk toward it, cast, then stop once AP runs out.
#[tokio::test]
async fn approach_then_cast() {
    let mut h = duel(enemy_at(6));

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(labels(&h.fight), vec!["move", "cast", "end_turn"]);
    assert_eq!(report.actions_executed, 2);
    // The second planning round finds 0 AP left.
    assert_eq!(report.outcome, TurnOutcome::CannotCast);

    let commands = h.fight.commands();
    let SessionCommand::Move { path } = &commands[0].command else {
        panic!("first command should be a move");
    };
    assert_eq!(path.first(), Some(&START));
    assert_eq!(path.len(), 5);
}

/// Retryable cast failures are retried three times, the fourth ends the turn.
#[tokio::test]
async fn retry_budget_is_capped() {
    let mut h = duel(enemy_at(2));
    for _ in 0..4 {
        h.fight.fail_next(CommandKind::Cast, 3, "cast failed");
    }

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::CannotCast);
    assert_eq!(report.retries_used, 3);
    assert_eq!(report.actions_executed, 0);
    assert_eq!(
        labels(&h.fight),
        vec!["cast", "cast", "cast", "cast", "end_turn"]
    );
}

/// A blocked path forbids the reported cell and the replanned path avoids it.
#[tokio::test]
async fn blocked_cell_is_avoided_after_replanning() {
    let fighters = vec![me().with_points(3, 8), enemy_at(6)];
    let mut h = harness(fighters, MapLayout::open(), EngineConfig::default());
    h.fight.fail_next(CommandKind::Move, 2, "path blocked");

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");
    assert_eq!(report.retries_used, 1);

    let commands = h.fight.commands();
    let moves: Vec<&Vec<Cell>> = commands
        .iter()
        .filter_map(|c| match &c.command {
            SessionCommand::Move { path } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(moves.len(), 2);

    let blocked = moves[0][1];
    assert!(!moves[1].contains(&blocked));
    assert_eq!(moves[1].first(), Some(&START));
    assert_eq!(labels(&h.fight)[2], "cast");
}

/// A successful move in between does not refill the retry budget.
#[tokio::test]
async fn retry_budget_spans_the_whole_turn() {
    let fighters = vec![me().with_points(3, 8), enemy_at(6)];
    let mut h = harness(fighters, MapLayout::open(), EngineConfig::default());
    h.fight.fail_next(CommandKind::Move, 2, "path blocked");
    for _ in 0..3 {
        h.fight.fail_next(CommandKind::Cast, 3, "cast failed");
    }

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::CannotCast);
    assert_eq!(report.retries_used, 3);
    assert_eq!(report.actions_executed, 1);
    assert_eq!(
        labels(&h.fight),
        vec!["move", "move", "cast", "cast", "cast", "end_turn"]
    );
}

/// Terminal move failures end the turn with `NoPath` without retrying.
#[tokio::test]
async fn invalid_path_ends_turn() {
    let mut h = duel(enemy_at(6));
    h.fight.fail_next(CommandKind::Move, 5, "invalid path");

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::NoPath);
    assert_eq!(report.retries_used, 0);
    assert_eq!(labels(&h.fight), vec!["move", "end_turn"]);
}

/// Events tagged with another turn are ignored.
#[tokio::test]
async fn stale_events_are_dropped() {
    let mut h = duel(enemy_at(2).with_life(5));
    h.tx
        .send(SessionEvent::new(TurnId(99), SessionEventKind::Disconnected))
        .await
        .expect("channel open");

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::Success);
    assert_eq!(labels(&h.fight), vec!["cast", "end_turn"]);
}

/// A session that is already gone gets nothing sent.
#[tokio::test]
async fn disconnected_session_sends_nothing() {
    let mut h = duel(enemy_at(2));
    h.fight.disconnect();

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::Disconnected);
    assert!(!report.end_turn_sent);
    assert!(h.fight.commands().is_empty());
}

/// Losing the connection while a cast is in flight finishes the turn.
#[tokio::test]
async fn disconnection_mid_turn_skips_end_turn() {
    let mut h = duel(enemy_at(2));
    h.fight.disconnect_on_next_command();

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::Disconnected);
    assert!(!report.end_turn_sent);
    assert_eq!(labels(&h.fight), vec!["cast"]);
}

/// A running sequence is awaited before anything is submitted.
#[tokio::test]
async fn waits_for_running_sequence() {
    let mut h = duel(enemy_at(2).with_life(5));
    let mut turn_events = h.engine.event_bus().subscribe(Topic::Turn);
    h.fight.start_sequence();

    let fight = h.fight.clone();
    let finisher = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(fight.commands().is_empty());
        fight.finish_sequence();
    });

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");
    finisher.await.expect("finisher task");

    assert_eq!(report.outcome, TurnOutcome::Success);

    let mut awaited = false;
    while let Ok(event) = turn_events.try_recv() {
        if let Event::Turn(TurnEvent::StateChanged { to, .. }) = event {
            awaited |= to == TurnState::AwaitingSequence;
        }
    }
    assert!(awaited);
}

/// Fighter dead before its turn: no network action at all.
#[tokio::test]
async fn dead_fighter_does_not_act() {
    let mut h = duel(enemy_at(2));
    h.fight.kill(FighterId(1));

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::PlayerDead);
    assert!(h.fight.commands().is_empty());
}

/// Unknown spell descriptor is an invalid state, not an error.
#[tokio::test]
async fn unknown_spell_is_invalid_state() {
    let mut h = duel(enemy_at(2));

    let report = h
        .engine
        .play_turn(SpellId(9999), 1)
        .await
        .expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::InvalidState);
    assert!(h.fight.commands().is_empty());
}

/// Enemy out of range and no movement left: nothing to target.
#[tokio::test]
async fn unreachable_enemy_means_no_targets() {
    let fighters = vec![me().with_points(3, 0), enemy_at(6)];
    let mut h = harness(fighters, MapLayout::open(), EngineConfig::default());

    let report = h.engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::NoTargets);
    assert_eq!(labels(&h.fight), vec!["end_turn"]);
}

/// Ending a turn twice breaks the state machine invariant.
#[tokio::test]
async fn second_end_turn_is_fatal() {
    let mut h = duel(enemy_at(2));
    let mut turn = h
        .engine
        .start_turn(SPELL, 1)
        .await
        .expect("turn starts");

    let outcome = turn
        .end_turn(TurnOutcome::Success)
        .await
        .expect("first end-of-turn");
    assert_eq!(outcome, TurnOutcome::Success);

    let err = turn
        .end_turn(TurnOutcome::Success)
        .await
        .expect_err("second end-of-turn must fail");
    assert!(matches!(err, RuntimeError::EndTurnAlreadySent { .. }));
    assert_eq!(err.severity(), ErrorSeverity::Fatal);

    let err = turn.run().await.expect_err("planning after end-of-turn");
    assert!(matches!(err, RuntimeError::PlanningAfterEndTurn { .. }));
}

/// Session that accepts commands but never answers them.
struct SilentSession;

#[async_trait]
impl ActionSession for SilentSession {
    async fn submit(&self, _turn: TurnId, _command: SessionCommand) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Unanswered casts time out, are retried, and end the turn once the budget is gone.
#[tokio::test]
async fn unanswered_actions_time_out() {
    let (_tx, rx) = session_channel(8);
    let (sim_tx, _sim_rx) = session_channel(8);
    let fight = Arc::new(SimulatedFight::new(
        MapLayout::open(),
        vec![spell()],
        vec![me(), enemy_at(2)],
        sim_tx,
    ));
    let config = EngineConfig {
        turn: TurnConfig::default().with_action_timeout(Some(Duration::from_millis(20))),
        ..EngineConfig::default()
    };
    let mut engine = TurnEngine::builder()
        .config(config)
        .map(fight.clone())
        .fight(fight)
        .session(Arc::new(SilentSession))
        .events(rx)
        .build()
        .expect("all collaborators are set");

    let report = engine.play_turn(SPELL, 1).await.expect("turn completes");

    assert_eq!(report.outcome, TurnOutcome::CannotCast);
    assert_eq!(report.retries_used, 3);
}

/// Building without a session event stream is rejected.
#[test]
fn builder_requires_every_collaborator() {
    let (tx, _rx) = session_channel(1);
    let fight = Arc::new(SimulatedFight::new(MapLayout::open(), vec![], vec![], tx));
    let result = TurnEngine::builder().simulated(fight).build();
    assert!(matches!(
        result,
        Err(RuntimeError::MissingCollaborator("session event stream"))
    ));
}
