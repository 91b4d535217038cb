//! Turn-by-turn replay of a scenario against the simulated fight.
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;

use combat_core::{CombatError, FightOracle, TeamId};
use combat_runtime::{Scenario, TurnEngine, TurnOutcome, TurnReport, session_channel};

use crate::config::ClientConfig;

/// What happened during a replay.
#[derive(Debug)]
pub struct ReplaySummary {
    pub reports: Vec<TurnReport>,
    pub winner: Option<TeamId>,
}

/// Plays `scenario` until one team is left standing or `max_turns` is reached.
pub async fn replay(scenario: Scenario, config: &ClientConfig) -> Result<ReplaySummary> {
    let engine_config = config.engine_config();
    let (tx, rx) = session_channel(engine_config.event_buffer_size);
    let fight = Arc::new(scenario.clone().into_simulation(tx));
    let mut engine = TurnEngine::builder()
        .config(engine_config)
        .simulated(fight.clone())
        .events(rx)
        .build()?;

    tracing::info!("Replaying '{}' for at most {} turns", scenario.name, config.max_turns);

    let mut reports = Vec::new();
    for _ in 0..config.max_turns {
        if fight.winner().is_some() {
            break;
        }
        let active = fight
            .active_fighter()
            .context("no living fighter left to play")?;
        let (spell, level) = scenario
            .spell_for(active.id)
            .with_context(|| format!("fighter {} has no spell assigned", active.id))?;

        let report = match engine.play_turn(spell, level).await {
            Ok(report) => report,
            Err(err) if err.severity().is_recoverable() => {
                tracing::warn!("Turn aborted by the session ({}): {}", err.error_code(), err);
                break;
            }
            Err(err) => {
                if err.severity().is_internal() {
                    tracing::error!("Engine invariant broken ({}): {}", err.error_code(), err);
                }
                return Err(err.into());
            }
        };
        tracing::info!(
            "{} of {}: {} ({} actions, {} retries)",
            report.turn,
            active.label(),
            report.outcome,
            report.actions_executed,
            report.retries_used
        );
        if config.report_json {
            print_report(&report, &active.label())?;
        }

        let handed_over = report.end_turn_sent;
        let disconnected = report.outcome == TurnOutcome::Disconnected;
        reports.push(report);

        if !handed_over {
            if disconnected {
                tracing::warn!("Session lost, stopping the replay");
                break;
            }
            fight.advance_turn();
        }
    }

    let winner = fight.winner();
    match winner {
        Some(team) => tracing::info!("Team {} wins after {} turns", team.0, reports.len()),
        None => tracing::info!("No winner after {} turns", reports.len()),
    }

    Ok(ReplaySummary { reports, winner })
}

fn print_report(report: &TurnReport, fighter: &str) -> Result<()> {
    let line = json!({
        "fighter": fighter,
        "code": report.outcome.code(),
        "report": report,
    });
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

/// Loads the configured scenario and replays it.
pub async fn run(config: &ClientConfig) -> Result<ReplaySummary> {
    let scenario = Scenario::load_from_file(&config.scenario)
        .with_context(|| format!("cannot load scenario {}", config.scenario.display()))?;
    replay(scenario, config).await
}
