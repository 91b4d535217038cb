//! High-level turn engine.
//!
//! The engine owns the collaborators and the session event stream, hands out
//! turn ids and exposes a builder-based API for clients to play turns.

use std::sync::Arc;

use tokio::sync::mpsc;

use combat_core::{FightOracle, MapOracle, SpellId};

use crate::api::{ActionSession, Result, RuntimeError, SessionEvent, TurnId};
use crate::config::EngineConfig;
use crate::events::EventBus;
use crate::session::SimulatedFight;
use crate::turn::{FightTurn, TurnContext, TurnReport};

/// Plays turns of whichever fighter the session reports as active.
pub struct TurnEngine {
    config: EngineConfig,
    map: Arc<dyn MapOracle>,
    fight: Arc<dyn FightOracle>,
    session: Arc<dyn ActionSession>,
    events: mpsc::Receiver<SessionEvent>,
    bus: EventBus,
    last_turn: TurnId,
}

impl TurnEngine {
    /// Create a new engine builder
    pub fn builder() -> TurnEngineBuilder {
        TurnEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cloneable handle on the engine's event bus.
    pub fn event_bus(&self) -> EventBus {
        self.bus.clone()
    }

    pub fn last_turn(&self) -> TurnId {
        self.last_turn
    }

    /// Opens a new turn without playing it.
    pub async fn start_turn(&mut self, spell: SpellId, level: u8) -> Result<FightTurn<'_>> {
        self.last_turn = self.last_turn.next();
        let turn = self.last_turn;
        self.session.begin_turn(turn).await?;

        let ctx = TurnContext {
            map: self.map.as_ref(),
            fight: self.fight.as_ref(),
            session: self.session.as_ref(),
            bus: &self.bus,
            config: &self.config.turn,
        };
        Ok(FightTurn::new(turn, spell, level, ctx, &mut self.events))
    }

    /// Plays one full turn of the active fighter with the given spell.
    pub async fn play_turn(&mut self, spell: SpellId, level: u8) -> Result<TurnReport> {
        self.start_turn(spell, level).await?.run().await
    }
}

/// Builder for [`TurnEngine`].
pub struct TurnEngineBuilder {
    config: EngineConfig,
    map: Option<Arc<dyn MapOracle>>,
    fight: Option<Arc<dyn FightOracle>>,
    session: Option<Arc<dyn ActionSession>>,
    events: Option<mpsc::Receiver<SessionEvent>>,
}

impl TurnEngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            map: None,
            fight: None,
            session: None,
            events: None,
        }
    }

    /// Override engine configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn map(mut self, map: Arc<dyn MapOracle>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn fight(mut self, fight: Arc<dyn FightOracle>) -> Self {
        self.fight = Some(fight);
        self
    }

    pub fn session(mut self, session: Arc<dyn ActionSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Receiving end of the channel the session answers on.
    pub fn events(mut self, events: mpsc::Receiver<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses one simulated fight for the map, the fight and the session.
    pub fn simulated(self, fight: Arc<SimulatedFight>) -> Self {
        self.map(fight.clone()).fight(fight.clone()).session(fight)
    }

    pub fn build(self) -> Result<TurnEngine> {
        let map = self.map.ok_or(RuntimeError::MissingCollaborator("map"))?;
        let fight = self.fight.ok_or(RuntimeError::MissingCollaborator("fight"))?;
        let session = self
            .session
            .ok_or(RuntimeError::MissingCollaborator("session"))?;
        let events = self
            .events
            .ok_or(RuntimeError::MissingCollaborator("session event stream"))?;

        let bus = EventBus::with_capacity(self.config.event_buffer_size);

        Ok(TurnEngine {
            config: self.config,
            map,
            fight,
            session,
            events,
            bus,
            last_turn: TurnId::default(),
        })
    }
}
