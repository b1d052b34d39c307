//! Handle to the [`GameState`] of a match, shared by both links and the orchestrator.
//!
//! Every mutation goes through the same mutex and is followed by a [`Field`] snapshot published
//! on a `watch` channel, so a board renderer can follow the match live.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::game_state::{Command, Field, GameState, Outcome, Side, Vision};

/// Cloneable handle to the state of one match.
#[derive(Debug, Clone)]
pub struct SharedGame {
    state: Arc<Mutex<GameState>>,
    updates: Arc<watch::Sender<Field>>,
}

impl SharedGame {
    /// Share `state`.
    pub fn new(state: GameState) -> Self {
        let (updates, _) = watch::channel(state.field());
        SharedGame {
            state: Arc::new(Mutex::new(state)),
            updates: Arc::new(updates),
        }
    }

    /// Replace the whole state, e.g. with a freshly loaded map before the match starts.
    pub fn replace(&self, state: GameState) {
        self.mutate(|game| *game = state);
    }

    /// Receiver notified after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Field> {
        self.updates.subscribe()
    }

    /// Execute a bot command (see [`GameState::apply_command`]).
    pub fn apply_command(&self, command: Command, side: Side) -> Vision {
        self.mutate(|game| game.apply_command(command, side))
    }

    /// See [`GameState::set_forced_winner`].
    pub fn set_forced_winner(&self, side: Side) {
        self.mutate(|game| game.set_forced_winner(side));
    }

    /// Surroundings of `side`'s own position.
    pub fn vision_for(&self, side: Side) -> Vision {
        let game = self.lock();
        game.vision_around(game.position_of(side), side)
    }

    /// Surroundings of `side`, flagged as a finished match whatever the board says.
    pub fn final_vision(&self, side: Side) -> Vision {
        self.vision_for(side).into_decided()
    }

    /// See [`GameState::winner`].
    pub fn winner(&self) -> Option<Side> {
        self.lock().winner()
    }

    /// See [`GameState::outcome`].
    pub fn outcome(&self) -> Outcome {
        self.lock().outcome()
    }

    /// Number of turn pairs of the match.
    pub fn turn_budget(&self) -> u32 {
        self.lock().turn_budget()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.lock().clone()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut GameState) -> T) -> T {
        let mut game = self.lock();
        let result = f(&mut game);
        self.updates.send_replace(game.field());
        result
    }

    fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedGame {
    fn default() -> Self {
        SharedGame::new(GameState::default())
    }
}
