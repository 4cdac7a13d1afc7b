//! The persistent-store collaborator contract.
//!
//! The protocol reads the local state once when a token arrives and writes
//! once when it has been applied; that single write is the only commit point.
//! How and where states persist (browser storage, a file, a database row) is
//! the embedding application's concern — it implements [`StateStore`] and the
//! core never sees storage lifecycles or cleanup policies.

use std::collections::HashMap;

use crate::state::GameId;
use crate::state::GameState;
use crate::GameSpec;

/// Keyed persistence for game states, one entry per game instance.
pub trait StateStore<G: GameSpec> {
    /// Loads the state stored for `game_id`, if any.
    fn load(&self, game_id: &GameId) -> Option<GameState<G>>;

    /// Stores `state` under `game_id`, replacing any previous entry.
    fn save(&mut self, game_id: &GameId, state: GameState<G>);
}

/// In-memory [`StateStore`], for tests and short-lived embedders.
#[derive(Debug, Clone)]
pub struct MemoryStore<G: GameSpec> {
    states: HashMap<String, GameState<G>>,
}

impl<G: GameSpec> MemoryStore<G> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }
}

impl<G: GameSpec> Default for MemoryStore<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GameSpec> StateStore<G> for MemoryStore<G> {
    fn load(&self, game_id: &GameId) -> Option<GameState<G>> {
        self.states.get(game_id.as_str()).cloned()
    }

    fn save(&mut self, game_id: &GameId, state: GameState<G>) {
        self.states.insert(game_id.as_str().to_string(), state);
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::games::chain::ChainGame;
    use crate::state::Participant;

    #[test]
    fn save_then_load_roundtrips() {
        let game_id = GameId::new("g-store");
        let state =
            GameState::<ChainGame>::new(game_id.clone(), Participant::new("p1", "A")).unwrap();

        let mut store = MemoryStore::new();
        assert!(store.load(&game_id).is_none());

        store.save(&game_id, state.clone());
        assert_eq!(store.load(&game_id), Some(state));
    }

    #[test]
    fn save_replaces_the_previous_entry() {
        let game_id = GameId::new("g-store");
        let state =
            GameState::<ChainGame>::new(game_id.clone(), Participant::new("p1", "A")).unwrap();
        let joined = state
            .clone()
            .with_guest(Participant::new("p2", "B"))
            .unwrap();

        let mut store = MemoryStore::new();
        store.save(&game_id, state);
        store.save(&game_id, joined.clone());
        assert_eq!(store.load(&game_id), Some(joined));
    }
}
