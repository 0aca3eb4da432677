//! Registry of managed games.
//!
//! Owns every active game behind an `Arc<Mutex<_>>`, so one game's tick
//! never blocks another's and all access to a single game is serialised.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use super::service::ManagedGame;

/// Shared map from game id to managed game. Lifecycle is explicit:
/// games are inserted at creation and removed by `remove` or `reap_idle`.
#[derive(Default)]
pub struct GameRegistry {
    games: RwLock<HashMap<String, Arc<Mutex<ManagedGame>>>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, game_id: String, game: ManagedGame) -> Arc<Mutex<ManagedGame>> {
        let entry = Arc::new(Mutex::new(game));
        self.games.write().insert(game_id, entry.clone());
        entry
    }

    pub fn get(&self, game_id: &str) -> Option<Arc<Mutex<ManagedGame>>> {
        self.games.read().get(game_id).cloned()
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.games.read().contains_key(game_id)
    }

    pub fn remove(&self, game_id: &str) -> bool {
        self.games.write().remove(game_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }

    /// Drop games whose last activity is older than `max_age`.
    /// Returns the number of games reaped.
    pub fn reap_idle(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let stale: Vec<String> = {
            let games = self.games.read();
            games
                .iter()
                .filter(|(_, game)| now - game.lock().last_activity > max_age)
                .map(|(id, _)| id.clone())
                .collect()
        };

        if !stale.is_empty() {
            let mut games = self.games.write();
            for id in &stale {
                games.remove(id);
            }
            info!(count = stale.len(), "reaped idle games");
        }
        stale.len()
    }
}
