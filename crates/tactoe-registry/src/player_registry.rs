//! The player registry: a process-wide map from username to `Player`.
//!
//! Entries are created on first login and never removed — there is no
//! persistence across restarts, so "never removed" just means "lives as
//! long as the process does." Lookup is case-sensitive, exact match.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Player, RegistryError};

/// Maps usernames to the `Player` identities that have logged in with
/// them.
pub struct PlayerRegistry {
    players: Mutex<HashMap<String, Arc<Player>>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        PlayerRegistry {
            players: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the `Player` for `username`, creating one at
    /// [`crate::INITIAL_RATING`] if this is the first time it's been seen.
    ///
    /// # Errors
    /// Returns [`RegistryError::EmptyUsername`] if `username` is empty —
    /// any *non-empty* username logs in, per the login policy.
    pub fn register(&self, username: &str) -> Result<Arc<Player>, RegistryError> {
        if username.is_empty() {
            return Err(RegistryError::EmptyUsername);
        }

        let mut players = self.players.lock().expect("player registry mutex poisoned");
        if let Some(player) = players.get(username) {
            return Ok(player.clone());
        }

        let player = Arc::new(Player::new(username.to_string()));
        players.insert(username.to_string(), player.clone());
        tracing::info!(username, "player registered");
        Ok(player)
    }

    /// Looks up an existing player by exact username, without creating one.
    pub fn lookup(&self, username: &str) -> Option<Arc<Player>> {
        self.players
            .lock()
            .expect("player registry mutex poisoned")
            .get(username)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.players.lock().expect("player registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_creates_player_at_initial_rating() {
        let registry = PlayerRegistry::new();
        let alice = registry.register("alice").unwrap();
        assert_eq!(alice.rating(), crate::INITIAL_RATING);
    }

    #[test]
    fn test_register_twice_returns_same_player() {
        let registry = PlayerRegistry::new();
        let a1 = registry.register("alice").unwrap();
        let a2 = registry.register("alice").unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
    }

    #[test]
    fn test_register_rejects_empty_username() {
        let registry = PlayerRegistry::new();
        assert!(matches!(
            registry.register(""),
            Err(RegistryError::EmptyUsername)
        ));
    }

    #[test]
    fn test_lookup_is_case_sensitive_exact_match() {
        let registry = PlayerRegistry::new();
        registry.register("Alice").unwrap();
        assert!(registry.lookup("Alice").is_some());
        assert!(registry.lookup("alice").is_none());
    }

    #[test]
    fn test_lookup_missing_username_returns_none() {
        let registry = PlayerRegistry::new();
        assert!(registry.lookup("nobody").is_none());
    }
}
