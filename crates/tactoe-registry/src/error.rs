//! Error types for the player registry.

/// Errors that can occur while registering a player.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The login name was empty. Any non-empty name is otherwise accepted.
    #[error("username must not be empty")]
    EmptyUsername,
}
