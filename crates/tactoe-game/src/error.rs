//! Error types for the game, invitation, and client session layer.

/// Errors that can occur applying a move or resignation to a [`crate::Game`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("it is not this player's turn")]
    OutOfTurn,

    #[error("cell {0} is already occupied")]
    CellOccupied(usize),

    #[error("game has already terminated")]
    AlreadyTerminated,

    #[error("malformed move string: {0:?}")]
    MalformedMove(String),
}

/// Errors that can occur on an [`crate::Invitation`] state transition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvitationError {
    #[error("source and target of an invitation must be different clients")]
    SourceIsTarget,

    #[error("source and target roles must be complementary")]
    RolesNotComplementary,

    #[error("invitation is not in the OPEN state")]
    NotOpen,

    #[error("invitation is not in the OPEN or ACCEPTED state")]
    NotOpenOrAccepted,

    #[error("invitation has a game still in progress")]
    GameInProgress,
}

/// Errors surfaced by [`crate::ClientSession`] operations. Each of these
/// maps to a single NACK back to the client that requested the action
/// (see the top-level service loop's dispatcher).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client is not logged in")]
    NotLoggedIn,

    #[error("client is already logged in")]
    AlreadyLoggedIn,

    #[error(transparent)]
    Registry(#[from] tactoe_registry::RegistryError),

    #[error("target client is not logged in")]
    TargetNotLoggedIn,

    #[error(transparent)]
    Invitation(#[from] InvitationError),

    #[error("no invitation at slot {0}")]
    NoSuchInvitation(u8),

    #[error("invitation at slot {0} does not belong to this client in the required role")]
    WrongEndpoint(u8),

    #[error("invitation at slot {0} has no game in progress")]
    NoGameInProgress(u8),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("client's invitation table is full")]
    TableFull,

    #[error("malformed request payload")]
    MalformedRequest,

    /// Writing to this client's own connection failed. Distinct from the
    /// other variants: those mean "send a NACK", this means the
    /// connection is gone and the service loop should tear it down via
    /// the logout path instead.
    #[error(transparent)]
    Io(#[from] tactoe_transport::TransportError),
}

/// Errors that can occur registering or looking up clients in the
/// [`crate::ClientRegistry`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("client registry is at capacity")]
    Full,

    #[error("connection id is already registered")]
    AlreadyRegistered,

    #[error("connection id is not registered")]
    NotRegistered,
}
