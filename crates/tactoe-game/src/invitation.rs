//! The invitation state machine binding two clients to an (eventual) game.
//!
//! An invitation is born OPEN, naming a source and a target client and
//! the role each will play. It transitions OPEN -> ACCEPTED (creating a
//! Game) or OPEN/ACCEPTED -> CLOSED (terminal). Closing an invitation
//! that has a game still in progress resigns that game on behalf of a
//! given role.

use std::sync::{Arc, Mutex};

use tactoe_protocol::Role;

use crate::{ClientSession, Game, InvitationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationState {
    Open,
    Accepted,
    Closed,
}

struct InvitationInner {
    state: InvitationState,
    game: Option<Arc<Game>>,
}

/// Binds a source and target client to complementary roles, and — once
/// accepted — to a shared [`Game`].
///
/// `source` and `target` are `Arc<ClientSession>`: this is one half of
/// the client<->invitation reference cycle described in the crate's
/// design notes. The cycle is broken explicitly by `close`, which is
/// always reached through `ClientSession::remove_invitation` on both
/// endpoints — never through `Drop`.
pub struct Invitation {
    pub source: Arc<ClientSession>,
    pub source_role: Role,
    pub target: Arc<ClientSession>,
    pub target_role: Role,
    inner: Mutex<InvitationInner>,
}

impl Invitation {
    /// Creates an OPEN invitation. `source` and `target` must be
    /// distinct clients with complementary roles.
    pub fn create(
        source: Arc<ClientSession>,
        target: Arc<ClientSession>,
        source_role: Role,
        target_role: Role,
    ) -> Result<Arc<Self>, InvitationError> {
        if Arc::ptr_eq(&source, &target) {
            return Err(InvitationError::SourceIsTarget);
        }
        if source_role.opposite() != target_role || source_role == Role::None {
            return Err(InvitationError::RolesNotComplementary);
        }

        Ok(Arc::new(Invitation {
            source,
            source_role,
            target,
            target_role,
            inner: Mutex::new(InvitationInner {
                state: InvitationState::Open,
                game: None,
            }),
        }))
    }

    pub fn state(&self) -> InvitationState {
        self.inner.lock().expect("invitation mutex poisoned").state
    }

    pub fn game(&self) -> Option<Arc<Game>> {
        self.inner.lock().expect("invitation mutex poisoned").game.clone()
    }

    /// OPEN -> ACCEPTED, creating a fresh game. X always moves first
    /// regardless of which endpoint plays X.
    pub fn accept(&self) -> Result<Arc<Game>, InvitationError> {
        let mut inner = self.inner.lock().expect("invitation mutex poisoned");
        if inner.state != InvitationState::Open {
            return Err(InvitationError::NotOpen);
        }
        let game = Arc::new(Game::new());
        inner.state = InvitationState::Accepted;
        inner.game = Some(game.clone());
        tracing::info!("invitation accepted, game started");
        Ok(game)
    }

    /// OPEN or ACCEPTED -> CLOSED. If a game is in progress, `role` (the
    /// role of the endpoint initiating the close) must be `Some` and
    /// resigns that game on the caller's behalf. Passing `None` when a
    /// game is still in progress is an error — the caller must decide
    /// who resigns.
    pub fn close(&self, role: Option<Role>) -> Result<(), InvitationError> {
        let mut inner = self.inner.lock().expect("invitation mutex poisoned");
        if !matches!(inner.state, InvitationState::Open | InvitationState::Accepted) {
            return Err(InvitationError::NotOpenOrAccepted);
        }

        if let Some(game) = &inner.game {
            if !game.is_over() {
                match role {
                    Some(r) => {
                        game.resign(r).expect("game was just checked as not over");
                    }
                    None => return Err(InvitationError::GameInProgress),
                }
            }
        }

        inner.state = InvitationState::Closed;
        tracing::info!("invitation closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;
    use tactoe_transport::TcpServer;

    /// Builds a real, connected `ClientSession` for tests that only care
    /// about identity (`Arc::ptr_eq`) and state transitions, not wire
    /// traffic.
    fn dummy_client() -> Arc<ClientSession> {
        let server = TcpServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let _client_end = TcpStream::connect(addr).unwrap();
        let (conn, _addr) = server.accept().unwrap();
        Arc::new(ClientSession::new(Arc::new(conn)))
    }

    #[test]
    fn test_create_rejects_same_client_as_source_and_target() {
        let client = dummy_client();
        let err = Invitation::create(client.clone(), client, Role::X, Role::O).unwrap_err();
        assert!(matches!(err, InvitationError::SourceIsTarget));
    }

    #[test]
    fn test_create_rejects_non_complementary_roles() {
        let a = dummy_client();
        let b = dummy_client();
        let err = Invitation::create(a, b, Role::X, Role::X).unwrap_err();
        assert!(matches!(err, InvitationError::RolesNotComplementary));
    }

    #[test]
    fn test_accept_creates_a_game_and_transitions_to_accepted() {
        let a = dummy_client();
        let b = dummy_client();
        let inv = Invitation::create(a, b, Role::X, Role::O).unwrap();
        let game = inv.accept().unwrap();
        assert_eq!(inv.state(), InvitationState::Accepted);
        assert_eq!(game.to_move(), Role::X);
    }

    #[test]
    fn test_accept_twice_fails() {
        let a = dummy_client();
        let b = dummy_client();
        let inv = Invitation::create(a, b, Role::X, Role::O).unwrap();
        inv.accept().unwrap();
        assert!(matches!(inv.accept(), Err(InvitationError::NotOpen)));
    }

    #[test]
    fn test_close_open_invitation_without_role_succeeds() {
        let a = dummy_client();
        let b = dummy_client();
        let inv = Invitation::create(a, b, Role::X, Role::O).unwrap();
        inv.close(None).unwrap();
        assert_eq!(inv.state(), InvitationState::Closed);
    }

    #[test]
    fn test_close_accepted_invitation_with_game_in_progress_requires_role() {
        let a = dummy_client();
        let b = dummy_client();
        let inv = Invitation::create(a, b, Role::X, Role::O).unwrap();
        inv.accept().unwrap();
        assert!(matches!(
            inv.close(None),
            Err(InvitationError::GameInProgress)
        ));
    }

    #[test]
    fn test_close_accepted_invitation_resigns_game_on_behalf_of_role() {
        let a = dummy_client();
        let b = dummy_client();
        let inv = Invitation::create(a, b, Role::X, Role::O).unwrap();
        let game = inv.accept().unwrap();
        inv.close(Some(Role::X)).unwrap();
        assert!(game.is_over());
        assert_eq!(game.winner(), Role::O);
        assert_eq!(inv.state(), InvitationState::Closed);
    }
}
