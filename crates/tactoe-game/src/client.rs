//! The client session — the nerve center of the server.
//!
//! A `ClientSession` is one connection's state: whether it's logged in,
//! the slot table of invitations it currently holds, and the connection
//! itself (which doubles as the send-serialization point — see
//! `tactoe_transport::TcpConnection::send_frame`). All cross-client
//! operations here (inviting, revoking, accepting, moving) acquire the
//! two clients' invitation-table locks in a fixed order — by connection
//! id, ascending — to prevent deadlock between two threads racing to
//! touch the same pair of clients from opposite ends.

use std::sync::{Arc, Mutex, MutexGuard};

use tactoe_protocol::{Frame, MessageType, Role};
use tactoe_registry::{GameResult, Player, PlayerRegistry};
use tactoe_transport::{ConnectionId, TcpConnection};

use crate::{ClientError, ClientRegistry, Game, Invitation, InvitationState};

#[derive(Clone)]
struct InvitationSlot {
    invitation: Arc<Invitation>,
    role: Role,
}

/// Per-connection session state.
pub struct ClientSession {
    conn: Arc<TcpConnection>,
    player: Mutex<Option<Arc<Player>>>,
    invitations: Mutex<Vec<Option<InvitationSlot>>>,
}

impl ClientSession {
    pub fn new(conn: Arc<TcpConnection>) -> Self {
        ClientSession {
            conn,
            player: Mutex::new(None),
            invitations: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Blocks until a complete request frame arrives, or an error/EOF
    /// ends the connection.
    pub fn recv_frame(&self) -> Result<Frame, tactoe_transport::TransportError> {
        self.conn.recv_frame()
    }

    /// Half-closes the underlying connection, unblocking a thread
    /// parked in [`Self::recv_frame`].
    pub fn shutdown(&self) -> Result<(), tactoe_transport::TransportError> {
        self.conn.shutdown()
    }

    /// Sends a bare NACK — the service loop's response to any protocol-
    /// state violation that doesn't itself tear down the connection.
    pub fn send_nack(&self) -> Result<(), tactoe_transport::TransportError> {
        self.conn.send_frame(&Frame::nack())
    }

    pub fn is_logged_in(&self) -> bool {
        self.player.lock().expect("player mutex poisoned").is_some()
    }

    pub fn player(&self) -> Option<Arc<Player>> {
        self.player.lock().expect("player mutex poisoned").clone()
    }

    pub fn username(&self) -> Option<String> {
        self.player().map(|p| p.username())
    }

    fn require_logged_in(&self) -> Result<(), ClientError> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::NotLoggedIn)
        }
    }

    /// Looks up the invitation and this client's role at `slot_id`.
    fn invitation_at(&self, slot_id: u8) -> Result<(Arc<Invitation>, Role), ClientError> {
        let table = self.invitations.lock().expect("invitation table mutex poisoned");
        table
            .get(slot_id as usize)
            .and_then(|entry| entry.as_ref())
            .map(|slot| (slot.invitation.clone(), slot.role))
            .ok_or(ClientError::NoSuchInvitation(slot_id))
    }

    /// `LOGIN`: attaches `username`'s player to this session. Fails if
    /// already logged in here, or if the username is already logged in
    /// on another connection.
    pub fn login(
        self: &Arc<Self>,
        username: &str,
        players: &PlayerRegistry,
        clients: &ClientRegistry,
    ) -> Result<(), ClientError> {
        if self.is_logged_in() {
            return Err(ClientError::AlreadyLoggedIn);
        }
        if clients.lookup(username).is_some() {
            return Err(ClientError::AlreadyLoggedIn);
        }
        let player = players.register(username)?;
        *self.player.lock().expect("player mutex poisoned") = Some(player);
        tracing::info!(username, %self, "client logged in");
        self.conn.send_frame(&Frame::ack(0)).map_err(ClientError::Io)
    }

    /// `USERS`: lists every currently logged-in player as `name\trating`
    /// lines.
    pub fn users(&self, registry: &ClientRegistry) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let mut payload = String::new();
        for player in registry.all_players() {
            payload.push_str(&format!("{}\t{}\n", player.username(), player.rating()));
        }
        self.conn
            .send_frame(&Frame::ack_with(0, Role::None, payload.into_bytes()))
            .map_err(ClientError::Io)
    }

    /// `INVITE`: creates an OPEN invitation naming `self` as source,
    /// `target` as target, and pushes `INVITED` to the target.
    pub fn make_invitation(
        self: &Arc<Self>,
        target: &Arc<ClientSession>,
        src_role: Role,
        tgt_role: Role,
    ) -> Result<(), ClientError> {
        self.require_logged_in()?;
        if !target.is_logged_in() {
            return Err(ClientError::TargetNotLoggedIn);
        }

        let inv = Invitation::create(self.clone(), target.clone(), src_role, tgt_role)?;

        let (self_id, target_id) = {
            let (mut self_table, mut target_table) = lock_pair(self, target);
            let live = |table: &[Option<InvitationSlot>]| table.iter().filter(|e| e.is_some()).count();
            if live(&self_table) >= 256 || live(&target_table) >= 256 {
                return Err(ClientError::TableFull);
            }
            let self_id = alloc_slot(
                &mut self_table,
                InvitationSlot { invitation: inv.clone(), role: src_role },
            );
            let target_id = alloc_slot(
                &mut target_table,
                InvitationSlot { invitation: inv.clone(), role: tgt_role },
            );
            (self_id, target_id)
        };

        let source_username = self.username().unwrap_or_default();
        let push = Frame::new(
            MessageType::Invited,
            target_id,
            tgt_role,
            Some(source_username.into_bytes()),
        );
        if let Err(e) = target.conn.send_frame(&push) {
            tracing::warn!(error = %e, "failed to push INVITED to peer");
        }

        self.conn.send_frame(&Frame::ack(self_id)).map_err(ClientError::Io)
    }

    /// `REVOKE`: closes an OPEN invitation this client is the source of,
    /// pushing `REVOKED` to the target.
    pub fn revoke_invitation(self: &Arc<Self>, slot_id: u8) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let (inv, _role) = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(&inv.source, self) {
            return Err(ClientError::WrongEndpoint(slot_id));
        }
        inv.close(None)?;
        let (_src, tgt_slot) = remove_from_both(&inv);
        if let Some(t) = tgt_slot {
            let push = Frame::new(MessageType::Revoked, t, Role::None, None);
            if let Err(e) = inv.target.conn.send_frame(&push) {
                tracing::warn!(error = %e, "failed to push REVOKED to peer");
            }
        }
        self.conn.send_frame(&Frame::ack(0)).map_err(ClientError::Io)
    }

    /// `DECLINE`: closes an OPEN invitation this client is the target
    /// of, pushing `DECLINED` to the source.
    pub fn decline_invitation(self: &Arc<Self>, slot_id: u8) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let (inv, _role) = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(&inv.target, self) {
            return Err(ClientError::WrongEndpoint(slot_id));
        }
        inv.close(None)?;
        let (src_slot, _tgt) = remove_from_both(&inv);
        if let Some(s) = src_slot {
            let push = Frame::new(MessageType::Declined, s, Role::None, None);
            if let Err(e) = inv.source.conn.send_frame(&push) {
                tracing::warn!(error = %e, "failed to push DECLINED to peer");
            }
        }
        self.conn.send_frame(&Frame::ack(0)).map_err(ClientError::Io)
    }

    /// `ACCEPT`: transitions an OPEN invitation this client is the
    /// target of into ACCEPTED, starting a game, and pushes `ACCEPTED`
    /// to the source. Whichever endpoint plays X receives the initial
    /// board — as this client's ACK payload if it plays X, or as the
    /// source's push payload if the source plays X.
    pub fn accept_invitation(self: &Arc<Self>, slot_id: u8) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let (inv, self_role) = self.invitation_at(slot_id)?;
        if !Arc::ptr_eq(&inv.target, self) {
            return Err(ClientError::WrongEndpoint(slot_id));
        }
        let game = inv.accept()?;
        let board = game.unparse_state();

        let ack_payload = (self_role == Role::X).then(|| board.clone().into_bytes());
        let ack = Frame::new(MessageType::Ack, slot_id, self_role, ack_payload);

        if let Some(src_slot) = find_slot(&inv.source, &inv) {
            let push_payload = (inv.source_role == Role::X).then(|| board.into_bytes());
            let push = Frame::new(MessageType::Accepted, src_slot, Role::None, push_payload);
            if let Err(e) = inv.source.conn.send_frame(&push) {
                tracing::warn!(error = %e, "failed to push ACCEPTED to peer");
            }
        }

        self.conn.send_frame(&ack).map_err(ClientError::Io)
    }

    /// `MOVE`: applies a move to the game behind an ACCEPTED invitation.
    /// Pushes `MOVED` to the peer, and if the move ends the game, also
    /// posts the rating update, closes the invitation, and pushes
    /// `ENDED` to the peer and then to self.
    pub fn make_move(self: &Arc<Self>, slot_id: u8, move_str: &str) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let (inv, self_role) = self.invitation_at(slot_id)?;
        if inv.state() != InvitationState::Accepted {
            return Err(ClientError::NoGameInProgress(slot_id));
        }
        let game = inv.game().ok_or(ClientError::NoGameInProgress(slot_id))?;

        let mv = Game::parse_move(self_role, move_str)?;
        game.apply_move(mv)?;
        let new_state = game.unparse_state();

        let is_source = Arc::ptr_eq(&inv.source, self);
        let peer = if is_source { &inv.target } else { &inv.source };
        if let Some(peer_slot) = find_slot(peer, &inv) {
            let push = Frame::new(
                MessageType::Moved,
                peer_slot,
                Role::None,
                Some(new_state.into_bytes()),
            );
            if let Err(e) = peer.conn.send_frame(&push) {
                tracing::warn!(error = %e, "failed to push MOVED to peer");
            }
        }

        self.conn.send_frame(&Frame::ack(slot_id)).map_err(ClientError::Io)?;

        if game.is_over() {
            let _ = inv.close(None);
            post_game_result(&inv);
            let winner = game.winner();
            let (src_slot, tgt_slot) = remove_from_both(&inv);
            let (peer_slot, self_slot) = if is_source {
                (tgt_slot, src_slot)
            } else {
                (src_slot, tgt_slot)
            };
            if let Some(p) = peer_slot {
                let ended = Frame::new(MessageType::Ended, p, winner, None);
                if let Err(e) = peer.conn.send_frame(&ended) {
                    tracing::warn!(error = %e, "failed to push ENDED to peer");
                }
            }
            if let Some(s) = self_slot {
                let ended = Frame::new(MessageType::Ended, s, winner, None);
                if let Err(e) = self.conn.send_frame(&ended) {
                    tracing::warn!(error = %e, "failed to push ENDED to self");
                }
            }
        }

        Ok(())
    }

    /// `RESIGN`: resigns the game behind an ACCEPTED invitation on this
    /// client's role, posts the rating update, closes the invitation,
    /// and pushes `ENDED` to the peer.
    pub fn resign_game(self: &Arc<Self>, slot_id: u8) -> Result<(), ClientError> {
        self.require_logged_in()?;
        let (inv, self_role) = self.invitation_at(slot_id)?;
        if inv.state() != InvitationState::Accepted {
            return Err(ClientError::NoGameInProgress(slot_id));
        }
        let game = inv.game().ok_or(ClientError::NoGameInProgress(slot_id))?;
        if game.is_over() {
            return Err(ClientError::NoGameInProgress(slot_id));
        }

        inv.close(Some(self_role))?;
        post_game_result(&inv);
        let winner = game.winner();

        let is_source = Arc::ptr_eq(&inv.source, self);
        let (src_slot, tgt_slot) = remove_from_both(&inv);
        let (peer, peer_slot) = if is_source {
            (&inv.target, tgt_slot)
        } else {
            (&inv.source, src_slot)
        };
        if let Some(p) = peer_slot {
            let ended = Frame::new(MessageType::Ended, p, winner, None);
            if let Err(e) = peer.conn.send_frame(&ended) {
                tracing::warn!(error = %e, "failed to push ENDED to peer");
            }
        }

        self.conn.send_frame(&Frame::ack(0)).map_err(ClientError::Io)
    }

    /// Tears down this session: closes every invitation it still holds
    /// (pushing REVOKED/DECLINED/ENDED to the relevant peers as above),
    /// and detaches its player. Called when the connection observes EOF
    /// or an unrecoverable I/O error, never in response to a wire
    /// request — there is no client-initiated LOGOUT message.
    pub fn logout(self: &Arc<Self>) {
        if !self.is_logged_in() {
            return;
        }

        let entries: Vec<(Arc<Invitation>, Role)> = {
            let table = self.invitations.lock().expect("invitation table mutex poisoned");
            table
                .iter()
                .filter_map(|entry| entry.as_ref().map(|slot| (slot.invitation.clone(), slot.role)))
                .collect()
        };

        for (inv, role) in entries {
            let is_source = Arc::ptr_eq(&inv.source, self);
            match inv.state() {
                InvitationState::Open => {
                    if inv.close(None).is_ok() {
                        let (src_slot, tgt_slot) = remove_from_both(&inv);
                        if is_source {
                            if let Some(t) = tgt_slot {
                                let push = Frame::new(MessageType::Revoked, t, Role::None, None);
                                let _ = inv.target.conn.send_frame(&push);
                            }
                        } else if let Some(s) = src_slot {
                            let push = Frame::new(MessageType::Declined, s, Role::None, None);
                            let _ = inv.source.conn.send_frame(&push);
                        }
                    }
                }
                InvitationState::Accepted => {
                    if inv.close(Some(role)).is_ok() {
                        post_game_result(&inv);
                        let winner = inv.game().map(|g| g.winner()).unwrap_or(Role::None);
                        let (src_slot, tgt_slot) = remove_from_both(&inv);
                        let (peer, peer_slot) = if is_source {
                            (&inv.target, tgt_slot)
                        } else {
                            (&inv.source, src_slot)
                        };
                        if let Some(p) = peer_slot {
                            let push = Frame::new(MessageType::Ended, p, winner, None);
                            let _ = peer.conn.send_frame(&push);
                        }
                    }
                }
                InvitationState::Closed => {}
            }
        }

        *self.player.lock().expect("player mutex poisoned") = None;
        self.invitations.lock().expect("invitation table mutex poisoned").clear();
        tracing::info!(%self, "client logged out");
    }
}

impl std::fmt::Display for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Locks `a`'s and `b`'s invitation tables in ascending-connection-id
/// order, but always returns `(guard_for_a, guard_for_b)` regardless of
/// which was actually locked first — mirroring
/// `tactoe_registry::post_result`'s lock-ordering pattern.
fn lock_pair<'a>(
    a: &'a ClientSession,
    b: &'a ClientSession,
) -> (
    MutexGuard<'a, Vec<Option<InvitationSlot>>>,
    MutexGuard<'a, Vec<Option<InvitationSlot>>>,
) {
    if a.id() <= b.id() {
        let ga = a.invitations.lock().expect("invitation table mutex poisoned");
        let gb = b.invitations.lock().expect("invitation table mutex poisoned");
        (ga, gb)
    } else {
        let gb = b.invitations.lock().expect("invitation table mutex poisoned");
        let ga = a.invitations.lock().expect("invitation table mutex poisoned");
        (ga, gb)
    }
}

/// Takes the lowest free slot in `table`, growing it if every existing
/// slot is occupied.
fn alloc_slot(table: &mut Vec<Option<InvitationSlot>>, slot: InvitationSlot) -> u8 {
    for (i, entry) in table.iter_mut().enumerate() {
        if entry.is_none() {
            *entry = Some(slot);
            return i as u8;
        }
    }
    table.push(Some(slot));
    (table.len() - 1) as u8
}

/// Finds `client`'s slot index for `inv`, if it still holds one.
fn find_slot(client: &ClientSession, inv: &Arc<Invitation>) -> Option<u8> {
    let table = client.invitations.lock().expect("invitation table mutex poisoned");
    table.iter().position(|entry| {
        entry
            .as_ref()
            .is_some_and(|slot| Arc::ptr_eq(&slot.invitation, inv))
    }).map(|i| i as u8)
}

/// Removes `inv` from both its source's and target's slot tables,
/// returning the slot indices it occupied (source, target).
fn remove_from_both(inv: &Arc<Invitation>) -> (Option<u8>, Option<u8>) {
    let (mut src_table, mut tgt_table) = lock_pair(&inv.source, &inv.target);
    let src_slot = take_slot(&mut src_table, inv);
    let tgt_slot = take_slot(&mut tgt_table, inv);
    (src_slot, tgt_slot)
}

fn take_slot(table: &mut [Option<InvitationSlot>], inv: &Arc<Invitation>) -> Option<u8> {
    for (i, entry) in table.iter_mut().enumerate() {
        if entry.as_ref().is_some_and(|slot| Arc::ptr_eq(&slot.invitation, inv)) {
            *entry = None;
            return Some(i as u8);
        }
    }
    None
}

/// Posts the Elo rating update for `inv`'s game, if it has one. Safe to
/// call exactly once per invitation, right after the `close` call that
/// transitions it out of ACCEPTED — which happens at most once, since
/// `Invitation::close` fails on an invitation already CLOSED.
fn post_game_result(inv: &Invitation) {
    let Some(game) = inv.game() else { return };
    let (Some(p1), Some(p2)) = (inv.source.player(), inv.target.player()) else {
        return;
    };
    let result = match game.winner() {
        Role::None => GameResult::Draw,
        w if w == inv.source_role => GameResult::FirstWon,
        _ => GameResult::SecondWon,
    };
    tactoe_registry::post_result(&p1, &p2, result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;
    use tactoe_transport::TcpServer;

    struct Harness {
        server: TcpServer,
    }

    impl Harness {
        fn new() -> Self {
            Harness { server: TcpServer::bind("127.0.0.1:0").unwrap() }
        }

        fn connect(&self) -> (Arc<ClientSession>, TcpStream) {
            let addr = self.server.local_addr().unwrap();
            let client_end = TcpStream::connect(addr).unwrap();
            let (conn, _addr) = self.server.accept().unwrap();
            (Arc::new(ClientSession::new(Arc::new(conn))), client_end)
        }
    }

    #[test]
    fn test_login_rejects_empty_username() {
        let harness = Harness::new();
        let (client, _end) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        let err = client.login("", &players, &clients).unwrap_err();
        assert!(matches!(err, ClientError::Registry(_)));
    }

    #[test]
    fn test_login_twice_on_same_session_fails() {
        let harness = Harness::new();
        let (client, _end) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        client.login("alice", &players, &clients).unwrap();
        assert!(matches!(
            client.login("alice", &players, &clients),
            Err(ClientError::AlreadyLoggedIn)
        ));
    }

    #[test]
    fn test_login_rejects_username_already_connected_elsewhere() {
        let harness = Harness::new();
        let (alice1, _e1) = harness.connect();
        let (alice2, _e2) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        clients.register(alice1.clone()).unwrap();
        alice1.login("alice", &players, &clients).unwrap();
        assert!(matches!(
            alice2.login("alice", &players, &clients),
            Err(ClientError::AlreadyLoggedIn)
        ));
    }

    #[test]
    fn test_full_invite_accept_move_cycle_ends_game_and_updates_ratings() {
        let harness = Harness::new();
        let (alice, _ea) = harness.connect();
        let (bob, _eb) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        clients.register(alice.clone()).unwrap();
        clients.register(bob.clone()).unwrap();
        alice.login("alice", &players, &clients).unwrap();
        bob.login("bob", &players, &clients).unwrap();

        alice.make_invitation(&bob, Role::X, Role::O).unwrap();
        bob.accept_invitation(0).unwrap();

        // alice(X): 0, bob(O): 3, alice: 1, bob: 4, alice: 2 -> X wins top row
        alice.make_move(0, "1").unwrap();
        bob.make_move(0, "4").unwrap();
        alice.make_move(0, "2").unwrap();
        bob.make_move(0, "5").unwrap();
        alice.make_move(0, "3").unwrap();

        let alice_player = alice.player().unwrap();
        let bob_player = bob.player().unwrap();
        assert_eq!(alice_player.rating(), tactoe_registry::INITIAL_RATING + 16);
        assert_eq!(bob_player.rating(), tactoe_registry::INITIAL_RATING - 16);
    }

    #[test]
    fn test_revoke_frees_slot_for_reuse() {
        let harness = Harness::new();
        let (alice, _ea) = harness.connect();
        let (bob, _eb) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        clients.register(alice.clone()).unwrap();
        clients.register(bob.clone()).unwrap();
        alice.login("alice", &players, &clients).unwrap();
        bob.login("bob", &players, &clients).unwrap();

        alice.make_invitation(&bob, Role::X, Role::O).unwrap();
        alice.revoke_invitation(0).unwrap();
        alice.make_invitation(&bob, Role::X, Role::O).unwrap();
        // slot 0 on alice's side should have been reused.
        assert!(alice.invitation_at(0).is_ok());
    }

    #[test]
    fn test_logout_closes_open_invitation_and_notifies_target() {
        let harness = Harness::new();
        let (alice, _ea) = harness.connect();
        let (bob, _eb) = harness.connect();
        let players = PlayerRegistry::new();
        let clients = ClientRegistry::new(8);
        clients.register(alice.clone()).unwrap();
        clients.register(bob.clone()).unwrap();
        alice.login("alice", &players, &clients).unwrap();
        bob.login("bob", &players, &clients).unwrap();

        alice.make_invitation(&bob, Role::X, Role::O).unwrap();
        alice.logout();
        assert!(!alice.is_logged_in());
        assert!(bob.invitation_at(0).is_err());
    }
}
