//! The per-connection service loop.
//!
//! One of these runs on its own thread for the lifetime of a connection:
//! receive a frame, dispatch it to the matching `ClientSession` action,
//! and either let the action's own ACK/push stand, or turn a protocol-
//! state error into a NACK. A recv failure, EOF, or a failure writing to
//! this connection's own socket ends the loop and tears the session down.
//!
//! Mirrors the original server's `jeux_client_service`: before login only
//! `LOGIN` is honored, after login `LOGIN` itself is rejected, and the
//! loop ends on EOF or an unrecoverable I/O error.

use std::sync::Arc;

use tactoe_game::{ClientError, ClientRegistry, ClientSession};
use tactoe_protocol::{Frame, MessageType, ProtocolError};
use tactoe_registry::PlayerRegistry;
use tactoe_transport::TransportError;

/// Runs the service loop for `client` until the connection ends, then
/// logs it out and removes it from `clients`.
pub fn run(client: Arc<ClientSession>, players: Arc<PlayerRegistry>, clients: Arc<ClientRegistry>) {
    loop {
        let frame = match client.recv_frame() {
            Ok(frame) => frame,
            // An unrecognized type/role byte is a protocol-state
            // violation, not a reason to tear down an otherwise healthy
            // socket — NACK it and keep reading, the way the original
            // dispatcher's `default:` case ignores an unknown packet.
            Err(TransportError::Frame(ProtocolError::UnknownMessageType(byte))) => {
                tracing::debug!(client = %client.id(), byte, "unknown message type byte, nacking");
                if let Err(e) = client.send_nack() {
                    tracing::debug!(client = %client.id(), error = %e, "failed to send NACK, ending session");
                    break;
                }
                continue;
            }
            Err(TransportError::Frame(ProtocolError::UnknownRole(byte))) => {
                tracing::debug!(client = %client.id(), byte, "unknown role byte, nacking");
                if let Err(e) = client.send_nack() {
                    tracing::debug!(client = %client.id(), error = %e, "failed to send NACK, ending session");
                    break;
                }
                continue;
            }
            Err(e) => {
                tracing::debug!(client = %client.id(), error = %e, "connection ended");
                break;
            }
        };

        match dispatch(&client, &players, &clients, &frame) {
            Ok(()) => {}
            Err(ClientError::Io(e)) => {
                tracing::debug!(client = %client.id(), error = %e, "write to own socket failed, ending session");
                break;
            }
            Err(e) => {
                tracing::debug!(client = %client.id(), error = %e, "request rejected");
                if let Err(e) = client.send_nack() {
                    tracing::debug!(client = %client.id(), error = %e, "failed to send NACK, ending session");
                    break;
                }
            }
        }
    }

    client.logout();
    if let Err(e) = clients.unregister(client.id()) {
        tracing::warn!(client = %client.id(), error = %e, "failed to unregister client");
    }
}

/// Routes one request frame to the matching `ClientSession` action,
/// enforcing the login gate that individual actions don't check
/// themselves: only `LOGIN` is honored before login, and `LOGIN` is
/// rejected once a session is already logged in.
fn dispatch(
    client: &Arc<ClientSession>,
    players: &PlayerRegistry,
    clients: &ClientRegistry,
    frame: &Frame,
) -> Result<(), ClientError> {
    let msg_type = frame.header.msg_type;

    if !msg_type.is_request() {
        return Err(ClientError::MalformedRequest);
    }
    if !client.is_logged_in() && msg_type != MessageType::Login {
        return Err(ClientError::NotLoggedIn);
    }
    if client.is_logged_in() && msg_type == MessageType::Login {
        return Err(ClientError::AlreadyLoggedIn);
    }

    match msg_type {
        MessageType::Login => {
            let username = frame.payload_str().ok_or(ClientError::MalformedRequest)?;
            client.login(username, players, clients)
        }
        MessageType::Users => client.users(clients),
        MessageType::Invite => {
            let username = frame.payload_str().ok_or(ClientError::MalformedRequest)?;
            let target = clients.lookup(username).ok_or(ClientError::TargetNotLoggedIn)?;
            let target_role = frame.header.role;
            client.make_invitation(&target, target_role.opposite(), target_role)
        }
        MessageType::Revoke => client.revoke_invitation(frame.header.id),
        MessageType::Accept => client.accept_invitation(frame.header.id),
        MessageType::Decline => client.decline_invitation(frame.header.id),
        MessageType::Move => {
            let mv = frame.payload_str().ok_or(ClientError::MalformedRequest)?;
            client.make_move(frame.header.id, mv)
        }
        MessageType::Resign => client.resign_game(frame.header.id),
        _ => unreachable!("non-request message types are rejected above"),
    }
}
