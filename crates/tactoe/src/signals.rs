//! Signal handling: `SIGHUP` triggers a clean shutdown, `SIGPIPE` is only
//! logged.
//!
//! Neither runs arbitrary code inside the actual signal handler context —
//! `signal_hook::iterator::Signals` delivers both on a dedicated thread,
//! which is free to take locks and log, unlike a real `sigaction` handler.
//! This mirrors the original server's `sigHandler`/`terminate()` pair
//! (`SIGHUP` → shut down every client, wait for them to drain, exit;
//! `SIGPIPE` → log only, never let a broken pipe kill the process) without
//! the async-signal-safety restrictions `sigaction` imposes.

use std::sync::Arc;
use std::thread;

use signal_hook::consts::{SIGHUP, SIGPIPE};
use signal_hook::iterator::Signals;

use tactoe_game::ClientRegistry;

/// Spawns the signal-handling thread. Returns once the thread is running;
/// the thread itself runs for the rest of the process's life.
pub fn install(clients: Arc<ClientRegistry>) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGHUP, SIGPIPE])?;
    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGHUP => {
                    tracing::info!("SIGHUP received, shutting down");
                    clients.shutdown_all();
                    clients.wait_for_empty();
                    tracing::info!("all clients disconnected, exiting");
                    std::process::exit(0);
                }
                SIGPIPE => {
                    tracing::debug!("SIGPIPE received, ignoring");
                }
                other => {
                    tracing::debug!(signal = other, "unexpected signal, ignoring");
                }
            }
        }
    });
    Ok(())
}
