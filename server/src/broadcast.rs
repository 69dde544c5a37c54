//! Fan-out of one message to every active session
//!
//! A failed send is treated as an implicit disconnect: the destination is
//! evicted and every remaining session is sent a fresh snapshot, so survivors
//! always end on a state that no longer lists the evicted peer. Rounds repeat
//! until one completes without failures. Every failing round evicts at least
//! one slot, which bounds the number of rounds by the registry capacity.

use crate::client_manager::ClientManager;
use crate::game::GameState;
use crate::transport::Transport;
use log::{debug, warn};
use shared::CONFIRMATION;

/// What a broadcast did, for logging and tests
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Successful sends across all rounds, confirmation included
    pub delivered: usize,
    /// Slots evicted because a send to them failed
    pub evicted: Vec<usize>,
    /// Fan-out rounds run; more than one means a failure forced a resend
    pub rounds: usize,
    /// Whether the excluded slot received the delivery confirmation
    pub confirmed: bool,
}

/// Sends `payload` to every active session except `exclude`, then sends the
/// delivery confirmation to `exclude` if it is still an active session.
pub async fn broadcast<T: Transport>(
    transport: &T,
    clients: &mut ClientManager,
    game_state: &GameState,
    payload: &str,
    exclude: Option<usize>,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    let mut message = payload.to_owned();
    let mut exclude = exclude;

    loop {
        report.rounds += 1;

        let mut failed = Vec::new();
        for (slot, addr) in clients.client_addrs() {
            if Some(slot) == exclude {
                continue;
            }

            match transport.send(message.as_bytes(), addr).await {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to send to slot {} at {}: {}", slot, addr, e);
                    failed.push(slot);
                }
            }
        }

        if failed.is_empty() {
            if let Some(sender) = exclude.take() {
                if let Some(addr) = clients.get(sender).map(|client| client.addr) {
                    match transport.send(CONFIRMATION.as_bytes(), addr).await {
                        Ok(_) => {
                            report.delivered += 1;
                            report.confirmed = true;
                        }
                        Err(e) => {
                            warn!("Failed to confirm delivery to slot {} at {}: {}", sender, addr, e);
                            failed.push(sender);
                        }
                    }
                }
            }
        }

        if failed.is_empty() {
            break;
        }

        for slot in failed {
            if let Ok(true) = clients.evict(slot) {
                report.evicted.push(slot);
            }
        }

        // Survivors, the original sender included, get the post-eviction state.
        message = game_state.serialize_all(clients);
        exclude = None;
        debug!(
            "Rebroadcasting snapshot after evicting {:?}: {}",
            report.evicted, message
        );
    }

    report
}
