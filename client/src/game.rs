//! Client-side view of the arena, built only from what the server sends

use log::{info, warn};
use shared::{PlayerPosition, ServerMessage};

/// What the network loop should do after a message has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Default, Clone)]
pub struct ClientGameState {
    username: Option<String>,
    /// `(width, height)` as announced in the join notice
    arena: Option<(i32, i32)>,
    players: Vec<PlayerPosition>,
    rejected: bool,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn arena(&self) -> Option<(i32, i32)> {
        self.arena
    }

    pub fn players(&self) -> &[PlayerPosition] {
        &self.players
    }

    pub fn was_rejected(&self) -> bool {
        self.rejected
    }

    pub fn own_position(&self) -> Option<&PlayerPosition> {
        let username = self.username.as_deref()?;
        self.players.iter().find(|p| p.username == username)
    }

    pub fn apply(&mut self, message: &ServerMessage) -> Flow {
        match message {
            ServerMessage::JoinNotice {
                username,
                height,
                width,
            } => {
                self.username = Some(username.clone());
                self.arena = Some((*width, *height));
                self.rejected = false;
            }
            ServerMessage::Joined { username } => {
                info!("Joined as {}", username);
                self.username = Some(username.clone());
            }
            ServerMessage::NoRoom => {
                warn!("Server is full");
                self.rejected = true;
                return Flow::Exit;
            }
            ServerMessage::Confirmation => {}
            ServerMessage::Snapshot(players) => {
                self.players = players.clone();
            }
            ServerMessage::Shutdown => {
                info!("Server shut down");
                return Flow::Exit;
            }
        }

        Flow::Continue
    }
}
