//! Server network layer: datagram dispatch and the main event loop

use crate::broadcast::{broadcast, BroadcastReport};
use crate::client_manager::{ClientManager, Membership, RegistryError};
use crate::game::{GameState, MoveOutcome};
use crate::transport::Transport;
use log::{debug, error, info, warn};
use shared::{ClientMessage, Direction, ServerMessage, BUFFER_SIZE, QUIT_TOKEN};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Presence server: owns the transport and all session state
///
/// Every datagram is handled to completion before the next one is read, so
/// registry, positions and broadcasts are only ever touched from one place.
pub struct Server<T: Transport = UdpSocket> {
    transport: T,
    clients: ClientManager,
    game_state: GameState,
}

impl Server<UdpSocket> {
    pub async fn bind(
        addr: SocketAddr,
        game_state: GameState,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind(addr).await?;
        info!("Server listening on {}", socket.local_addr()?);

        Ok(Self::with_transport(socket, game_state, max_clients))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T: Transport> Server<T> {
    pub fn with_transport(transport: T, game_state: GameState, max_clients: usize) -> Self {
        Server {
            transport,
            clients: ClientManager::new(max_clients),
            game_state,
        }
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Classifies one datagram and applies it
    pub async fn handle_datagram(&mut self, payload: &[u8], addr: SocketAddr) {
        match ClientMessage::parse(payload) {
            Some(ClientMessage::Init) => self.handle_init(addr).await,
            Some(ClientMessage::Quit) => self.handle_quit(addr).await,
            Some(ClientMessage::Move(direction)) => self.handle_move(addr, direction).await,
            None => {
                debug!("Dropping {} byte payload from {}", payload.len(), addr);
            }
        }
    }

    async fn handle_init(&mut self, addr: SocketAddr) {
        info!("Received 'INIT' from {}", addr);

        let slot = match self.clients.find(addr) {
            Some(slot) => {
                debug!("{} re-sent INIT, keeping slot {}", addr, slot);
                if !self.send_join_messages(slot).await {
                    // Peers have already seen this slot in earlier snapshots.
                    let snapshot = self.game_state.serialize_all(&self.clients);
                    self.broadcast(&snapshot, None).await;
                    return;
                }
                slot
            }
            None => match self.join(addr).await {
                Some(slot) => slot,
                None => return,
            },
        };

        let snapshot = self.game_state.serialize_all(&self.clients);
        debug!("Slot {} is in; broadcasting {}", slot, snapshot);
        self.broadcast(&snapshot, None).await;
    }

    async fn handle_quit(&mut self, addr: SocketAddr) {
        let Some(slot) = self.clients.find(addr) else {
            debug!("Ignoring QUIT from unknown {}", addr);
            return;
        };

        if let Err(e) = self.clients.evict(slot) {
            error!("Failed to remove {}: {}", addr, e);
            return;
        }

        let snapshot = self.game_state.serialize_all(&self.clients);
        self.broadcast(&snapshot, None).await;
    }

    async fn handle_move(&mut self, addr: SocketAddr, direction: Direction) {
        let game_state = &mut self.game_state;
        let membership = self
            .clients
            .get_or_allocate(addr, |slot| game_state.initial_placement(slot));

        let slot = match membership {
            Ok(Membership::Existing(slot)) => slot,
            Ok(Membership::Joined(slot)) => {
                if !self.send_join_messages(slot).await {
                    return;
                }
                let snapshot = self.game_state.serialize_all(&self.clients);
                self.broadcast(&snapshot, None).await;
                slot
            }
            Err(RegistryError::Full { .. }) => {
                self.reject(addr).await;
                return;
            }
            Err(e) => {
                error!("Could not resolve {}: {}", addr, e);
                return;
            }
        };

        // The implicit-join broadcast may have evicted the mover.
        if self.clients.get(slot).map(|client| client.addr) != Some(addr) {
            return;
        }

        match self
            .game_state
            .apply_move(&mut self.clients, slot, direction)
        {
            MoveOutcome::Moved { .. } => {
                let snapshot = self.game_state.serialize_all(&self.clients);
                debug!("Broadcasting: {}", snapshot);
                self.broadcast(&snapshot, Some(slot)).await;
            }
            MoveOutcome::Rejected => {
                debug!("Rejected {} from slot {}", direction.as_str(), slot);
            }
        }
    }

    /// Allocates a slot for `addr` and sends it the join messages. Returns
    /// None if the registry is full or the joiner could not be reached.
    async fn join(&mut self, addr: SocketAddr) -> Option<usize> {
        let game_state = &mut self.game_state;
        match self
            .clients
            .allocate(addr, |slot| game_state.initial_placement(slot))
        {
            Ok(slot) => self.send_join_messages(slot).await.then_some(slot),
            Err(RegistryError::Full { .. }) => {
                self.reject(addr).await;
                None
            }
            Err(e) => {
                error!("Could not register {}: {}", addr, e);
                None
            }
        }
    }

    /// Sends the arena notice and join confirmation to the session in `slot`.
    /// A failed send evicts the session.
    async fn send_join_messages(&mut self, slot: usize) -> bool {
        let Some(client) = self.clients.get(slot) else {
            return false;
        };
        let addr = client.addr;
        let arena = self.game_state.arena();

        let notice = ServerMessage::JoinNotice {
            username: client.username.clone(),
            height: arena.height(),
            width: arena.width(),
        };
        let joined = ServerMessage::Joined {
            username: client.username.clone(),
        };

        for message in [notice, joined] {
            if let Err(e) = self.transport.send(message.encode().as_bytes(), addr).await {
                warn!("Failed to greet {}: {}", addr, e);
                if let Err(e) = self.clients.evict(slot) {
                    error!("Failed to remove {}: {}", addr, e);
                }
                return false;
            }
        }

        true
    }

    async fn reject(&self, addr: SocketAddr) {
        warn!("No room for {} ({} slots taken)", addr, self.clients.len());
        if let Err(e) = self
            .transport
            .send(ServerMessage::NoRoom.encode().as_bytes(), addr)
            .await
        {
            warn!("Failed to send rejection to {}: {}", addr, e);
        }
    }

    async fn broadcast(&mut self, payload: &str, exclude: Option<usize>) -> BroadcastReport {
        let report = broadcast(
            &self.transport,
            &mut self.clients,
            &self.game_state,
            payload,
            exclude,
        )
        .await;

        if !report.evicted.is_empty() {
            info!(
                "Evicted unreachable slots {:?} after {} rounds",
                report.evicted, report.rounds
            );
        }
        report
    }

    /// Broadcasts the final `QUIT` notice
    async fn shutdown(&mut self) {
        info!("Server shutting down, notifying {} clients", self.clients.len());
        self.broadcast(QUIT_TOKEN, None).await;
    }

    /// Runs the event loop until `shutdown` resolves or receiving fails
    ///
    /// Either way the active sessions get a final `QUIT`. A receive failure is
    /// returned after that notice goes out.
    pub async fn run_until<F>(&mut self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut buffer = [0u8; BUFFER_SIZE];
        tokio::pin!(shutdown);

        info!("Server started successfully");

        let result = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break Ok(()),

                received = self.transport.recv(&mut buffer) => {
                    match received {
                        Ok((len, addr)) => self.handle_datagram(&buffer[..len], addr).await,
                        Err(e) => {
                            error!("Error receiving packet: {}", e);
                            break Err(e);
                        }
                    }
                },
            }
        };

        self.shutdown().await;
        result
    }

    /// Runs the event loop until Ctrl-C
    pub async fn run(&mut self) -> io::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl-C");
        })
        .await
    }
}
