use crate::game::{ClientGameState, Flow};
use crate::input::translate_line;
use crate::rendering::render;
use log::{debug, error, info, warn};
use shared::{ServerMessage, BUFFER_SIZE, INIT_TOKEN, QUIT_TOKEN};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    game_state: ClientGameState,
    render_enabled: bool,
}

impl Client {
    /// Binds an ephemeral socket of the same address family as the server
    pub async fn new(
        server_addr: SocketAddr,
        render_enabled: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let local_ip = match server_addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = UdpSocket::bind(SocketAddr::new(local_ip, 0)).await?;
        debug!("Client socket bound to {}", socket.local_addr()?);

        Ok(Client {
            socket,
            server_addr,
            game_state: ClientGameState::new(),
            render_enabled,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub async fn connect(&self) -> io::Result<()> {
        info!("Connecting to {}...", self.server_addr);
        self.send_text(INIT_TOKEN).await
    }

    async fn send_text(&self, text: &str) -> io::Result<()> {
        self.socket.send_to(text.as_bytes(), self.server_addr).await?;
        debug!("Sent {:?}", text);
        Ok(())
    }

    /// Prints and applies one datagram from the server
    pub fn handle_datagram(&mut self, data: &[u8]) -> Flow {
        let text = String::from_utf8_lossy(data);
        println!("Received {} bytes: \"{}\"", data.len(), text);

        let message = match ServerMessage::parse(&text) {
            Ok(message) => message,
            Err(e) => {
                warn!("{}", e);
                return Flow::Continue;
            }
        };

        let flow = self.game_state.apply(&message);

        if self.render_enabled && matches!(message, ServerMessage::Snapshot(_)) {
            if let Some(frame) = render(&self.game_state) {
                print!("{}", frame);
            }
        }

        flow
    }

    /// Waits for the next datagram from the server and applies it
    pub async fn recv_once(&mut self) -> io::Result<Flow> {
        let mut buffer = [0u8; BUFFER_SIZE];
        loop {
            let (len, from) = self.socket.recv_from(&mut buffer).await?;
            if from == self.server_addr {
                return Ok(self.handle_datagram(&buffer[..len]));
            }
            debug!("Ignoring datagram from {}", from);
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = [0u8; BUFFER_SIZE];
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, from)) if from == self.server_addr => {
                            if self.handle_datagram(&buffer[..len]) == Flow::Exit {
                                return Ok(());
                            }
                        },
                        Ok((_, from)) => debug!("Ignoring datagram from {}", from),
                        Err(e) => {
                            error!("Error receiving packet: {}", e);
                            return Err(e.into());
                        }
                    }
                },

                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if let Some(text) = translate_line(&line) {
                                self.send_text(&text).await?;
                                if text == QUIT_TOKEN {
                                    return Ok(());
                                }
                            }
                        },
                        None => {
                            info!("Input closed, leaving");
                            break;
                        }
                    }
                },

                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, leaving");
                    break;
                },
            }
        }

        if let Err(e) = self.send_text(QUIT_TOKEN).await {
            warn!("Failed to send QUIT: {}", e);
        }

        Ok(())
    }
}
