//! # Presence Server Library
//!
//! This library provides the server side of a UDP multiplayer presence game.
//! Clients announce themselves, move around a bounded 2-D grid, and the server
//! keeps every participant in sync by broadcasting full-state snapshots after
//! each change.
//!
//! ## Core Responsibilities
//!
//! ### Session Tracking
//! UDP is connectionless, so the only thing tying datagrams to a player is the
//! sender's address. The registry maps each address to one of a fixed number
//! of slots, and the slot decides the player's username (`client1`,
//! `client2`, ...).
//!
//! ### Authoritative Positions
//! The server owns every position. Movement requests are applied one cell at
//! a time and only while the result stays strictly inside the arena; the
//! outer ring of cells is reserved as a border.
//!
//! ### State Broadcasting
//! After every accepted change the full roster is serialized as
//! `(name, x, y) ` entries and fanned out to all sessions. A peer that cannot
//! be reached is evicted, and the rest are re-sent a snapshot without it.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! One loop receives a datagram, applies it to the registry and positions,
//! broadcasts, and only then reads the next datagram. Nothing else touches
//! session state, so no locking is involved.
//!
//! ### Text Protocol
//! One ASCII message per datagram. Clients send `INIT`, `QUIT`, `Up`,
//! `Down`, `Left` or `Right`; anything else is dropped without a reply.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Fixed-capacity session registry: lookup, lowest-free-slot allocation,
//! eviction.
//!
//! ### Game Module (`game`)
//! Arena bounds, spawn placement, movement and snapshot serialization.
//!
//! ### Broadcast Module (`broadcast`)
//! Fan-out with evict-and-resync on delivery failure.
//!
//! ### Network Module (`network`)
//! Datagram dispatch and the main loop, including the final `QUIT` notice
//! on shutdown.
//!
//! ### Transport Module (`transport`)
//! The send/receive seam, implemented for `tokio::net::UdpSocket`.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::{Arena, GameState};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let game_state = GameState::new(Arena::new(80, 24)?);
//!     let mut server = Server::bind("127.0.0.1:8080".parse()?, game_state, 32).await?;
//!
//!     // Serves until Ctrl-C, then tells every client the server is gone
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod game;
pub mod network;
pub mod transport;
pub mod utils;
