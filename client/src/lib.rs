//! # Presence Client Library
//!
//! Terminal companion for the presence server. It announces itself with
//! `INIT`, forwards lines typed on standard input as protocol messages, and
//! prints everything the server sends back.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Local view of the arena: own username, arena size and the latest snapshot
//! of every player's position.
//!
//! ### Input Module (`input`)
//! Maps typed lines to outgoing messages, including `w/a/s/d` shortcuts for
//! the four directions.
//!
//! ### Network Module (`network`)
//! UDP socket handling and the event loop that waits on both the socket and
//! standard input.
//!
//! ### Rendering Module (`rendering`)
//! Optional ASCII frame of the arena, drawn after each snapshot.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
