//! Session registry for the presence server
//!
//! This module maps the anonymous origin address of each UDP datagram to a
//! persistent session slot. It handles:
//! - Slot allocation on first contact (lowest free slot wins)
//! - Identity lookup for every subsequent datagram
//! - Eviction on explicit quit or failed delivery
//!
//! The table has a fixed capacity and is scanned linearly. Capacity is small
//! (at most `MAX_CLIENTS`), and deterministic lowest-free-slot allocation keeps
//! usernames predictable: slot `i` is always `client{i + 1}`.

use crate::game::Position;
use log::{error, info};
use shared::username_for;
use std::net::SocketAddr;
use thiserror::Error;

/// An active session occupying one registry slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Index of the slot this session occupies
    pub slot: usize,
    /// Origin address of the client's datagrams, the only correlation key
    pub addr: SocketAddr,
    /// Username fixed to the slot
    pub username: String,
    /// Current position, always strictly inside the arena
    pub position: Position,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no free slot among {capacity}")]
    Full { capacity: usize },
    #[error("slot {slot} is outside 0..{capacity}")]
    SlotOutOfRange { slot: usize, capacity: usize },
    #[error("{addr} already holds slot {slot}")]
    AlreadyRegistered { addr: SocketAddr, slot: usize },
}

/// Result of resolving a sender through [`ClientManager::get_or_allocate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The sender already held this slot
    Existing(usize),
    /// The sender was just given this slot
    Joined(usize),
}

impl Membership {
    pub fn slot(&self) -> usize {
        match self {
            Membership::Existing(slot) | Membership::Joined(slot) => *slot,
        }
    }
}

/// Fixed-capacity table of session slots
///
/// A slot is either empty or occupied by exactly one address, and no address
/// occupies more than one slot at a time.
#[derive(Debug)]
pub struct ClientManager {
    slots: Vec<Option<Client>>,
}

impl ClientManager {
    /// Creates a registry with `capacity` empty slots
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of active sessions
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Finds the slot held by `addr`
    ///
    /// Used to associate every incoming datagram with its session. Returns
    /// None if the address holds no slot.
    pub fn find(&self, addr: SocketAddr) -> Option<usize> {
        self.active()
            .find(|client| client.addr == addr)
            .map(|client| client.slot)
    }

    /// Binds `addr` to the lowest free slot
    ///
    /// `spawn` is called with the chosen slot index to produce the initial
    /// position. On `Full` nothing is created and the caller is expected to
    /// tell the requester there is no room.
    pub fn allocate<F>(&mut self, addr: SocketAddr, spawn: F) -> Result<usize, RegistryError>
    where
        F: FnOnce(usize) -> Position,
    {
        if let Some(slot) = self.find(addr) {
            return Err(RegistryError::AlreadyRegistered { addr, slot });
        }

        let capacity = self.capacity();
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RegistryError::Full { capacity })?;

        let client = Client {
            slot,
            addr,
            username: username_for(slot),
            position: spawn(slot),
        };
        info!(
            "{} joined from {} at ({}, {})",
            client.username, addr, client.position.x, client.position.y
        );
        self.slots[slot] = Some(client);

        Ok(slot)
    }

    /// Marks `slot` empty
    ///
    /// Returns whether a session was actually removed, so evicting an empty
    /// slot is a harmless no-op. Out-of-range indices are reported and
    /// rejected.
    pub fn evict(&mut self, slot: usize) -> Result<bool, RegistryError> {
        let capacity = self.capacity();
        let Some(entry) = self.slots.get_mut(slot) else {
            error!("Refusing to evict slot {} (capacity {})", slot, capacity);
            return Err(RegistryError::SlotOutOfRange { slot, capacity });
        };

        match entry.take() {
            Some(client) => {
                info!("Removing {} ({}) from slot {}", client.username, client.addr, slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolves `addr` to a slot, allocating one on a miss
    ///
    /// This is the implicit-join path taken by datagrams other than `INIT`.
    pub fn get_or_allocate<F>(
        &mut self,
        addr: SocketAddr,
        spawn: F,
    ) -> Result<Membership, RegistryError>
    where
        F: FnOnce(usize) -> Position,
    {
        match self.find(addr) {
            Some(slot) => Ok(Membership::Existing(slot)),
            None => self.allocate(addr, spawn).map(Membership::Joined),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Client> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Client> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Iterates active sessions in ascending slot order
    pub fn active(&self) -> impl Iterator<Item = &Client> {
        self.slots.iter().flatten()
    }

    /// Gets every active slot and its address, in slot order
    ///
    /// The broadcast engine works from this copy so it can evict while
    /// walking the list.
    pub fn client_addrs(&self) -> Vec<(usize, SocketAddr)> {
        self.active()
            .map(|client| (client.slot, client.addr))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn spawn(_slot: usize) -> Position {
        Position::new(5, 5)
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(5);
        assert_eq!(manager.capacity(), 5);
        assert!(manager.is_empty());
        assert!(!manager.is_full());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_allocate_assigns_lowest_slot_and_username() {
        let mut manager = ClientManager::new(3);

        let slot = manager.allocate(test_addr(), spawn).unwrap();
        assert_eq!(slot, 0);

        let client = manager.get(slot).unwrap();
        assert_eq!(client.addr, test_addr());
        assert_eq!(client.username, "client1");
        assert_eq!(client.position, Position::new(5, 5));

        let slot2 = manager.allocate(test_addr2(), spawn).unwrap();
        assert_eq!(slot2, 1);
        assert_eq!(manager.get(slot2).unwrap().username, "client2");
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_allocate_passes_slot_to_spawn() {
        let mut manager = ClientManager::new(3);
        manager.allocate(test_addr(), spawn).unwrap();

        let slot = manager
            .allocate(test_addr2(), |slot| Position::new(slot as i32 + 10, 3))
            .unwrap();
        assert_eq!(manager.get(slot).unwrap().position, Position::new(11, 3));
    }

    #[test]
    fn test_allocate_reuses_lowest_free_slot() {
        let mut manager = ClientManager::new(3);
        let a: SocketAddr = "10.0.0.1:1000".parse().unwrap();
        let b: SocketAddr = "10.0.0.2:1000".parse().unwrap();
        let c: SocketAddr = "10.0.0.3:1000".parse().unwrap();
        let d: SocketAddr = "10.0.0.4:1000".parse().unwrap();

        manager.allocate(a, spawn).unwrap();
        manager.allocate(b, spawn).unwrap();
        manager.allocate(c, spawn).unwrap();

        assert_eq!(manager.evict(1), Ok(true));
        assert_eq!(manager.allocate(d, spawn), Ok(1));
        assert_eq!(manager.get(1).unwrap().username, "client2");
        assert_eq!(manager.get(1).unwrap().addr, d);
    }

    #[test]
    fn test_allocate_when_full() {
        let mut manager = ClientManager::new(1);

        assert!(manager.allocate(test_addr(), spawn).is_ok());
        assert!(manager.is_full());

        let result = manager.allocate(test_addr2(), spawn);
        assert_eq!(result, Err(RegistryError::Full { capacity: 1 }));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.find(test_addr2()), None);
    }

    #[test]
    fn test_allocate_refuses_duplicate_address() {
        let mut manager = ClientManager::new(3);
        manager.allocate(test_addr(), spawn).unwrap();

        let result = manager.allocate(test_addr(), spawn);
        assert_eq!(
            result,
            Err(RegistryError::AlreadyRegistered {
                addr: test_addr(),
                slot: 0
            })
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let slot1 = manager.allocate(test_addr(), spawn).unwrap();
        let _slot2 = manager.allocate(test_addr2(), spawn).unwrap();

        assert_eq!(manager.find(test_addr()), Some(slot1));

        let unknown_addr: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find(unknown_addr), None);
    }

    #[test]
    fn test_find_distinguishes_ports() {
        let mut manager = ClientManager::new(2);
        manager.allocate(test_addr(), spawn).unwrap();
        assert_eq!(manager.find(test_addr2()), None);
    }

    #[test]
    fn test_evict_is_idempotent() {
        let mut manager = ClientManager::new(2);
        let slot = manager.allocate(test_addr(), spawn).unwrap();

        assert_eq!(manager.evict(slot), Ok(true));
        assert_eq!(manager.evict(slot), Ok(false));
        assert!(manager.is_empty());
        assert_eq!(manager.find(test_addr()), None);
    }

    #[test]
    fn test_evict_out_of_range() {
        let mut manager = ClientManager::new(2);
        manager.allocate(test_addr(), spawn).unwrap();

        assert_eq!(
            manager.evict(2),
            Err(RegistryError::SlotOutOfRange {
                slot: 2,
                capacity: 2
            })
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_get_or_allocate() {
        let mut manager = ClientManager::new(2);

        let first = manager.get_or_allocate(test_addr(), spawn).unwrap();
        assert_eq!(first, Membership::Joined(0));

        let again = manager.get_or_allocate(test_addr(), spawn).unwrap();
        assert_eq!(again, Membership::Existing(0));
        assert_eq!(again.slot(), 0);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_get_or_allocate_when_full() {
        let mut manager = ClientManager::new(1);
        manager.allocate(test_addr(), spawn).unwrap();

        let result = manager.get_or_allocate(test_addr2(), spawn);
        assert_eq!(result, Err(RegistryError::Full { capacity: 1 }));
    }

    #[test]
    fn test_client_addrs_in_slot_order() {
        let mut manager = ClientManager::new(3);
        manager.allocate(test_addr(), spawn).unwrap();
        manager.allocate(test_addr2(), spawn).unwrap();
        manager.evict(0).unwrap();

        let third: SocketAddr = "127.0.0.1:8082".parse().unwrap();
        manager.allocate(third, spawn).unwrap();

        assert_eq!(
            manager.client_addrs(),
            vec![(0, third), (1, test_addr2())]
        );
    }
}
