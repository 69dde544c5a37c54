use crate::client_manager::ClientManager;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{encode_snapshot, Direction, PlayerPosition, MIN_X, MIN_Y};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("arena {width}x{height} has no interior")]
    TooSmall { width: i32, height: i32 },
}

/// Playable grid. The outer ring of cells is a border, so legal coordinates
/// satisfy `MIN_X < x < width - 1` and `MIN_Y < y < height - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    width: i32,
    height: i32,
}

impl Arena {
    pub fn new(width: i32, height: i32) -> Result<Self, ArenaError> {
        if width - 2 <= MIN_X || height - 2 <= MIN_Y {
            return Err(ArenaError::TooSmall { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x > MIN_X
            && position.x < self.width - 1
            && position.y > MIN_Y
            && position.y < self.height - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { from: Position, to: Position },
    Rejected,
}

/// Position model: spawn placement, bounded movement and snapshots
#[derive(Debug)]
pub struct GameState {
    arena: Arena,
    rng: StdRng,
}

impl GameState {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            rng: StdRng::from_entropy(),
        }
    }

    /// Same as `new` but with reproducible spawn positions
    pub fn with_seed(arena: Arena, seed: u64) -> Self {
        Self {
            arena,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    /// Picks a uniformly random interior cell for a newly joined slot
    pub fn initial_placement(&mut self, slot: usize) -> Position {
        let position = Position::new(
            self.rng.gen_range(MIN_X + 1..=self.arena.width - 2),
            self.rng.gen_range(MIN_Y + 1..=self.arena.height - 2),
        );
        debug!("Slot {} spawns at ({}, {})", slot, position.x, position.y);
        position
    }

    /// Moves the session in `slot` one cell, unless that would leave the
    /// interior. A move that does not change the position is `Rejected`.
    pub fn apply_move(
        &self,
        clients: &mut ClientManager,
        slot: usize,
        direction: Direction,
    ) -> MoveOutcome {
        let Some(client) = clients.get_mut(slot) else {
            return MoveOutcome::Rejected;
        };

        let from = client.position;
        let (dx, dy) = direction.delta();
        let to = Position::new(from.x + dx, from.y + dy);

        if !self.arena.contains(to) {
            return MoveOutcome::Rejected;
        }

        client.position = to;
        debug!(
            "{}: ({}, {}) -> ({}, {})",
            client.username, from.x, from.y, to.x, to.y
        );
        MoveOutcome::Moved { from, to }
    }

    /// Serializes every active session as `(name, x, y) ` in slot order
    pub fn serialize_all(&self, clients: &ClientManager) -> String {
        let positions: Vec<PlayerPosition> = clients
            .active()
            .map(|client| {
                PlayerPosition::new(client.username.clone(), client.position.x, client.position.y)
            })
            .collect();
        encode_snapshot(&positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn arena() -> Arena {
        Arena::new(80, 24).unwrap()
    }

    fn state_with_client(at: Position) -> (GameState, ClientManager, usize) {
        let game = GameState::with_seed(arena(), 7);
        let mut clients = ClientManager::new(4);
        let slot = clients.allocate(addr(9000), |_| at).unwrap();
        (game, clients, slot)
    }

    #[test]
    fn test_arena_rejects_degenerate_sizes() {
        assert!(Arena::new(3, 3).is_ok());
        assert_eq!(
            Arena::new(2, 24),
            Err(ArenaError::TooSmall {
                width: 2,
                height: 24
            })
        );
        assert!(Arena::new(80, 2).is_err());
        assert!(Arena::new(0, 0).is_err());
    }

    #[test]
    fn test_arena_interior() {
        let arena = arena();
        assert!(arena.contains(Position::new(1, 1)));
        assert!(arena.contains(Position::new(78, 22)));
        assert!(!arena.contains(Position::new(0, 5)));
        assert!(!arena.contains(Position::new(79, 5)));
        assert!(!arena.contains(Position::new(5, 0)));
        assert!(!arena.contains(Position::new(5, 23)));
    }

    #[test]
    fn test_initial_placement_is_interior() {
        let mut game = GameState::with_seed(arena(), 42);
        for slot in 0..500 {
            let position = game.initial_placement(slot % 32);
            assert!(game.arena().contains(position), "{:?}", position);
        }
    }

    #[test]
    fn test_initial_placement_on_smallest_arena() {
        let mut game = GameState::new(Arena::new(3, 3).unwrap());
        assert_eq!(game.initial_placement(0), Position::new(1, 1));
    }

    #[test]
    fn test_seeded_placement_is_reproducible() {
        let mut a = GameState::with_seed(arena(), 99);
        let mut b = GameState::with_seed(arena(), 99);
        for slot in 0..10 {
            assert_eq!(a.initial_placement(slot), b.initial_placement(slot));
        }
    }

    #[test]
    fn test_apply_move_each_direction() {
        let (game, mut clients, slot) = state_with_client(Position::new(10, 10));

        let cases = [
            (Direction::Up, Position::new(10, 9)),
            (Direction::Right, Position::new(11, 9)),
            (Direction::Down, Position::new(11, 10)),
            (Direction::Left, Position::new(10, 10)),
        ];

        for (direction, expected) in cases {
            let from = clients.get(slot).unwrap().position;
            assert_eq!(
                game.apply_move(&mut clients, slot, direction),
                MoveOutcome::Moved { from, to: expected }
            );
            assert_eq!(clients.get(slot).unwrap().position, expected);
        }
    }

    #[test]
    fn test_left_at_left_wall_is_rejected() {
        let (game, mut clients, slot) = state_with_client(Position::new(MIN_X + 1, 5));
        assert_eq!(
            game.apply_move(&mut clients, slot, Direction::Left),
            MoveOutcome::Rejected
        );
        assert_eq!(clients.get(slot).unwrap().position.x, MIN_X + 1);
    }

    #[test]
    fn test_right_at_right_wall_is_rejected() {
        let (game, mut clients, slot) = state_with_client(Position::new(78, 5));
        assert_eq!(
            game.apply_move(&mut clients, slot, Direction::Right),
            MoveOutcome::Rejected
        );
        assert_eq!(clients.get(slot).unwrap().position.x, 78);
    }

    #[test]
    fn test_vertical_walls_are_rejected() {
        let (game, mut clients, slot) = state_with_client(Position::new(5, 1));
        assert_eq!(
            game.apply_move(&mut clients, slot, Direction::Up),
            MoveOutcome::Rejected
        );

        clients.get_mut(slot).unwrap().position = Position::new(5, 22);
        assert_eq!(
            game.apply_move(&mut clients, slot, Direction::Down),
            MoveOutcome::Rejected
        );
        assert_eq!(clients.get(slot).unwrap().position, Position::new(5, 22));
    }

    #[test]
    fn test_apply_move_on_empty_slot() {
        let game = GameState::with_seed(arena(), 1);
        let mut clients = ClientManager::new(2);
        assert_eq!(
            game.apply_move(&mut clients, 1, Direction::Up),
            MoveOutcome::Rejected
        );
        assert_eq!(
            game.apply_move(&mut clients, 5, Direction::Up),
            MoveOutcome::Rejected
        );
    }

    #[test]
    fn test_serialize_all_in_slot_order() {
        let game = GameState::with_seed(arena(), 1);
        let mut clients = ClientManager::new(4);
        clients.allocate(addr(1), |_| Position::new(4, 7)).unwrap();
        clients.allocate(addr(2), |_| Position::new(6, 6)).unwrap();
        clients.allocate(addr(3), |_| Position::new(10, 2)).unwrap();
        clients.evict(1).unwrap();

        assert_eq!(
            game.serialize_all(&clients),
            "(client1, 4, 7) (client3, 10, 2) "
        );
    }

    #[test]
    fn test_serialize_all_empty() {
        let game = GameState::with_seed(arena(), 1);
        let clients = ClientManager::new(4);
        assert_eq!(game.serialize_all(&clients), "");
    }
}
