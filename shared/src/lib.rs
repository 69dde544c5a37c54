use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_CLIENTS: usize = 32;
pub const MIN_X: i32 = 0;
pub const MIN_Y: i32 = 0;
pub const BUFFER_SIZE: usize = 1024;

pub const INIT_TOKEN: &str = "INIT";
pub const QUIT_TOKEN: &str = "QUIT";
pub const CONFIRMATION: &str = "Server: message confirmation";
pub const NO_ROOM: &str = "Server: No room available for new clients.";
const JOINED_PREFIX: &str = "Server: Successfully joined the game. You're ";
const JOIN_NOTICE_PREFIX: &str = "INIT:";

/// Username bound to a registry slot for the lifetime of the process.
pub fn username_for(slot: usize) -> String {
    format!("client{}", slot + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        }
    }

    /// Unit step as `(dx, dy)`; `y` grows downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Messages a client may send. Tokens are case-sensitive and must make up the
/// whole datagram; anything else is not a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Init,
    Quit,
    Move(Direction),
}

impl ClientMessage {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            b"INIT" => Some(ClientMessage::Init),
            b"QUIT" => Some(ClientMessage::Quit),
            b"Up" => Some(ClientMessage::Move(Direction::Up)),
            b"Down" => Some(ClientMessage::Move(Direction::Down)),
            b"Left" => Some(ClientMessage::Move(Direction::Left)),
            b"Right" => Some(ClientMessage::Move(Direction::Right)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMessage::Init => INIT_TOKEN,
            ClientMessage::Quit => QUIT_TOKEN,
            ClientMessage::Move(direction) => direction.as_str(),
        }
    }
}

/// One entry of a snapshot, rendered as `(name, x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerPosition {
    pub username: String,
    pub x: i32,
    pub y: i32,
}

impl PlayerPosition {
    pub fn new(username: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            username: username.into(),
            x,
            y,
        }
    }
}

impl fmt::Display for PlayerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.username, self.x, self.y)
    }
}

impl FromStr for PlayerPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ParseError::MalformedEntry(s.to_string()))?;

        let mut fields = inner.split(',').map(str::trim);
        let (Some(username), Some(x), Some(y), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(ParseError::MalformedEntry(s.to_string()));
        };

        if username.is_empty() {
            return Err(ParseError::MalformedEntry(s.to_string()));
        }

        Ok(PlayerPosition {
            username: username.to_string(),
            x: x.parse()
                .map_err(|_| ParseError::MalformedEntry(s.to_string()))?,
            y: y.parse()
                .map_err(|_| ParseError::MalformedEntry(s.to_string()))?,
        })
    }
}

/// Encodes positions as `"(a, 1, 2) (b, 3, 4) "`; every entry carries a
/// trailing space and an empty roster encodes as the empty string.
pub fn encode_snapshot<'a, I>(positions: I) -> String
where
    I: IntoIterator<Item = &'a PlayerPosition>,
{
    let mut out = String::new();
    for position in positions {
        out.push_str(&position.to_string());
        out.push(' ');
    }
    out
}

pub fn parse_snapshot(text: &str) -> Result<Vec<PlayerPosition>, ParseError> {
    let mut positions = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let end = rest
            .find(')')
            .ok_or_else(|| ParseError::MalformedEntry(rest.to_string()))?;
        positions.push(rest[..=end].parse()?);
        rest = rest[end + 1..].trim_start();
    }

    Ok(positions)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed snapshot entry: {0:?}")]
    MalformedEntry(String),
    #[error("malformed join notice: {0:?}")]
    MalformedJoinNotice(String),
    #[error("unrecognised server message: {0:?}")]
    Unrecognised(String),
}

/// Everything the server sends to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `INIT:<username>|<height>|<width>`
    JoinNotice {
        username: String,
        height: i32,
        width: i32,
    },
    Joined {
        username: String,
    },
    NoRoom,
    Confirmation,
    Snapshot(Vec<PlayerPosition>),
    Shutdown,
}

impl ServerMessage {
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::JoinNotice {
                username,
                height,
                width,
            } => format!("{}{}|{}|{}", JOIN_NOTICE_PREFIX, username, height, width),
            ServerMessage::Joined { username } => format!("{}{}", JOINED_PREFIX, username),
            ServerMessage::NoRoom => NO_ROOM.to_string(),
            ServerMessage::Confirmation => CONFIRMATION.to_string(),
            ServerMessage::Snapshot(positions) => encode_snapshot(positions),
            ServerMessage::Shutdown => QUIT_TOKEN.to_string(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        if text == QUIT_TOKEN {
            return Ok(ServerMessage::Shutdown);
        }
        if text == CONFIRMATION {
            return Ok(ServerMessage::Confirmation);
        }
        if text == NO_ROOM {
            return Ok(ServerMessage::NoRoom);
        }
        if let Some(username) = text.strip_prefix(JOINED_PREFIX) {
            return Ok(ServerMessage::Joined {
                username: username.to_string(),
            });
        }
        if let Some(body) = text.strip_prefix(JOIN_NOTICE_PREFIX) {
            return Self::parse_join_notice(body)
                .ok_or_else(|| ParseError::MalformedJoinNotice(text.to_string()));
        }
        if text.trim().is_empty() || text.trim_start().starts_with('(') {
            return parse_snapshot(text).map(ServerMessage::Snapshot);
        }

        Err(ParseError::Unrecognised(text.to_string()))
    }

    fn parse_join_notice(body: &str) -> Option<Self> {
        let mut parts = body.split('|');
        let username = parts.next().filter(|name| !name.is_empty())?;
        let height = parts.next()?.parse().ok()?;
        let width = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(ServerMessage::JoinNotice {
            username: username.to_string(),
            height,
            width,
        })
    }
}
