//! Turns lines typed on standard input into datagrams for the server

use shared::{ClientMessage, Direction};

/// Maps one line of input to the text to send, or None for a blank line.
///
/// `w`, `a`, `s` and `d` stand for `Up`, `Left`, `Down` and `Right`; any
/// other text goes out verbatim and the server decides what it means.
pub fn translate_line(line: &str) -> Option<String> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    if line.trim().is_empty() {
        return None;
    }

    let alias = match line.trim() {
        "w" => Some(Direction::Up),
        "a" => Some(Direction::Left),
        "s" => Some(Direction::Down),
        "d" => Some(Direction::Right),
        _ => None,
    };

    Some(match alias {
        Some(direction) => ClientMessage::Move(direction).as_str().to_string(),
        None => line.to_string(),
    })
}
