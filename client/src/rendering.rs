//! ASCII rendering of the arena

use crate::game::ClientGameState;

const BORDER: char = '#';
const EMPTY: char = ' ';
const SELF_MARKER: char = '@';
const OTHER_MARKER: char = '*';

/// Draws the arena with its reserved border, `@` for this client and the last
/// digit of the slot number for everyone else. Returns None until the join
/// notice has announced the arena size.
pub fn render(state: &ClientGameState) -> Option<String> {
    let (width, height) = state.arena()?;
    if width <= 0 || height <= 0 {
        return None;
    }
    let (w, h) = (width as usize, height as usize);

    let mut grid: Vec<Vec<char>> = (0..h)
        .map(|row| {
            (0..w)
                .map(|col| {
                    if row == 0 || row == h - 1 || col == 0 || col == w - 1 {
                        BORDER
                    } else {
                        EMPTY
                    }
                })
                .collect()
        })
        .collect();

    for player in state.players() {
        if player.x < 0 || player.y < 0 || player.x >= width || player.y >= height {
            continue;
        }
        let marker = if Some(player.username.as_str()) == state.username() {
            SELF_MARKER
        } else {
            marker_for(&player.username)
        };
        grid[player.y as usize][player.x as usize] = marker;
    }

    let mut frame = String::with_capacity((w + 1) * h);
    for row in grid {
        frame.extend(row);
        frame.push('\n');
    }
    Some(frame)
}

fn marker_for(username: &str) -> char {
    username
        .chars()
        .last()
        .filter(char::is_ascii_digit)
        .unwrap_or(OTHER_MARKER)
}
