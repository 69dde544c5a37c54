//! Arena sizing from the controlling terminal

use log::debug;

/// Used when neither the terminal nor the environment reports a size.
pub const DEFAULT_DIMENSIONS: (u16, u16) = (80, 24);

/// Queries the size of the terminal attached to standard output as
/// `(columns, rows)`. Returns None when stdout is not a terminal.
#[cfg(unix)]
pub fn terminal_dimensions() -> Option<(u16, u16)> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ only writes into the winsize we pass.
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc == -1 || ws.ws_col == 0 || ws.ws_row == 0 {
        return None;
    }

    Some((ws.ws_col, ws.ws_row))
}

#[cfg(not(unix))]
pub fn terminal_dimensions() -> Option<(u16, u16)> {
    None
}

/// Reads `COLUMNS` and `LINES` as `(columns, rows)`.
pub fn env_dimensions() -> Option<(u16, u16)> {
    let read = |name: &str| std::env::var(name).ok()?.trim().parse::<u16>().ok();
    dimensions_from(read("COLUMNS"), read("LINES"))
}

fn dimensions_from(columns: Option<u16>, rows: Option<u16>) -> Option<(u16, u16)> {
    match (columns, rows) {
        (Some(columns), Some(rows)) if columns > 0 && rows > 0 => Some((columns, rows)),
        _ => None,
    }
}

/// Resolves the arena size as `(width, height)`.
///
/// Explicit values win; any side left unset is taken from the terminal, then
/// the environment, then `DEFAULT_DIMENSIONS`.
pub fn resolve_dimensions(width: Option<u16>, height: Option<u16>) -> (u16, u16) {
    if let (Some(width), Some(height)) = (width, height) {
        return (width, height);
    }

    let detected = terminal_dimensions()
        .or_else(|| {
            debug!("stdout is not a terminal, trying COLUMNS/LINES");
            env_dimensions()
        })
        .unwrap_or(DEFAULT_DIMENSIONS);

    (width.unwrap_or(detected.0), height.unwrap_or(detected.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dimensions_win() {
        assert_eq!(resolve_dimensions(Some(100), Some(40)), (100, 40));
    }

    #[test]
    fn test_partial_override_keeps_given_side() {
        let (width, height) = resolve_dimensions(Some(33), None);
        assert_eq!(width, 33);
        assert!(height > 0);

        let (width, height) = resolve_dimensions(None, Some(12));
        assert!(width > 0);
        assert_eq!(height, 12);
    }

    #[test]
    fn test_dimensions_from_requires_both_sides() {
        assert_eq!(dimensions_from(Some(80), Some(24)), Some((80, 24)));
        assert_eq!(dimensions_from(Some(80), None), None);
        assert_eq!(dimensions_from(None, Some(24)), None);
        assert_eq!(dimensions_from(Some(0), Some(24)), None);
    }
}
