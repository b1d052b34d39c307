//! Text format of a field.
//!
//! A field is described by newline-separated tagged lines:
//!
//! ```text
//! T:100          turn pairs
//! S:3,3          width,height
//! C:0,0          Cool start (x,y)
//! H:2,2          Hot start (x,y)
//! D:0,0,0        one line per grid row, in order
//! D:2,3,2
//! D:0,0,0
//! ```
//!
//! Lines are trimmed. A line that does not match one of the five forms exactly is ignored.

use thiserror::Error;
use tracing::{debug, instrument};

use crate::game_state::{Cell, GameState, Position, Side};

/// Why a map text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// `T`, `S`, `C` or `H` appeared twice.
    #[error("'{0}:' appears more than once")]
    DuplicateTag(char),
    /// `T`, `S`, `C` or `H` is absent.
    #[error("'{0}:' is missing")]
    MissingTag(char),
    /// Number of `D:` rows differs from the declared height.
    #[error("expected {expected} 'D:' rows, found {found}")]
    RowCount {
        /// Declared height.
        expected: usize,
        /// Rows present.
        found: usize,
    },
    /// A `D:` row has a length different from the declared width.
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        /// Index of the offending row.
        row: usize,
        /// Declared width.
        expected: usize,
        /// Cells in that row.
        found: usize,
    },
    /// A start position lies outside the declared size.
    #[error("{0} start position is outside the field")]
    StartOutOfBounds(Side),
}

enum Line {
    Row(Vec<Cell>),
    Turns(u32),
    Size(usize, usize),
    Start(Side, usize, usize),
}

/// Parse a map text into a fresh [`GameState`].
#[instrument(skip_all)]
pub fn parse(text: &str) -> Result<GameState, MapError> {
    let mut rows = Vec::new();
    let mut turns = None;
    let mut size = None;
    let mut cool = None;
    let mut hot = None;

    for raw in text.lines() {
        let Some(line) = parse_line(raw.trim()) else {
            if !raw.trim().is_empty() {
                debug!(line = raw, "ignoring unrecognized line");
            }
            continue;
        };
        match line {
            Line::Row(row) => rows.push(row),
            Line::Turns(t) => set_once(&mut turns, t, 'T')?,
            Line::Size(w, h) => set_once(&mut size, (w, h), 'S')?,
            Line::Start(Side::Cool, x, y) => set_once(&mut cool, (x, y), 'C')?,
            Line::Start(Side::Hot, x, y) => set_once(&mut hot, (x, y), 'H')?,
        }
    }

    let turns = turns.ok_or(MapError::MissingTag('T'))?;
    let (width, height) = size.ok_or(MapError::MissingTag('S'))?;
    let cool = cool.ok_or(MapError::MissingTag('C'))?;
    let hot = hot.ok_or(MapError::MissingTag('H'))?;

    if rows.len() != height {
        return Err(MapError::RowCount {
            expected: height,
            found: rows.len(),
        });
    }
    if let Some((row, found)) = rows
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != width)
    {
        return Err(MapError::RowWidth {
            row,
            expected: width,
            found,
        });
    }

    let to_position = |side: Side, (x, y): (usize, usize)| {
        if x < width && y < height {
            Ok(Position::new(y as i32, x as i32))
        } else {
            Err(MapError::StartOutOfBounds(side))
        }
    };
    let cool = to_position(Side::Cool, cool)?;
    let hot = to_position(Side::Hot, hot)?;

    Ok(GameState::new(rows, cool, hot, turns))
}

fn set_once<T>(slot: &mut Option<T>, value: T, tag: char) -> Result<(), MapError> {
    if slot.is_some() {
        return Err(MapError::DuplicateTag(tag));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_line(line: &str) -> Option<Line> {
    let (tag, body) = line.split_once(':')?;
    match tag {
        "D" => body
            .split(',')
            .map(|digit| match digit {
                "0" | "2" | "3" => Cell::from_digit(digit.as_bytes()[0] - b'0'),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Line::Row),
        "T" => parse_uint(body).map(Line::Turns),
        "S" => parse_pair(body).map(|(w, h)| Line::Size(w, h)),
        "C" => parse_pair(body).map(|(x, y)| Line::Start(Side::Cool, x, y)),
        "H" => parse_pair(body).map(|(x, y)| Line::Start(Side::Hot, x, y)),
        _ => None,
    }
}

fn parse_uint<T: std::str::FromStr>(text: &str) -> Option<T> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_pair(text: &str) -> Option<(usize, usize)> {
    let (a, b) = text.split_once(',')?;
    Some((parse_uint(a)?, parse_uint(b)?))
}
