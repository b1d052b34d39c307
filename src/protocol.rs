//! Line-oriented wire protocol spoken with the bots.
//!
//! Every message is one ASCII token terminated by `\r\n`:
//!
//! | direction       | token                  | meaning                          |
//! |-----------------|------------------------|----------------------------------|
//! | server → bot    | `@`                    | your turn begins                 |
//! | bot → server    | `gr`                   | ready, send me my surroundings   |
//! | server → bot    | `<flag><9 digits>`     | a [`Vision`](crate::game_state::Vision) |
//! | bot → server    | `[wpls][udlr]n?`       | a [`Command`]                    |
//! | bot → server    | `#`                    | end of turn                      |
//!
//! The very first payload a bot sends is its name and does not need a line terminator.

use crate::game_state::{Action, Command, Direction};

/// Server → bot: turn begins.
pub const TURN_BEGIN: &str = "@";
/// Bot → server: ready for the turn.
pub const READY: &str = "gr";
/// Bot → server: turn finished.
pub const END_OF_TURN: &str = "#";
/// Terminator appended to every outgoing token.
pub const LINE_END: &str = "\r\n";

/// Suffix asking the server not to highlight the surveyed area.
const NO_HINT: char = 'n';

/// Append the line terminator to `token`.
pub fn frame(token: &str) -> String {
    format!("{token}{LINE_END}")
}

/// Parse a command token. Returns `None` for anything outside the grammar.
pub fn parse_command(token: &str) -> Option<Command> {
    let mut chars = token.chars();
    let action = Action::from_char(chars.next()?)?;
    let direction = Direction::from_char(chars.next()?)?;
    let suppress_hint = match chars.next() {
        None => false,
        Some(NO_HINT) => true,
        Some(_) => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(Command {
        action,
        direction,
        suppress_hint,
    })
}

/// Split the first payload of a connection into the declared name and whatever followed its
/// first line break.
pub fn split_hello(payload: &[u8]) -> (String, Option<String>) {
    let text = String::from_utf8_lossy(payload);
    match text.split_once('\n') {
        Some((name, rest)) => {
            let rest = rest.trim();
            (
                name.trim().to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (text.trim().to_string(), None),
    }
}

/// Reassembles `\n`-terminated lines from arbitrary socket chunks.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completed, trimmed. Blank lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}
