//! Reference bot: `chaser-bot <port> [host] [name]`
//!
//! Walks towards an adjacent item when it sees one, else towards any free cell.

use std::env;

use anyhow::Context;
use chaser_referee::{
    client::BotSession,
    game_state::{Action, Cell, Command, Direction, Vision},
    logger::init_stderr_logger,
};

/// Vision indices of the four neighbors, with the direction leading there.
const NEIGHBORS: [(usize, Direction); 4] = [
    (1, Direction::Up),
    (3, Direction::Left),
    (5, Direction::Right),
    (7, Direction::Down),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = env::args();
    let _ = args.next(); // Skip binary name

    let port: u16 = args
        .next()
        .context("usage: chaser-bot <port> [host] [name]")?
        .parse()
        .context("invalid port")?;
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let name = args.next().unwrap_or_else(|| "chaser-bot".to_string());
    init_stderr_logger();

    let mut session = BotSession::connect((host.as_str(), port), &name)
        .await
        .with_context(|| format!("connecting to {host}:{port}"))?;

    while let Some(vision) = session.next_turn().await? {
        if vision.is_decided() {
            break;
        }
        match session.send(choose_move(&vision)).await? {
            Some(after) if !after.is_decided() => {}
            _ => break,
        }
    }
    session.close().await;
    Ok(())
}

fn choose_move(vision: &Vision) -> Command {
    let cells = vision.cells();
    let towards = |cell: Cell| {
        NEIGHBORS
            .iter()
            .find(|(index, _)| cells[*index] == cell.digit())
            .map(|(_, direction)| *direction)
    };
    let direction = towards(Cell::Item)
        .or_else(|| towards(Cell::Empty))
        .unwrap_or(Direction::Up);
    Command::new(Action::Walk, direction)
}
