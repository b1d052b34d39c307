//! # Chaser Referee
//!
//! A Rust crate refereeing "chaser", a two-player, turn-based grid chase between two bots
//! connected over raw TCP.
//!
//! It provides:
//! - The board model and its movement, look and search rules (`GameState`)
//! - A parser for the textual map format (`map_text`)
//! - One protocol state machine per player, accepting exactly one bot (`PlayerLink`)
//! - A match orchestrator alternating turns and deciding the outcome (`MatchOrchestrator`)
//! - A client session for writing bots in Rust (`BotSession`)
//!
//! Each link runs in its own tokio task, and both share the board through a [`SharedGame`]
//! handle that publishes a snapshot after every change.
//!
//! # Documentation Overview
//!
//! - For the board rules and the vision strings sent to bots, see [`game_state`].
//! - For the wire protocol, see [`protocol`] and the [`player_link`] state machine.
//! - For how turns alternate and how disconnections are judged, see [`match_runner`].
//! - For the bot side of the protocol, see [`client`].
//! - For ports, timeouts and logging, see
//!   [`Configuration`](crate::configuration::Configuration).
//!
//! # Usage Example
//!
//! Below is a minimal referee waiting for both bots on the default ports:
//!
//! ```no_run
//! use chaser_referee::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Configuration::new();
//!
//!     // Default 3x3 field, or map_text::parse(...) for a custom one
//!     let game = SharedGame::default();
//!
//!     let cool = PlayerLink::listen(Side::Cool, config.cool_port(), game.clone(), &config).await?;
//!     let hot = PlayerLink::listen(Side::Hot, config.hot_port(), game.clone(), &config).await?;
//!
//!     // Wait for both bots to introduce themselves
//!     let _ = tokio::join!(
//!         cool.subscribe(LinkEventKind::Connect),
//!         hot.subscribe(LinkEventKind::Connect)
//!     );
//!
//!     let (mut progress, report) = start_match(game, cool, hot, &config);
//!     while let Some(p) = progress.recv().await {
//!         println!("{p}");
//!     }
//!     println!("{}", report.await?.outcome);
//!     Ok(())
//! }
//! ```
//!
//! # Example Bot
//!
//! Here’s a minimal bot that walks right every turn, speaking the protocol by hand (see
//! [`BotSession`](crate::client::BotSession) for the same on tokio):
//!
//! ```no_run
//! use std::{
//!     io::{BufRead, BufReader, Write},
//!     net::TcpStream,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut stream = TcpStream::connect("127.0.0.1:2009")?;
//!     stream.write_all(b"walker")?; // the first payload is the bot's name
//!
//!     let mut lines = BufReader::new(stream.try_clone()?).lines();
//!     while let Some(line) = lines.next() {
//!         if line?.trim() != "@" {
//!             continue;
//!         }
//!         stream.write_all(b"gr\r\n")?;
//!         let vision = lines.next().unwrap_or(Ok(String::new()))?;
//!         if vision.starts_with('0') {
//!             break;
//!         }
//!         stream.write_all(b"wr\r\n")?;
//!         let vision = lines.next().unwrap_or(Ok(String::new()))?;
//!         if vision.starts_with('0') {
//!             break;
//!         }
//!         stream.write_all(b"#\r\n")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Bot Requirements
//!
//! - Speak only when spoken to: any message outside of the bot's turn closes its link
//! - Every message is one token terminated by `\r\n`:
//!  * Server -> Bot : `@` (turn begins), then a vision string after each request
//!  * Bot -> Server : `gr` (ready), a command such as `wr`, then `#` (end of turn)
//! - A vision string starting with `0` means the match is over and the bot should disconnect
#![warn(missing_docs)]

pub use anyhow;
pub mod client;
pub mod configuration;
pub mod game_state;
pub mod logger;
pub mod map_text;
pub mod match_runner;
pub mod player_link;
pub mod protocol;
pub mod shared_game;

/// Commonly used types and functions for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use chaser_referee::prelude::*;
/// ```
///
/// Includes:
/// - [`Configuration`](crate::configuration::Configuration)
/// - the board types of [`game_state`](crate::game_state)
/// - [`SharedGame`](crate::shared_game::SharedGame) and [`map_text`](crate::map_text)
/// - [`PlayerLink`](crate::player_link::PlayerLink) and its events
/// - [`start_match`](crate::match_runner::start_match) and its reports
/// - [`BotSession`](crate::client::BotSession) for writing bots
pub mod prelude {
    pub use crate::client::BotSession;
    pub use crate::configuration::Configuration;
    pub use crate::game_state::{Cell, Field, GameState, Outcome, Position, Side, Vision};
    pub use crate::map_text::{self, MapError};
    pub use crate::match_runner::{start_match, MatchOrchestrator, MatchReport, Progress};
    pub use crate::player_link::{
        LinkError, LinkEvent, LinkEventKind, LinkStatus, PlayerLink, Subscription,
    };
    pub use crate::shared_game::SharedGame;
}

pub use shared_game::SharedGame;
