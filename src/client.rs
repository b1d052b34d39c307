//! Bot side of the protocol.
//!
//! A [`BotSession`] connects to a referee, introduces itself, then plays one turn at a time:
//! [`next_turn`](BotSession::next_turn) waits for `@`, answers `gr` and returns the vision;
//! [`send`](BotSession::send) submits a command, returns the resulting vision and acknowledges
//! the turn with `#`.
//!
//! ```no_run
//! use chaser_referee::client::BotSession;
//! use chaser_referee::game_state::{Action, Command, Direction};
//!
//! # async fn play() -> anyhow::Result<()> {
//! let mut session = BotSession::connect("127.0.0.1:2009", "walker").await?;
//! while let Some(vision) = session.next_turn().await? {
//!     if vision.is_decided() {
//!         break;
//!     }
//!     session.send(Command::new(Action::Walk, Direction::Right)).await?;
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! A vision flagged as decided ends the session: it is returned once, then the session closes
//! its side of the connection.

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, instrument, trace};

use crate::game_state::{Command, Vision};
use crate::protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    MyTurn,
    Closed,
}

/// Connection of one bot to a referee.
#[derive(Debug)]
pub struct BotSession {
    name: String,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    phase: Phase,
}

impl BotSession {
    /// Connect to the referee listening on `addr` and introduce the bot as `name`.
    #[instrument(skip(addr))]
    pub async fn connect(addr: impl ToSocketAddrs, name: &str) -> anyhow::Result<BotSession> {
        let stream = TcpStream::connect(addr)
            .await
            .context("could not reach the referee")?;
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(name.as_bytes())
            .await
            .context("could not send the bot's name")?;
        info!("connected");
        Ok(BotSession {
            name: name.to_string(),
            reader: BufReader::new(reader),
            writer,
            phase: Phase::Waiting,
        })
    }

    /// Name the bot introduced itself with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A turn is in progress and waits for [`send`](Self::send).
    pub fn is_my_turn(&self) -> bool {
        self.phase == Phase::MyTurn
    }

    /// The session is over, no more turns will come.
    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Wait for the next turn and return the vision around the bot.
    ///
    /// Returns the final vision instead when the referee ends the match, and `None` once the
    /// connection is gone.
    pub async fn next_turn(&mut self) -> anyhow::Result<Option<Vision>> {
        match self.phase {
            Phase::Closed => return Ok(None),
            Phase::MyTurn => bail!("{}'s turn is still waiting for a command", self.name),
            Phase::Waiting => {}
        }
        let Some(token) = self.recv().await else {
            return Ok(None);
        };
        if token != protocol::TURN_BEGIN {
            // the match ended while waiting
            let vision = self.vision_from(&token)?;
            if !vision.is_decided() {
                self.phase = Phase::Closed;
                bail!("vision {token:?} received outside of a turn");
            }
            self.close().await;
            return Ok(Some(vision));
        }

        self.post(protocol::READY).await?;
        let Some(vision) = self.recv_vision().await? else {
            return Ok(None);
        };
        if vision.is_decided() {
            self.close().await;
        } else {
            self.phase = Phase::MyTurn;
        }
        Ok(Some(vision))
    }

    /// Play `command` for the current turn and return the resulting vision.
    ///
    /// The turn is acknowledged unless that vision is decided, in which case the session
    /// closes. `None` once the connection is gone.
    pub async fn send(&mut self, command: Command) -> anyhow::Result<Option<Vision>> {
        if self.phase != Phase::MyTurn {
            bail!("not {}'s turn", self.name);
        }
        self.post(&command.to_string()).await?;
        let Some(vision) = self.recv_vision().await? else {
            return Ok(None);
        };
        if vision.is_decided() {
            self.close().await;
        } else {
            self.post(protocol::END_OF_TURN).await?;
            self.phase = Phase::Waiting;
        }
        Ok(Some(vision))
    }

    /// Leave the match. Idempotent.
    pub async fn close(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        self.phase = Phase::Closed;
        let _ = self.writer.shutdown().await;
        info!(bot = %self.name, "session closed");
    }

    async fn post(&mut self, token: &str) -> anyhow::Result<()> {
        trace!(bot = %self.name, token, "send");
        let result = self
            .writer
            .write_all(protocol::frame(token).as_bytes())
            .await;
        if result.is_err() {
            self.phase = Phase::Closed;
        }
        result.with_context(|| format!("could not send {token:?}"))
    }

    /// Next non-empty line. `None` once the referee hung up.
    async fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line).await;
            match read {
                Ok(0) => {}
                Ok(_) => {
                    let token = line.trim();
                    if token.is_empty() {
                        continue;
                    }
                    trace!(bot = %self.name, token, "recv");
                    return Some(token.to_string());
                }
                Err(e) => debug!("read failed: {e}"),
            }
            debug!(bot = %self.name, "referee hung up");
            self.phase = Phase::Closed;
            return None;
        }
    }

    async fn recv_vision(&mut self) -> anyhow::Result<Option<Vision>> {
        match self.recv().await {
            Some(token) => self.vision_from(&token).map(Some),
            None => Ok(None),
        }
    }

    fn vision_from(&mut self, token: &str) -> anyhow::Result<Vision> {
        match Vision::parse(token) {
            Some(vision) => Ok(vision),
            None => {
                self.phase = Phase::Closed;
                bail!("malformed vision {token:?}")
            }
        }
    }
}
