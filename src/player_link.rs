//! Network side of one player.
//!
//! A [`PlayerLink`] listens on a port and accepts exactly one bot for its [`Side`]. Every socket
//! that connects while the link is [`LinkStatus::Empty`] is held pending; the first one to send
//! anything becomes the client (its first payload is its name), every other pending socket is
//! closed and the listener shuts down.
//!
//! Once a bot is connected the link runs the turn protocol:
//!
//! ```text
//! Idle --turn_start--> AwaitingReady --"gr"--> AwaitingCommand --command--> AwaitingAck --"#"--> Idle
//!   \                        \                        \
//!    fin_game                 decided vision           decided vision
//!     \                        \                        \
//!      +----------------------> Terminal <---------------+
//! ```
//!
//! Any unexpected input, a socket failure or a disconnection sends the link to
//! [`LinkStatus::Dead`], which is final. Interested parties observe the link through single-fire
//! [`Subscription`]s.
//!
//! The state machine runs in its own task: the handle only sends requests to it, so transitions
//! of one link never interleave.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::Context as _;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::configuration::Configuration;
use crate::game_state::{Side, Vision};
use crate::protocol::{self, LineBuffer};
use crate::shared_game::SharedGame;

const READ_BUFFER_SIZE: usize = 4096;

/// Observable state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    /// Listening, no bot authenticated yet.
    #[default]
    Empty,
    /// Bot connected, waiting for its turn.
    Idle,
    /// `@` sent, waiting for `gr`.
    AwaitingReady,
    /// Vision sent, waiting for a command.
    AwaitingCommand,
    /// Command answered, waiting for `#`.
    AwaitingAck,
    /// Final vision sent, waiting for the bot to leave.
    Terminal,
    /// Closed for good.
    Dead,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkStatus::Empty => "empty",
            LinkStatus::Idle => "idle",
            LinkStatus::AwaitingReady => "awaiting-ready",
            LinkStatus::AwaitingCommand => "awaiting-command",
            LinkStatus::AwaitingAck => "awaiting-ack",
            LinkStatus::Terminal => "terminal",
            LinkStatus::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// Kind of event a [`Subscription`] waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEventKind {
    /// A bot authenticated.
    Connect,
    /// The link died.
    Close,
    /// A turn cycle completed and the link is idle again.
    TurnEnd,
}

/// Event delivered to a [`Subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A bot authenticated with this name.
    Connected(String),
    /// The link died.
    Closed,
    /// The bot acknowledged the end of its turn.
    TurnEnded,
}

impl LinkEvent {
    fn kind(&self) -> LinkEventKind {
        match self {
            LinkEvent::Connected(_) => LinkEventKind::Connect,
            LinkEvent::Closed => LinkEventKind::Close,
            LinkEvent::TurnEnded => LinkEventKind::TurnEnd,
        }
    }
}

/// Misuse of a link by its caller. The link has already dealt with it when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The request needs an idle link.
    #[error("link is {0}, expected idle")]
    NotIdle(LinkStatus),
    /// The link is dead.
    #[error("link is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    waiting: HashMap<u64, (LinkEventKind, oneshot::Sender<LinkEvent>)>,
    name: Option<String>,
    status: LinkStatus,
}

impl Registry {
    fn subscribe(&mut self, kind: LinkEventKind) -> (u64, oneshot::Receiver<LinkEvent>) {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;
        match kind {
            LinkEventKind::Close if self.status == LinkStatus::Dead => {
                let _ = tx.send(LinkEvent::Closed);
            }
            LinkEventKind::Connect if self.name.is_some() => {
                let _ = tx.send(LinkEvent::Connected(self.name.clone().unwrap_or_default()));
            }
            // can no longer happen: dropping the sender resolves the subscription to `None`
            _ if self.status == LinkStatus::Dead => {}
            _ => {
                self.waiting.insert(id, (kind, tx));
            }
        }
        (id, rx)
    }

    fn fire(&mut self, event: LinkEvent) {
        let kind = event.kind();
        match &event {
            LinkEvent::Connected(name) => self.name = Some(name.clone()),
            LinkEvent::Closed => self.status = LinkStatus::Dead,
            LinkEvent::TurnEnded => {}
        }
        let ids: Vec<u64> = self
            .waiting
            .iter()
            .filter(|(_, (k, _))| *k == kind || kind == LinkEventKind::Close)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            if let Some((k, tx)) = self.waiting.remove(&id) {
                if k == kind {
                    let _ = tx.send(event.clone());
                }
            }
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-fire wait for one link event.
///
/// Resolves to `Some(event)` when it happens, or `None` once it can no longer happen (e.g.
/// waiting for a turn end on a dead link). Dropping the subscription unsubscribes it.
#[must_use = "a subscription does nothing unless awaited"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: oneshot::Receiver<LinkEvent>,
    registry: Arc<Mutex<Registry>>,
}

impl Future for Subscription {
    type Output = Option<LinkEvent>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.registry).waiting.remove(&self.id);
    }
}

enum Request {
    TurnStart(oneshot::Sender<Result<(), LinkError>>),
    FinGame(oneshot::Sender<Result<(), LinkError>>),
    Close(oneshot::Sender<()>),
}

/// Handle to the link of one side. Cheap to clone; the link lives as long as one handle does.
#[derive(Debug, Clone)]
pub struct PlayerLink {
    side: Side,
    local_addr: SocketAddr,
    requests: mpsc::UnboundedSender<Request>,
    registry: Arc<Mutex<Registry>>,
}

impl PlayerLink {
    /// Listen on `port` on every interface, with the configured keep-alive period.
    pub async fn listen(
        side: Side,
        port: u16,
        game: SharedGame,
        config: &Configuration,
    ) -> anyhow::Result<PlayerLink> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        Self::bind(side, addr, game, config.keep_alive()).await
    }

    /// Listen on `addr`. Commands of the connected bot are applied to `game`.
    #[instrument(skip(game))]
    pub async fn bind(
        side: Side,
        addr: SocketAddr,
        game: SharedGame,
        keep_alive: Duration,
    ) -> anyhow::Result<PlayerLink> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("could not listen on {addr} for {side}"))?;
        let local_addr = listener
            .local_addr()
            .context("could not read listening address")?;
        info!(%local_addr, "waiting for {side}'s bot");

        let (requests, request_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Mutex::new(Registry::default()));

        let actor = LinkActor {
            side,
            game,
            keep_alive,
            registry: registry.clone(),
            requests: request_rx,
            inbound_tx,
            inbound: inbound_rx,
            state: LinkState::Empty(Lobby::new(listener)),
        };
        tokio::spawn(actor.run());

        Ok(PlayerLink {
            side,
            local_addr,
            requests,
            registry,
        })
    }

    /// Side this link plays for.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Address the link listens (or listened) on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current protocol state.
    pub fn status(&self) -> LinkStatus {
        lock(&self.registry).status
    }

    /// Name declared by the connected bot.
    pub fn name(&self) -> Option<String> {
        lock(&self.registry).name.clone()
    }

    /// Wait for the next event of `kind`.
    ///
    /// `Connect` and `Close` are sticky: subscribing after they happened resolves immediately.
    pub fn subscribe(&self, kind: LinkEventKind) -> Subscription {
        let (id, rx) = lock(&self.registry).subscribe(kind);
        Subscription {
            id,
            rx,
            registry: self.registry.clone(),
        }
    }

    /// Begin the bot's turn by sending `@`.
    ///
    /// Outside [`LinkStatus::Idle`] the link closes itself and reports the misuse.
    pub async fn turn_start(&self) -> Result<(), LinkError> {
        self.request(Request::TurnStart).await
    }

    /// Send the final vision (flagged as decided) and wait for the bot to leave.
    ///
    /// Does nothing outside [`LinkStatus::Idle`].
    pub async fn fin_game(&self) -> Result<(), LinkError> {
        self.request(Request::FinGame).await
    }

    /// Close the link. Idempotent; returns once the link is dead.
    pub async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        if self.requests.send(Request::Close(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    async fn request(
        &self,
        make: fn(oneshot::Sender<Result<(), LinkError>>) -> Request,
    ) -> Result<(), LinkError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(make(tx))
            .map_err(|_| LinkError::Closed)?;
        rx.await.unwrap_or(Err(LinkError::Closed))
    }
}

enum Inbound {
    Hello {
        id: u64,
        name: String,
        rest: Option<String>,
        stream: TcpStream,
    },
    PendingClosed {
        id: u64,
    },
    Line(String),
    Disconnected,
    KeepAlive,
}

/// Listener and the sockets that connected but did not speak yet.
struct Lobby {
    listener: TcpListener,
    pending: HashMap<u64, JoinHandle<()>>,
    next_id: u64,
}

impl Lobby {
    fn new(listener: TcpListener) -> Self {
        Lobby {
            listener,
            pending: HashMap::new(),
            next_id: 0,
        }
    }
}

impl Drop for Lobby {
    fn drop(&mut self) {
        // aborting a pending task drops its socket
        for task in self.pending.values() {
            task.abort();
        }
    }
}

/// Periodic tick delivered to the link while a bot is connected. Cancelled on drop.
struct KeepAlive(JoinHandle<()>);

impl KeepAlive {
    fn start(period: Duration, inbound: mpsc::UnboundedSender<Inbound>) -> Self {
        KeepAlive(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if inbound.send(Inbound::KeepAlive).is_err() {
                    break;
                }
            }
        }))
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The authenticated bot.
struct Client {
    name: String,
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
    _keep_alive: KeepAlive,
}

impl Client {
    fn start(
        name: String,
        stream: TcpStream,
        inbound: mpsc::UnboundedSender<Inbound>,
        keep_alive: Duration,
    ) -> Self {
        let (read_half, writer) = stream.into_split();
        Client {
            name,
            writer,
            reader: tokio::spawn(read_lines(read_half, inbound.clone())),
            _keep_alive: KeepAlive::start(keep_alive, inbound),
        }
    }

    async fn send(&mut self, token: &str) -> io::Result<()> {
        trace!(bot = %self.name, token, "send");
        self.writer
            .write_all(protocol::frame(token).as_bytes())
            .await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

enum LinkState {
    Empty(Lobby),
    Idle(Client),
    AwaitingReady(Client),
    AwaitingCommand(Client),
    AwaitingAck(Client),
    Terminal(Client),
    Dead,
}

impl LinkState {
    fn status(&self) -> LinkStatus {
        match self {
            LinkState::Empty(_) => LinkStatus::Empty,
            LinkState::Idle(_) => LinkStatus::Idle,
            LinkState::AwaitingReady(_) => LinkStatus::AwaitingReady,
            LinkState::AwaitingCommand(_) => LinkStatus::AwaitingCommand,
            LinkState::AwaitingAck(_) => LinkStatus::AwaitingAck,
            LinkState::Terminal(_) => LinkStatus::Terminal,
            LinkState::Dead => LinkStatus::Dead,
        }
    }

    fn client_mut(&mut self) -> Option<&mut Client> {
        match self {
            LinkState::Idle(client)
            | LinkState::AwaitingReady(client)
            | LinkState::AwaitingCommand(client)
            | LinkState::AwaitingAck(client)
            | LinkState::Terminal(client) => Some(client),
            LinkState::Empty(_) | LinkState::Dead => None,
        }
    }
}

struct LinkActor {
    side: Side,
    game: SharedGame,
    keep_alive: Duration,
    registry: Arc<Mutex<Registry>>,
    requests: mpsc::UnboundedReceiver<Request>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    state: LinkState,
}

impl LinkActor {
    #[instrument(name = "link", skip_all, fields(side = %self.side))]
    async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = accept_pending(&self.state) => self.on_accept(accepted),
                Some(inbound) = self.inbound.recv() => self.on_inbound(inbound).await,
                request = self.requests.recv() => match request {
                    Some(request) => self.on_request(request).await,
                    None => break,
                },
            }
        }
        // every handle is gone
        self.close();
    }

    fn on_accept(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        let LinkState::Empty(lobby) = &mut self.state else {
            return;
        };
        match accepted {
            Ok((stream, peer)) => {
                let id = lobby.next_id;
                lobby.next_id += 1;
                debug!(%peer, id, "pending connection");
                let task = tokio::spawn(await_hello(id, stream, self.inbound_tx.clone()));
                lobby.pending.insert(id, task);
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }

    async fn on_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Hello {
                id,
                name,
                rest,
                stream,
            } => self.on_hello(id, name, rest, stream).await,
            Inbound::PendingClosed { id } => {
                if let LinkState::Empty(lobby) = &mut self.state {
                    lobby.pending.remove(&id);
                    debug!(id, "pending connection left");
                }
            }
            Inbound::Line(line) => self.on_line(line).await,
            Inbound::Disconnected => {
                if self.state.client_mut().is_some() {
                    info!(status = %self.state.status(), "bot disconnected");
                    self.close();
                }
            }
            Inbound::KeepAlive => {
                // a zero-length send still reports a reset connection
                let result = match self.state.client_mut() {
                    Some(client) => client.writer.write(&[]).await,
                    None => return,
                };
                if let Err(e) = result {
                    warn!("keep-alive failed: {e}");
                    self.close();
                }
            }
        }
    }

    async fn on_hello(&mut self, id: u64, name: String, rest: Option<String>, stream: TcpStream) {
        let lobby = match mem::replace(&mut self.state, LinkState::Dead) {
            LinkState::Empty(lobby) => lobby,
            other => {
                self.state = other;
                debug!(id, "late connection rejected");
                return;
            }
        };
        // closes the listener and every other pending socket
        drop(lobby);

        info!(bot = %name, "bot connected");
        let client = Client::start(name.clone(), stream, self.inbound_tx.clone(), self.keep_alive);
        self.enter(LinkState::Idle(client));
        self.publish(LinkEvent::Connected(name));

        if let Some(rest) = rest {
            self.on_line(rest).await;
        }
    }

    async fn on_line(&mut self, line: String) {
        match mem::replace(&mut self.state, LinkState::Dead) {
            LinkState::AwaitingReady(client) if line == protocol::READY => {
                let vision = self.game.vision_for(self.side);
                self.send_vision(client, vision, LinkState::AwaitingCommand)
                    .await;
            }
            LinkState::AwaitingCommand(client) => match protocol::parse_command(&line) {
                Some(command) => {
                    let vision = self.game.apply_command(command, self.side);
                    debug!(?command, %vision, "command applied");
                    self.send_vision(client, vision, LinkState::AwaitingAck)
                        .await;
                }
                None => self.violation(LinkState::AwaitingCommand(client), &line),
            },
            LinkState::AwaitingAck(client) if line == protocol::END_OF_TURN => {
                self.enter(LinkState::Idle(client));
                self.publish(LinkEvent::TurnEnded);
            }
            state @ (LinkState::Empty(_) | LinkState::Dead) => self.state = state,
            state => self.violation(state, &line),
        }
    }

    async fn on_request(&mut self, request: Request) {
        match request {
            Request::TurnStart(reply) => {
                let result = self.turn_start().await;
                let _ = reply.send(result);
            }
            Request::FinGame(reply) => {
                let result = self.fin_game().await;
                let _ = reply.send(result);
            }
            Request::Close(reply) => {
                self.close();
                let _ = reply.send(());
            }
        }
    }

    async fn turn_start(&mut self) -> Result<(), LinkError> {
        match mem::replace(&mut self.state, LinkState::Dead) {
            LinkState::Idle(mut client) => {
                let result = client.send(protocol::TURN_BEGIN).await;
                self.enter(LinkState::AwaitingReady(client));
                if let Err(e) = result {
                    warn!("could not start turn: {e}");
                    self.close();
                    return Err(LinkError::Closed);
                }
                Ok(())
            }
            LinkState::Dead => Err(LinkError::Closed),
            other => {
                let status = other.status();
                warn!(%status, "turn started on a busy link");
                self.state = other;
                self.close();
                Err(LinkError::NotIdle(status))
            }
        }
    }

    async fn fin_game(&mut self) -> Result<(), LinkError> {
        match mem::replace(&mut self.state, LinkState::Dead) {
            LinkState::Idle(mut client) => {
                let vision = self.game.final_vision(self.side);
                let result = client.send(&vision.to_string()).await;
                self.enter(LinkState::Terminal(client));
                if let Err(e) = result {
                    warn!("could not send final vision: {e}");
                    self.close();
                    return Err(LinkError::Closed);
                }
                info!(%vision, "final vision sent");
                Ok(())
            }
            LinkState::Dead => Err(LinkError::Closed),
            other => {
                let status = other.status();
                self.state = other;
                Err(LinkError::NotIdle(status))
            }
        }
    }

    /// Send `vision`, then move to `next`, or to `Terminal` if the match is decided.
    async fn send_vision(
        &mut self,
        mut client: Client,
        vision: Vision,
        next: fn(Client) -> LinkState,
    ) {
        let result = client.send(&vision.to_string()).await;
        if vision.is_decided() {
            info!(%vision, "match decided");
            self.enter(LinkState::Terminal(client));
        } else {
            self.enter(next(client));
        }
        if let Err(e) = result {
            warn!("could not send vision: {e}");
            self.close();
        }
    }

    fn violation(&mut self, state: LinkState, line: &str) {
        warn!(status = %state.status(), line, "protocol violation");
        self.state = state;
        self.close();
    }

    fn enter(&mut self, state: LinkState) {
        let status = state.status();
        trace!(%status, "transition");
        self.state = state;
        lock(&self.registry).status = status;
    }

    fn publish(&self, event: LinkEvent) {
        lock(&self.registry).fire(event);
    }

    fn close(&mut self) {
        let previous = mem::replace(&mut self.state, LinkState::Dead);
        if let LinkState::Dead = previous {
            return;
        }
        info!(from = %previous.status(), "link closed");
        // lobby and client release their sockets and timers on drop
        drop(previous);
        self.publish(LinkEvent::Closed);
    }
}

async fn accept_pending(state: &LinkState) -> io::Result<(TcpStream, SocketAddr)> {
    match state {
        LinkState::Empty(lobby) => lobby.listener.accept().await,
        _ => std::future::pending().await,
    }
}

async fn await_hello(id: u64, mut stream: TcpStream, inbound: mpsc::UnboundedSender<Inbound>) {
    let mut buf = [0; READ_BUFFER_SIZE];
    let read = stream.read(&mut buf).await;
    let message = match read {
        Ok(0) | Err(_) => Inbound::PendingClosed { id },
        Ok(n) => {
            let (name, rest) = protocol::split_hello(&buf[..n]);
            Inbound::Hello {
                id,
                name,
                rest,
                stream,
            }
        }
    };
    let _ = inbound.send(message);
}

async fn read_lines(mut reader: OwnedReadHalf, inbound: mpsc::UnboundedSender<Inbound>) {
    let mut lines = LineBuffer::new();
    let mut buf = [0; READ_BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buf).await;
        match read {
            Ok(0) => break,
            Ok(n) => {
                for line in lines.push(&buf[..n]) {
                    if inbound.send(Inbound::Line(line)).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                debug!("read failed: {e}");
                break;
            }
        }
    }
    let _ = inbound.send(Inbound::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fire_once() {
        let mut registry = Registry::default();
        let (_, mut first) = registry.subscribe(LinkEventKind::TurnEnd);
        registry.fire(LinkEvent::TurnEnded);
        assert_eq!(first.try_recv(), Ok(LinkEvent::TurnEnded));
        assert!(registry.waiting.is_empty());

        // only future turn ends are seen
        let (_, mut second) = registry.subscribe(LinkEventKind::TurnEnd);
        assert!(second.try_recv().is_err());
        assert_eq!(registry.waiting.len(), 1);
    }

    #[test]
    fn test_sticky_events() {
        let mut registry = Registry::default();
        registry.fire(LinkEvent::Connected("bot".to_string()));
        let (_, mut connect) = registry.subscribe(LinkEventKind::Connect);
        assert_eq!(
            connect.try_recv(),
            Ok(LinkEvent::Connected("bot".to_string()))
        );

        let (_, mut turn_end) = registry.subscribe(LinkEventKind::TurnEnd);
        registry.fire(LinkEvent::Closed);
        assert_eq!(registry.status, LinkStatus::Dead);
        // can no longer happen
        assert_eq!(
            turn_end.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        );

        let (_, mut close) = registry.subscribe(LinkEventKind::Close);
        assert_eq!(close.try_recv(), Ok(LinkEvent::Closed));
        assert!(registry.waiting.is_empty());
    }

    #[tokio::test]
    async fn test_keep_alive_ticks_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let keep_alive = KeepAlive::start(Duration::from_millis(10), tx);
        let tick = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(matches!(tick, Some(Inbound::KeepAlive)));

        drop(keep_alive);
        // the aborted task releases its sender
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let registry = Arc::new(Mutex::new(Registry::default()));
        let (id, rx) = lock(&registry).subscribe(LinkEventKind::Close);
        let subscription = Subscription {
            id,
            rx,
            registry: registry.clone(),
        };
        assert_eq!(lock(&registry).waiting.len(), 1);
        drop(subscription);
        assert!(lock(&registry).waiting.is_empty());
    }
}
