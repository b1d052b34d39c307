//! Scripted bot and helpers shared by the integration tests.
#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use chaser_referee::prelude::*;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, Layer, Registry};

/// Upper bound of every single wait, so a broken state machine fails instead of hanging.
pub const STEP: Duration = Duration::from_secs(5);

/// Keep-alive period used by test links.
pub const KEEP_ALIVE: Duration = Duration::from_millis(50);

/// Print the referee's debug logs when `CHASER_TEST_LOG=true`.
pub fn init_debug_logger() {
    if !std::env::var("CHASER_TEST_LOG").is_ok_and(|val| val.eq_ignore_ascii_case("true")) {
        return;
    }
    let format = fmt::format()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_target(false);
    let reg = Registry::default().with(
        fmt::layer()
            .event_format(format)
            .with_filter(LevelFilter::DEBUG),
    );
    let _ = tracing::subscriber::set_global_default(reg);
}

/// Link listening on an ephemeral loopback port.
pub async fn bind(side: Side, game: &SharedGame) -> PlayerLink {
    init_debug_logger();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    PlayerLink::bind(side, addr, game.clone(), KEEP_ALIVE)
        .await
        .unwrap()
}

/// Wait for `kind` on `link`, failing the test after [`STEP`].
pub async fn wait_for(link: &PlayerLink, kind: LinkEventKind) -> Option<LinkEvent> {
    timeout(STEP, link.subscribe(kind))
        .await
        .unwrap_or_else(|_| panic!("{kind:?} never came on {}'s link", link.side()))
}

pub struct Bot {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Bot {
    /// Connect without saying anything.
    pub async fn connect(addr: SocketAddr) -> Bot {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Bot {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Connect, introduce itself and wait until the link accepted it.
    pub async fn join(link: &PlayerLink, name: &str) -> Bot {
        let mut bot = Bot::connect(link.local_addr()).await;
        bot.send_raw(name.as_bytes()).await;
        assert_eq!(
            wait_for(link, LinkEventKind::Connect).await,
            Some(LinkEvent::Connected(name.to_string()))
        );
        bot
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    pub async fn send(&mut self, token: &str) {
        self.send_raw(format!("{token}\r\n").as_bytes()).await;
    }

    /// Next non-empty line, trimmed. `None` once the server hung up.
    pub async fn recv_line(&mut self) -> Option<String> {
        loop {
            let mut line = String::new();
            let n = timeout(STEP, self.reader.read_line(&mut line))
                .await
                .expect("no line from the server")
                .ok()?;
            if n == 0 {
                return None;
            }
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }
    }

    /// Drain until the server closes the connection.
    pub async fn expect_closed(&mut self) {
        let mut buf = [0; 256];
        loop {
            match timeout(STEP, self.reader.read(&mut buf))
                .await
                .expect("connection still open")
            {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        }
    }

    /// Assert the server sends nothing for a while.
    pub async fn expect_silence(&mut self, duration: Duration) {
        let mut buf = [0; 256];
        if let Ok(Ok(n)) = timeout(duration, self.reader.read(&mut buf)).await {
            assert_eq!(
                n,
                0,
                "unexpected message {:?}",
                String::from_utf8_lossy(&buf[..n])
            );
        }
    }

    /// Play a whole turn with `command`, returning the two visions received.
    pub async fn play_turn(&mut self, command: &str) -> (String, String) {
        assert_eq!(self.recv_line().await.as_deref(), Some("@"));
        self.send("gr").await;
        let ready = self.recv_line().await.expect("no vision after gr");
        self.send(command).await;
        let after = self.recv_line().await.expect("no vision after command");
        self.send("#").await;
        (ready, after)
    }
}
