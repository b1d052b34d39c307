//! Alternates the turns of two connected links until the budget runs out or a bot leaves.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument, warn};

use crate::configuration::Configuration;
use crate::game_state::{Outcome, Side};
use crate::player_link::{LinkEventKind, PlayerLink};
use crate::shared_game::SharedGame;

/// Progress notification emitted at the start of every half-turn, and once at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Half-turns left, this one included.
    Remaining(u64),
    /// The board already names a winner.
    Decided(Side),
    /// The match is over.
    Finished(Outcome),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Remaining(n) => write!(f, "{n}"),
            Progress::Decided(side) | Progress::Finished(Outcome::Winner(side)) => {
                write!(f, "{}", side.letter())
            }
            Progress::Finished(Outcome::Draw) => f.write_str("0"),
        }
    }
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchReport {
    /// Winner, or a draw.
    pub outcome: Outcome,
    /// A bot left before the turn budget was spent.
    pub aborted: bool,
    /// Half-turns started, the interrupted one included.
    pub half_turns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HalfTurn {
    Completed,
    ActiveClosed,
    InactiveClosed,
}

/// Runs one match over a [`SharedGame`] and the two links of its players.
#[derive(Debug)]
pub struct MatchOrchestrator {
    game: SharedGame,
    cool: PlayerLink,
    hot: PlayerLink,
    progress: Option<mpsc::UnboundedSender<Progress>>,
    turn_timeout: Option<Duration>,
}

impl MatchOrchestrator {
    /// Both links should already be connected: a link that is not idle when its turn comes
    /// closes itself, which forfeits the match.
    pub fn new(game: SharedGame, cool: PlayerLink, hot: PlayerLink) -> Self {
        debug_assert_eq!(cool.side(), Side::Cool);
        debug_assert_eq!(hot.side(), Side::Hot);
        MatchOrchestrator {
            game,
            cool,
            hot,
            progress: None,
            turn_timeout: None,
        }
    }

    /// Send [`Progress`] notifications to `tx`.
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Close the active link when a half-turn outlasts `timeout`.
    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Play the match to its end.
    ///
    /// Each of the `turn_budget` pairs is a Cool half-turn followed by a Hot half-turn. When the
    /// active bot leaves, its opponent wins and receives its final vision. When the waiting bot
    /// leaves, the active one wins and is sent nothing more. Either way a winner already named
    /// by the board is kept. After the last pair the outcome falls back to the scores and both
    /// bots receive their final vision.
    #[instrument(name = "match", skip_all)]
    pub async fn run(self) -> MatchReport {
        let budget = self.game.turn_budget();
        info!(
            budget,
            cool = ?self.cool.name(),
            hot = ?self.hot.name(),
            "match started"
        );

        let mut half_turns: u64 = 0;
        for i in 0..budget {
            for side in [Side::Cool, Side::Hot] {
                let progress = match self.game.winner() {
                    Some(winner) => Progress::Decided(winner),
                    None => Progress::Remaining(remaining(budget, i, side)),
                };
                self.report(progress);
                half_turns += 1;

                match self.half_turn(side).await {
                    HalfTurn::Completed => {}
                    HalfTurn::ActiveClosed => {
                        let winner = self.settle(side.opponent());
                        if let Err(e) = self.link(side.opponent()).fin_game().await {
                            debug!("no final vision for {}: {e}", side.opponent());
                        }
                        return self.finish(winner, half_turns, true);
                    }
                    HalfTurn::InactiveClosed => {
                        let winner = self.settle(side);
                        return self.finish(winner, half_turns, true);
                    }
                }
            }
        }

        let outcome = self.game.outcome();
        self.report(Progress::Finished(outcome));
        for link in [&self.cool, &self.hot] {
            if let Err(e) = link.fin_game().await {
                debug!("no final vision for {}: {e}", link.side());
            }
        }
        info!(%outcome, half_turns, "match completed");
        MatchReport {
            outcome,
            aborted: false,
            half_turns,
        }
    }

    /// One half-turn of `side`: start it, then wait for whichever comes first of its end, the
    /// active link closing or the waiting link closing.
    #[instrument(skip(self))]
    async fn half_turn(&self, side: Side) -> HalfTurn {
        let active = self.link(side);
        let inactive = self.link(side.opponent());

        // subscribed before the turn starts so no event can slip through
        let mut turn_end = active.subscribe(LinkEventKind::TurnEnd);
        let mut active_close = active.subscribe(LinkEventKind::Close);
        let mut inactive_close = inactive.subscribe(LinkEventKind::Close);

        if let Err(e) = active.turn_start().await {
            warn!("could not start the turn: {e}");
        }

        let deadline = self.turn_timeout.map(|timeout| Instant::now() + timeout);
        let mut timed_out = false;
        loop {
            tokio::select! {
                biased;
                event = &mut turn_end => {
                    return match event {
                        Some(_) => HalfTurn::Completed,
                        None => HalfTurn::ActiveClosed,
                    };
                }
                _ = &mut active_close => return HalfTurn::ActiveClosed,
                _ = &mut inactive_close => return HalfTurn::InactiveClosed,
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() && !timed_out =>
                {
                    warn!("turn timed out");
                    timed_out = true;
                    active.close().await;
                }
            }
        }
    }

    /// Winner of an interrupted match: the board's if it already names one, else `fallback`.
    fn settle(&self, fallback: Side) -> Side {
        match self.game.winner() {
            Some(winner) => winner,
            None => {
                warn!("{} left the match, {fallback} wins", fallback.opponent());
                self.game.set_forced_winner(fallback);
                fallback
            }
        }
    }

    fn finish(&self, winner: Side, half_turns: u64, aborted: bool) -> MatchReport {
        let outcome = Outcome::Winner(winner);
        self.report(Progress::Finished(outcome));
        info!(%outcome, half_turns, aborted, "match ended");
        MatchReport {
            outcome,
            aborted,
            half_turns,
        }
    }

    fn link(&self, side: Side) -> &PlayerLink {
        match side {
            Side::Cool => &self.cool,
            Side::Hot => &self.hot,
        }
    }

    fn report(&self, progress: Progress) {
        if let Some(tx) = &self.progress {
            // nobody listening any more is fine
            let _ = tx.send(progress);
        }
    }
}

/// Half-turns left when `side` starts its half of pair `pair`, out of `budget` pairs.
fn remaining(budget: u32, pair: u32, side: Side) -> u64 {
    2 * u64::from(budget - pair) - u64::from(side == Side::Hot)
}

/// Run a match in the background.
///
/// Returns the progress stream and the handle resolving to the final report.
pub fn start_match(
    game: SharedGame,
    cool: PlayerLink,
    hot: PlayerLink,
    config: &Configuration,
) -> (mpsc::UnboundedReceiver<Progress>, JoinHandle<MatchReport>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = MatchOrchestrator::new(game, cool, hot)
        .with_progress(tx)
        .with_turn_timeout(config.turn_timeout());
    (rx, tokio::spawn(orchestrator.run()))
}
