use std::{env, fs, io::Write, time::Duration};

use anyhow::Context;
use chaser_referee::{
    logger::{init_logger, init_stderr_logger},
    prelude::*,
};
use tracing::info;

/// Time left to the bots to disconnect by themselves once the match is over.
const LEAVE_GRACE: Duration = Duration::from_secs(1);

/// Headless referee: `chaser-server [map file]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Configuration::from_env();
    if config.log() {
        init_logger()?;
    } else {
        init_stderr_logger();
    }

    let state = match env::args().nth(1) {
        Some(path) => {
            let text =
                fs::read_to_string(&path).with_context(|| format!("could not read map {path}"))?;
            map_text::parse(&text).with_context(|| format!("invalid map {path}"))?
        }
        None => GameState::default(),
    };
    let game = SharedGame::new(state);

    let cool = PlayerLink::listen(Side::Cool, config.cool_port(), game.clone(), &config).await?;
    let hot = PlayerLink::listen(Side::Hot, config.hot_port(), game.clone(), &config).await?;
    if config.verbose() {
        println!(
            "Waiting for Cool on port {} and Hot on port {}...",
            cool.local_addr().port(),
            hot.local_addr().port()
        );
    }

    let (cool_hello, hot_hello) = tokio::join!(
        cool.subscribe(LinkEventKind::Connect),
        hot.subscribe(LinkEventKind::Connect)
    );
    if config.verbose() {
        for (side, hello) in [(Side::Cool, cool_hello), (Side::Hot, hot_hello)] {
            if let Some(LinkEvent::Connected(name)) = hello {
                println!("\x1b[32m{side}:\x1b[39m {name}");
            }
        }
    }

    let (mut progress, report) = start_match(game, cool.clone(), hot.clone(), &config);
    while let Some(p) = progress.recv().await {
        if config.verbose() {
            print_progress(&p);
        }
    }
    let report = report.await.context("match task failed")?;
    info!(?report, "done");
    if config.verbose() {
        let aborted = if report.aborted { " (forfeit)" } else { "" };
        println!("\x1b[2K\x1b[32mResult:\x1b[39m {}{aborted}", report.outcome);
    }

    for link in [&cool, &hot] {
        let _ = tokio::time::timeout(LEAVE_GRACE, link.subscribe(LinkEventKind::Close)).await;
        link.close().await;
    }
    Ok(())
}

fn print_progress(progress: &Progress) {
    // clear line, green label, default, start of line
    print!("\x1b[2K\x1b[32mProgress:\x1b[39m {progress}\x1b[0G");
    let _ = std::io::stdout().flush();
}
