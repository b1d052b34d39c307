use bots::{bind, wait_for, STEP};
use chaser_referee::{
    game_state::{
        Action::{Look, Put, Walk},
        Cell::{Empty, Item},
        Command,
        Direction::{Right, Up},
    },
    prelude::*,
};
use tokio::time::timeout;

mod bots;

async fn join(link: &PlayerLink, name: &str) -> BotSession {
    let session = BotSession::connect(link.local_addr(), name).await.unwrap();
    assert_eq!(
        wait_for(link, LinkEventKind::Connect).await,
        Some(LinkEvent::Connected(name.to_string()))
    );
    session
}

async fn next_turn(session: &mut BotSession) -> Vision {
    timeout(STEP, session.next_turn())
        .await
        .unwrap()
        .unwrap()
        .expect("connection closed")
}

#[tokio::test]
async fn test_sessions_play_a_match() {
    let game = SharedGame::new(GameState::new(
        vec![vec![Empty, Item, Empty], vec![Empty, Empty, Empty]],
        Position::new(0, 0),
        Position::new(1, 2),
        1,
    ));
    let cool_link = bind(Side::Cool, &game).await;
    let hot_link = bind(Side::Hot, &game).await;
    let mut cool = join(&cool_link, "cool-session").await;
    let mut hot = join(&hot_link, "hot-session").await;
    assert!(!cool.is_my_turn());

    let (_progress, report) = start_match(game, cool_link, hot_link, &Configuration::new());

    assert_eq!(next_turn(&mut cool).await.to_string(), "1222203200");
    assert!(cool.is_my_turn());
    let after = cool.send(Command::new(Walk, Right)).await.unwrap();
    assert_eq!(after.map(|v| v.to_string()).as_deref(), Some("1222200001"));
    assert!(!cool.is_my_turn());

    assert!(!next_turn(&mut hot).await.is_decided());
    hot.send(Command::new(Look, Up)).await.unwrap();

    // the budget is spent: both sessions get their final vision instead of a turn
    let last = next_turn(&mut cool).await;
    assert_eq!(last.to_string(), "0222200001");
    assert!(cool.is_closed());
    assert_eq!(next_turn(&mut hot).await.to_string(), "0102002222");
    assert!(hot.is_closed());
    assert_eq!(cool.next_turn().await.unwrap(), None);

    let report = timeout(STEP, report).await.unwrap().unwrap();
    assert_eq!(report.outcome, Outcome::Winner(Side::Cool));
    assert!(!report.aborted);
}

#[tokio::test]
async fn test_decided_vision_closes_session() {
    let game = SharedGame::new(GameState::new(
        vec![vec![Empty, Empty]],
        Position::new(0, 0),
        Position::new(0, 1),
        3,
    ));
    let link = bind(Side::Cool, &game).await;
    let mut session = join(&link, "trapper").await;

    link.turn_start().await.unwrap();
    assert_eq!(next_turn(&mut session).await.to_string(), "1222201222");
    let after = session.send(Command::new(Put, Right)).await.unwrap().unwrap();
    assert!(after.is_decided());
    assert!(session.is_closed());
    assert!(session.send(Command::new(Walk, Right)).await.is_err());

    // the session left instead of acknowledging
    wait_for(&link, LinkEventKind::Close).await;
    assert_eq!(game.winner(), Some(Side::Cool));
}

#[tokio::test]
async fn test_send_outside_turn_fails() {
    let game = SharedGame::default();
    let link = bind(Side::Hot, &game).await;
    let mut session = join(&link, "impatient").await;

    assert!(session.send(Command::new(Walk, Up)).await.is_err());
    assert!(!session.is_closed());
    // nothing reached the link
    assert_eq!(link.status(), LinkStatus::Idle);
}

#[tokio::test]
async fn test_link_closing_ends_session() {
    let game = SharedGame::default();
    let link = bind(Side::Cool, &game).await;
    let mut session = join(&link, "abandoned").await;

    link.close().await;
    assert_eq!(timeout(STEP, session.next_turn()).await.unwrap().unwrap(), None);
    assert!(session.is_closed());
}
