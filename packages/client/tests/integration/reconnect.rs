use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use client::{ConnectionManager, SessionEnd};
use common::LiveChannel;
use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::common::{
    Event, RecordingHandler, quick_policy, run_to_end, spawn_refusing_server, spawn_silent_server,
    spawn_ws_server, ws_url,
};

#[tokio::test]
async fn gives_up_after_budget_of_failed_attempts() {
    let (addr, accepted) = spawn_refusing_server().await;
    let handler = Arc::new(RecordingHandler::default());

    let end = run_to_end(ConnectionManager::new(
        LiveChannel::FirstBlood,
        ws_url(addr, LiveChannel::FirstBlood),
        quick_policy(5),
        handler.clone(),
    ))
    .await;

    assert_eq!(end, SessionEnd::GaveUp { attempts: 5 });
    // The initial attempt plus five reconnects.
    assert_eq!(accepted.load(Ordering::SeqCst), 6);
    assert_eq!(handler.count(&Event::ConnectionError), 6);
    assert_eq!(handler.count(&Event::Connected), 0);
    assert_eq!(handler.events().last(), Some(&Event::GaveUp(5)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 6, "no attempts after giving up");
}

#[tokio::test]
async fn stalled_handshake_counts_as_a_failed_attempt() {
    let addr = spawn_silent_server().await;
    let handler = Arc::new(RecordingHandler::default());

    let end = run_to_end(
        ConnectionManager::new(
            LiveChannel::Notifications,
            ws_url(addr, LiveChannel::Notifications),
            quick_policy(2),
            handler.clone(),
        )
        .with_connect_timeout(Duration::from_millis(100)),
    )
    .await;

    assert_eq!(end, SessionEnd::GaveUp { attempts: 2 });
    assert_eq!(handler.count(&Event::ConnectionError), 3);
    assert_eq!(handler.count(&Event::Connected), 0);
}

#[tokio::test]
async fn zero_budget_makes_a_single_attempt() {
    let (addr, accepted) = spawn_refusing_server().await;
    let handler = Arc::new(RecordingHandler::default());

    let end = run_to_end(ConnectionManager::new(
        LiveChannel::FirstBlood,
        ws_url(addr, LiveChannel::FirstBlood),
        quick_policy(0),
        handler.clone(),
    ))
    .await;

    assert_eq!(end, SessionEnd::GaveUp { attempts: 0 });
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn successful_open_resets_the_budget() {
    // The first two connections open and are closed by the server; later ones fail.
    let (addr, accepted) = spawn_ws_server(2, |_, mut ws| async move {
        let _ = ws.close(None).await;
    })
    .await;
    let handler = Arc::new(RecordingHandler::default());

    let end = run_to_end(ConnectionManager::new(
        LiveChannel::FirstBlood,
        ws_url(addr, LiveChannel::FirstBlood),
        quick_policy(1),
        handler.clone(),
    ))
    .await;

    // open, close, retry 1 (reset by open), close, retry 1, fail, exhausted
    assert_eq!(end, SessionEnd::GaveUp { attempts: 1 });
    assert_eq!(accepted.load(Ordering::SeqCst), 3);
    assert_eq!(handler.count(&Event::Connected), 2);
}

#[tokio::test]
async fn cancellation_stops_an_open_session() {
    let (addr, accepted) = spawn_ws_server(u32::MAX, |_, mut ws| async move {
        // Hold the socket open until the client leaves.
        let _ = ws.send(Message::Text(r#"{"type":"pong"}"#.into())).await;
        futures::StreamExt::next(&mut ws).await;
    })
    .await;
    let handler = Arc::new(RecordingHandler::default());
    let shutdown = CancellationToken::new();

    let manager = ConnectionManager::new(
        LiveChannel::FirstBlood,
        ws_url(addr, LiveChannel::FirstBlood),
        quick_policy(5),
        handler.clone(),
    )
    .with_shutdown(shutdown.clone());
    let run = tokio::spawn(manager.run());

    tokio::time::timeout(Duration::from_secs(2), async {
        while handler.count(&Event::Connected) == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never connected");

    shutdown.cancel();
    let end = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("manager ignored cancellation")
        .unwrap();

    assert_eq!(end, SessionEnd::Cancelled);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
