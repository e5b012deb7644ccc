use std::sync::Arc;
use std::time::Duration;

use client::{ConnectionManager, SessionEnd};
use common::{LiveChannel, MessageKind};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::common::{RecordingHandler, quick_policy, run_to_end, spawn_ws_server, ws_url};

#[tokio::test]
async fn malformed_frames_do_not_end_the_session() {
    let (addr, _) = spawn_ws_server(1, |_, mut ws| async move {
        for frame in [
            "this is not json".to_string(),
            json!({"type": "confetti", "amount": 9000}).to_string(),
            json!({"points": 10}).to_string(),
            json!({"type": "scoreboard_update", "team_rank": "top"}).to_string(),
            json!({
                "type": "submission_result",
                "challenge_name": "baby-heap",
                "is_correct": true,
                "points": 100,
                "is_first_blood": true,
            })
            .to_string(),
            json!({"type": "unread_count", "unread_count": 3}).to_string(),
        ] {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        let _ = ws.close(None).await;
    })
    .await;
    let handler = Arc::new(RecordingHandler::default());

    let end = run_to_end(ConnectionManager::new(
        LiveChannel::Notifications,
        ws_url(addr, LiveChannel::Notifications),
        quick_policy(0),
        handler.clone(),
    ))
    .await;

    assert_eq!(end, SessionEnd::GaveUp { attempts: 0 });
    assert_eq!(
        handler.messages(),
        vec![MessageKind::SubmissionResult, MessageKind::UnreadCount]
    );
    let submissions = handler.submissions.lock().unwrap();
    assert_eq!(submissions[0].challenge_name, "baby-heap");
    assert!(submissions[0].is_first_blood);
}

#[tokio::test]
async fn event_subscription_is_sent_on_every_open() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Value>();
    let (addr, _) = spawn_ws_server(2, move |_, mut ws| {
        let seen_tx = seen_tx.clone();
        async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                let _ = seen_tx.send(serde_json::from_str(text.as_str()).unwrap());
            }
            let _ = ws.close(None).await;
        }
    })
    .await;
    let handler = Arc::new(RecordingHandler::default());

    run_to_end(
        ConnectionManager::new(
            LiveChannel::FirstBlood,
            ws_url(addr, LiveChannel::FirstBlood),
            quick_policy(1),
            handler.clone(),
        )
        .with_event_subscription(9),
    )
    .await;

    for _ in 0..2 {
        let frame = seen_rx.recv().await.unwrap();
        assert_eq!(frame, json!({"type": "subscribe", "event_id": 9}));
    }
}

#[tokio::test]
async fn keepalive_sends_ping() {
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<Value>();
    let (addr, _) = spawn_ws_server(1, move |_, mut ws| {
        let seen_tx = seen_tx.clone();
        async move {
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(text) = message {
                    let frame: Value = serde_json::from_str(text.as_str()).unwrap();
                    let _ = seen_tx.send(frame);
                    let _ = ws.send(Message::Text(r#"{"type":"pong"}"#.into())).await;
                    break;
                }
            }
            let _ = ws.close(None).await;
        }
    })
    .await;
    let handler = Arc::new(RecordingHandler::default());

    run_to_end(
        ConnectionManager::new(
            LiveChannel::Notifications,
            ws_url(addr, LiveChannel::Notifications),
            quick_policy(0),
            handler.clone(),
        )
        .with_keepalive(Duration::from_millis(50)),
    )
    .await;

    assert_eq!(seen_rx.recv().await.unwrap(), json!({"type": "ping"}));
    assert_eq!(handler.messages(), vec![MessageKind::Pong]);
}
