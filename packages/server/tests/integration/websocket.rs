use std::time::Duration;

use common::LiveChannel;
use serde_json::json;

use crate::common::{TestApp, claims, routes, sign_claims, sign_token};

fn notification_to(target: serde_json::Value, title: &str) -> serde_json::Value {
    json!({
        "targets": [target],
        "message": {
            "type": "notification",
            "notification": {
                "title": title,
                "message": "Check the event page",
                "notification_type": "event",
                "priority": "high",
            },
        },
    })
}

fn first_blood(challenge: &str) -> serde_json::Value {
    json!({
        "type": "first_blood",
        "player_name": "alice",
        "challenge_name": challenge,
        "team_name": "Null Pointers",
        "points": 500,
        "team_color": "#00ff88",
    })
}

mod handshake {
    use super::*;

    #[tokio::test]
    async fn notifications_require_a_token() {
        let app = TestApp::spawn().await;

        let status = app
            .rejected_handshake_status(app.ws_url(LiveChannel::Notifications, None))
            .await;

        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn token_signed_by_foreign_key_is_rejected() {
        let app = TestApp::spawn().await;
        let token = sign_claims(&claims(7, &[]), "foreign_private.pem");

        let status = app
            .rejected_handshake_status(app.ws_url(LiveChannel::Notifications, Some(&token)))
            .await;

        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn token_for_another_audience_is_rejected() {
        let app = TestApp::spawn().await;
        let mut body = claims(7, &[]);
        body["aud"] = json!("some-other-service");
        let token = sign_claims(&body, "private.pem");

        let status = app
            .rejected_handshake_status(app.ws_url(LiveChannel::Notifications, Some(&token)))
            .await;

        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let app = TestApp::spawn().await;
        let mut body = claims(7, &[]);
        let past = chrono::Utc::now().timestamp() - 3600;
        body["iat"] = json!(past - 300);
        body["exp"] = json!(past);
        let token = sign_claims(&body, "private.pem");

        let status = app
            .rejected_handshake_status(app.ws_url(LiveChannel::Notifications, Some(&token)))
            .await;

        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn first_blood_channel_is_public() {
        let app = TestApp::spawn().await;

        let client = app.connect(LiveChannel::FirstBlood, None).await;

        client.close().await;
    }
}

mod notifications {
    use super::*;

    #[tokio::test]
    async fn user_notification_reaches_only_that_user() {
        let app = TestApp::spawn().await;
        let mut alice = app
            .connect(LiveChannel::Notifications, Some(&sign_token(1, &[])))
            .await;
        let mut bob = app
            .connect(LiveChannel::Notifications, Some(&sign_token(2, &[])))
            .await;

        let res = app
            .broadcast(&notification_to(json!({"kind": "user", "id": 1}), "Hint unlocked"))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["delivered"], 1);

        let frame = alice.next_json().await;
        assert_eq!(frame["type"], "notification");
        assert_eq!(frame["notification"]["title"], "Hint unlocked");
        assert_eq!(frame["notification"]["priority"], "high");

        bob.assert_nothing_pending().await;
    }

    #[tokio::test]
    async fn team_notification_reaches_members_over_bearer_auth() {
        let app = TestApp::spawn().await;
        let mut member = app.connect_with_bearer(&sign_token(1, &[42])).await;
        let mut outsider = app.connect_with_bearer(&sign_token(2, &[43])).await;

        let res = app
            .broadcast(&notification_to(json!({"kind": "team", "id": 42}), "Team invite"))
            .await;
        assert_eq!(res.body["delivered"], 1);

        let frame = member.next_json().await;
        assert_eq!(frame["notification"]["title"], "Team invite");

        outsider.assert_nothing_pending().await;
    }

    #[tokio::test]
    async fn system_notification_reaches_everyone_once() {
        let app = TestApp::spawn().await;
        let mut alice = app
            .connect(LiveChannel::Notifications, Some(&sign_token(1, &[42])))
            .await;
        let mut bob = app
            .connect(LiveChannel::Notifications, Some(&sign_token(2, &[])))
            .await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "system"}, {"kind": "team", "id": 42}, {"kind": "user", "id": 1}],
                "message": {"type": "unread_count", "unread_count": 4},
            }))
            .await;
        assert_eq!(res.body["delivered"], 2);

        for client in [&mut alice, &mut bob] {
            let frame = client.next_json().await;
            assert_eq!(frame["type"], "unread_count");
            assert_eq!(frame["unread_count"], 4);
        }

        alice.assert_nothing_pending().await;
    }

    #[tokio::test]
    async fn first_blood_does_not_reach_notification_sockets() {
        let app = TestApp::spawn().await;
        let mut member = app
            .connect(LiveChannel::Notifications, Some(&sign_token(1, &[])))
            .await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "first_blood"}],
                "message": first_blood("heap-feng-shui"),
            }))
            .await;
        assert_eq!(res.body["delivered"], 0);

        member.assert_nothing_pending().await;
    }
}

mod first_blood_channel {
    use super::*;

    #[tokio::test]
    async fn ping_is_answered_for_keepalive() {
        let app = TestApp::spawn().await;
        let mut listener = app.connect(LiveChannel::FirstBlood, None).await;

        listener.send_json(&json!({"type": "ping"})).await;
        let reply = listener.next_json().await;

        assert_eq!(reply, json!({"type": "pong"}));
    }

    #[tokio::test]
    async fn global_announcement_reaches_every_listener() {
        let app = TestApp::spawn().await;
        let mut scoped = app.connect(LiveChannel::FirstBlood, None).await;
        scoped.send_json(&json!({"type": "subscribe", "event_id": 9})).await;
        scoped.sync().await;
        let mut global = app.connect(LiveChannel::FirstBlood, None).await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "first_blood"}],
                "message": first_blood("rop-city"),
            }))
            .await;
        assert_eq!(res.body["delivered"], 2);

        for client in [&mut scoped, &mut global] {
            let frame = client.next_json().await;
            assert_eq!(frame["type"], "first_blood");
            assert_eq!(frame["challenge_name"], "rop-city");
            assert_eq!(frame["team_color"], "#00ff88");
        }
    }

    #[tokio::test]
    async fn event_announcement_reaches_only_subscribers() {
        let app = TestApp::spawn().await;
        let mut scoped = app.connect(LiveChannel::FirstBlood, None).await;
        scoped.send_json(&json!({"type": "subscribe", "event_id": 9})).await;
        scoped.sync().await;
        let mut global = app.connect(LiveChannel::FirstBlood, None).await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "first_blood_event", "id": 9}],
                "message": first_blood("format-string"),
            }))
            .await;
        assert_eq!(res.body["delivered"], 1);

        let frame = scoped.next_json().await;
        assert_eq!(frame["challenge_name"], "format-string");

        global.assert_nothing_pending().await;
    }
}

mod resilience {
    use super::*;

    #[tokio::test]
    async fn garbage_frames_do_not_close_the_socket() {
        let app = TestApp::spawn().await;
        let mut client = app
            .connect(LiveChannel::Notifications, Some(&sign_token(1, &[])))
            .await;

        client.send_text("{not json").await;
        client.send_json(&json!({"type": "dance"})).await;
        client.send_json(&json!({"type": "subscribe"})).await;

        client.sync().await;
    }

    #[tokio::test]
    async fn disconnect_removes_connection_from_hub() {
        let app = TestApp::spawn().await;
        let client = app
            .connect(LiveChannel::Notifications, Some(&sign_token(1, &[5])))
            .await;

        let health = app.get(routes::HEALTH).await;
        assert_eq!(health.body["connections"], 1);
        assert_eq!(health.body["groups"], 3);

        client.close().await;

        let mut connections = serde_json::Value::Null;
        for _ in 0..50 {
            let health = app.get(routes::HEALTH).await;
            connections = health.body["connections"].clone();
            if connections == 0 && health.body["groups"] == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(connections, 0);
    }
}
