use serde_json::json;

use crate::common::{PUBLISH_KEY, TestApp, routes};

fn unread_count_to_system() -> serde_json::Value {
    json!({
        "targets": [{"kind": "system"}],
        "message": {"type": "unread_count", "unread_count": 3},
    })
}

mod publish_key {
    use super::*;

    #[tokio::test]
    async fn broadcast_without_key_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.broadcast_with_key(&unread_count_to_system(), None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn broadcast_with_wrong_key_is_forbidden() {
        let app = TestApp::spawn().await;

        let res = app
            .broadcast_with_key(&unread_count_to_system(), Some("not-the-key"))
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn broadcast_with_key_succeeds_with_no_listeners() {
        let app = TestApp::spawn().await;

        let res = app
            .broadcast_with_key(&unread_count_to_system(), Some(PUBLISH_KEY))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["delivered"], 0);
        assert_eq!(res.body["groups"], json!(["notifications_system"]));
    }

    #[tokio::test]
    async fn unconfigured_key_leaves_endpoint_open() {
        let app = TestApp::spawn_with_publish_key(None).await;

        let res = app.broadcast_with_key(&unread_count_to_system(), None).await;

        assert_eq!(res.status, 200, "{}", res.text);
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn empty_targets_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .broadcast(&json!({
                "targets": [],
                "message": {"type": "unread_count", "unread_count": 1},
            }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_message_type_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "system"}],
                "message": {"type": "confetti"},
            }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_target_kind_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .broadcast(&json!({
                "targets": [{"kind": "everyone"}],
                "message": {"type": "unread_count", "unread_count": 1},
            }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn health_reports_service_and_connections() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["service"], "dojo-relay");
    assert_eq!(res.body["connections"], 0);
}
