use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use common::{ClientMessage, LiveChannel, ServerMessage};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::extractors::auth::AuthUser;
use crate::hub::{ConnectionId, Group, Hub};
use crate::state::AppState;

/// Upgrade handler for `/ws/notifications/`.
///
/// The member joins their personal group, the system-wide group and one group
/// per team named in the token.
#[instrument(skip(state, ws, user), fields(user_id = user.user_id))]
pub async fn notifications(
    State(state): State<AppState>,
    user: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    let mut groups = vec![Group::User(user.user_id), Group::System];
    groups.extend(user.team_ids.iter().copied().map(Group::Team));

    info!(username = %user.username, teams = user.team_ids.len(), "Notifications socket accepted");
    ws.on_upgrade(move |socket| serve(socket, state.hub, LiveChannel::Notifications, groups))
}

/// Upgrade handler for `/ws/first-blood/`. No authentication.
pub async fn first_blood(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| {
        serve(socket, state.hub, LiveChannel::FirstBlood, vec![Group::FirstBlood])
    })
}

/// Pump frames between one socket and the hub until either side closes.
async fn serve(socket: WebSocket, hub: Arc<Hub>, channel: LiveChannel, groups: Vec<Group>) {
    let (conn, mut outbox) = hub.register();
    for group in groups {
        hub.join(conn, group);
    }
    debug!(%conn, %channel, "Connection registered");

    let (mut sink, mut source) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbox.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(result) = source.next().await {
        match result {
            Ok(Message::Text(text)) => handle_client_frame(&hub, conn, channel, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%conn, error = %e, "Socket read failed");
                break;
            }
        }
    }

    hub.unregister(conn);
    writer.abort();
    debug!(%conn, %channel, "Connection closed");
}

fn handle_client_frame(hub: &Hub, conn: ConnectionId, channel: LiveChannel, text: &str) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(%conn, %channel, error = %e, "Ignoring invalid client frame");
            return;
        }
    };

    match (channel, message) {
        // Answered on both channels.
        (_, ClientMessage::Ping) => {
            if let Err(e) = hub.send_to(conn, &ServerMessage::Pong) {
                warn!(%conn, error = %e, "Failed to encode pong");
            }
        }
        (LiveChannel::FirstBlood, ClientMessage::Subscribe { event_id }) => {
            hub.join(conn, Group::FirstBloodEvent(event_id));
        }
        (LiveChannel::Notifications, ClientMessage::Subscribe { event_id }) => {
            debug!(%conn, event_id, "Subscribe is only meaningful on the first-blood channel");
        }
    }
}
