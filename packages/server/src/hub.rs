//! Group-based fan-out of server messages to live connections.
//!
//! Each connection owns a bounded outbound queue. Publishing serializes the
//! message once and offers the frame to every member of the targeted groups
//! without waiting: a connection whose queue is full misses that frame, the
//! others are unaffected.

use std::collections::HashSet;
use std::fmt;

use common::ServerMessage;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// A named set of connections that receive the same frames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Group {
    User(i64),
    Team(i64),
    System,
    FirstBlood,
    FirstBloodEvent(i64),
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::User(id) => write!(f, "user_{id}"),
            Group::Team(id) => write!(f, "team_{id}"),
            Group::System => f.write_str("notifications_system"),
            Group::FirstBlood => f.write_str("first_blood_events"),
            Group::FirstBloodEvent(id) => write!(f, "first_blood_events_event_{id}"),
        }
    }
}

pub struct Hub {
    queue_capacity: usize,
    outboxes: DashMap<ConnectionId, mpsc::Sender<String>>,
    groups: DashMap<Group, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<Group>>,
}

impl Hub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity: queue_capacity.max(1),
            outboxes: DashMap::new(),
            groups: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Register a connection and return its id and the receiving end of its queue.
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.outboxes.insert(id, tx);
        self.memberships.insert(id, HashSet::new());
        (id, rx)
    }

    /// Remove a connection from every group it joined. Empty groups are dropped.
    pub fn unregister(&self, conn: ConnectionId) {
        self.outboxes.remove(&conn);
        let Some((_, joined)) = self.memberships.remove(&conn) else {
            return;
        };
        for group in joined {
            self.remove_member(&group, conn);
        }
    }

    pub fn join(&self, conn: ConnectionId, group: Group) {
        let Some(mut joined) = self.memberships.get_mut(&conn) else {
            warn!(%conn, %group, "Join for unregistered connection ignored");
            return;
        };
        if joined.insert(group.clone()) {
            debug!(%conn, %group, "Joined group");
            self.groups.entry(group).or_default().insert(conn);
        }
    }

    pub fn leave(&self, conn: ConnectionId, group: &Group) {
        let removed = self
            .memberships
            .get_mut(&conn)
            .is_some_and(|mut joined| joined.remove(group));
        if removed {
            self.remove_member(group, conn);
        }
    }

    fn remove_member(&self, group: &Group, conn: ConnectionId) {
        if let Some(mut members) = self.groups.get_mut(group) {
            members.remove(&conn);
        }
        self.groups.remove_if(group, |_, members| members.is_empty());
    }

    /// Deliver a message to the union of the given groups.
    ///
    /// Returns the number of connections the frame was queued for; a
    /// connection in several of the groups is counted once.
    pub fn publish(&self, groups: &[Group], message: &ServerMessage) -> Result<usize, serde_json::Error> {
        let frame = message.encode()?;

        let mut recipients = HashSet::new();
        for group in groups {
            if let Some(members) = self.groups.get(group) {
                recipients.extend(members.iter().copied());
            }
        }

        let delivered = recipients
            .into_iter()
            .filter(|conn| self.offer(*conn, frame.clone()))
            .count();

        debug!(kind = %message.kind(), delivered, "Published message");
        Ok(delivered)
    }

    /// Queue a message for a single connection.
    pub fn send_to(&self, conn: ConnectionId, message: &ServerMessage) -> Result<bool, serde_json::Error> {
        Ok(self.offer(conn, message.encode()?))
    }

    fn offer(&self, conn: ConnectionId, frame: String) -> bool {
        let Some(outbox) = self.outboxes.get(&conn) else {
            return false;
        };
        match outbox.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(%conn, "Outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.outboxes.len()
    }

    pub fn group_size(&self, group: &Group) -> usize {
        self.groups.get(group).map(|members| members.len()).unwrap_or(0)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
