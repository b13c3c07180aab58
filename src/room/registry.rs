use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::room::session::SessionHandle;
use crate::websocket::message::{Broadcast, RelayEvent};

/// Shared map of rooms and their members.
///
/// Rooms are plain fan-out groups: they exist while at least one
/// session occupies them and hold no picture state. The registry never
/// holds its lock across a send; `relay` snapshots the recipients and
/// delivers after the lock is released.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<RwLock<Rooms>>,
}

#[derive(Debug, Default)]
struct Rooms {
    /// Room token to members, keyed by session id
    members: HashMap<String, HashMap<Uuid, SessionHandle>>,
    /// Session id to the room it currently occupies
    locations: HashMap<Uuid, String>,
}

impl Rooms {
    /// Remove one member, dropping the room once nobody is left in it
    fn drop_member(&mut self, room_id: &str, session_id: Uuid) {
        if let Some(members) = self.members.get_mut(room_id) {
            members.remove(&session_id);
            if members.is_empty() {
                self.members.remove(room_id);
            }
        }
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a session into a room, creating the room on first join.
    ///
    /// A session occupies at most one room, so joining another room
    /// leaves the current one; the room left is returned. Re-joining
    /// the current room changes nothing.
    pub async fn join(&self, room_id: &str, session: SessionHandle) -> Option<String> {
        let session_id = session.id();
        let mut rooms = self.inner.write().await;

        let previous = rooms.locations.insert(session_id, room_id.to_string());
        if let Some(previous) = previous.as_deref() {
            if previous != room_id {
                rooms.drop_member(previous, session_id);
            }
        }

        rooms
            .members
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id, session);

        previous.filter(|previous| previous != room_id)
    }

    /// Drop a session's membership, returning the room it occupied.
    /// Sessions that never joined a room leave nothing behind.
    pub async fn leave(&self, session_id: Uuid) -> Option<String> {
        let mut rooms = self.inner.write().await;
        let room_id = rooms.locations.remove(&session_id)?;
        rooms.drop_member(&room_id, session_id);
        Some(room_id)
    }

    /// The room a session currently occupies
    pub async fn room_of(&self, session_id: Uuid) -> Option<String> {
        self.inner.read().await.locations.get(&session_id).cloned()
    }

    /// Snapshot the members of a room who should receive an event.
    /// An unknown room has no recipients.
    pub async fn recipients(
        &self,
        room_id: &str,
        sender: Uuid,
        mode: Broadcast,
    ) -> Vec<SessionHandle> {
        let rooms = self.inner.read().await;
        let Some(members) = rooms.members.get(room_id) else {
            return Vec::new();
        };

        members
            .values()
            .filter(|member| match mode {
                Broadcast::All => true,
                Broadcast::Others => member.id() != sender,
            })
            .cloned()
            .collect()
    }

    /// Forward one event to a room on behalf of a sender. The sender
    /// does not have to be a member; membership only governs who
    /// receives. Returns how many members took delivery.
    pub async fn relay(&self, room_id: &str, sender: Uuid, event: &RelayEvent) -> usize {
        let recipients = self.recipients(room_id, sender, event.broadcast()).await;
        if recipients.is_empty() {
            return 0;
        }

        let payload = event.to_json();
        let mut delivered = 0;
        for recipient in recipients {
            if recipient.send(Message::Text(payload.clone())) {
                delivered += 1;
            }
        }
        delivered
    }

    /// How many sessions occupy a room right now
    pub async fn member_count(&self, room_id: &str) -> usize {
        self.inner
            .read()
            .await
            .members
            .get(room_id)
            .map_or(0, HashMap::len)
    }

    /// How many rooms currently exist
    pub async fn room_count(&self) -> usize {
        self.inner.read().await.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::NormPoint;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn session() -> (SessionHandle, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SessionHandle::new(Uuid::new_v4(), tx), rx)
    }

    fn draw_event() -> RelayEvent {
        RelayEvent::Draw {
            point: NormPoint::new(0.5, 0.5),
        }
    }

    #[tokio::test]
    async fn test_join_creates_room() {
        let registry = RoomRegistry::new();
        let (a, _rx) = session();

        assert_eq!(registry.room_count().await, 0);
        registry.join("7", a).await;
        assert_eq!(registry.room_count().await, 1);
        assert_eq!(registry.member_count("7").await, 1);
    }

    #[tokio::test]
    async fn test_leave_drops_empty_room() {
        let registry = RoomRegistry::new();
        let (a, _rx_a) = session();
        let (b, _rx_b) = session();
        let (a_id, b_id) = (a.id(), b.id());

        registry.join("7", a).await;
        registry.join("7", b).await;

        assert_eq!(registry.leave(a_id).await.as_deref(), Some("7"));
        assert_eq!(registry.member_count("7").await, 1);
        assert_eq!(registry.room_count().await, 1);

        assert_eq!(registry.leave(b_id).await.as_deref(), Some("7"));
        assert_eq!(registry.room_count().await, 0);
    }

    #[test]
    fn test_leave_unknown_session_is_noop() {
        tokio_test::block_on(async {
            let registry = RoomRegistry::new();
            assert_eq!(registry.leave(Uuid::new_v4()).await, None);
            assert_eq!(registry.room_count().await, 0);
        });
    }

    #[tokio::test]
    async fn test_join_moves_session_between_rooms() {
        let registry = RoomRegistry::new();
        let (a, _rx) = session();
        let a_id = a.id();

        registry.join("7", a.clone()).await;
        assert_eq!(registry.join("9", a.clone()).await.as_deref(), Some("7"));
        assert_eq!(registry.member_count("7").await, 0);
        assert_eq!(registry.member_count("9").await, 1);
        assert_eq!(registry.room_of(a_id).await.as_deref(), Some("9"));

        // Re-joining the current room changes nothing
        assert_eq!(registry.join("9", a).await, None);
        assert_eq!(registry.member_count("9").await, 1);
    }

    #[tokio::test]
    async fn test_relay_skips_sender() {
        let registry = RoomRegistry::new();
        let (a, mut rx_a) = session();
        let (b, mut rx_b) = session();
        let a_id = a.id();

        registry.join("7", a).await;
        registry.join("7", b).await;

        assert_eq!(registry.relay("7", a_id, &draw_event()).await, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_clear_reaches_sender_too() {
        let registry = RoomRegistry::new();
        let (a, mut rx_a) = session();
        let (b, mut rx_b) = session();
        let a_id = a.id();

        registry.join("7", a).await;
        registry.join("7", b).await;

        assert_eq!(registry.relay("7", a_id, &RelayEvent::Clear).await, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_relay_does_not_cross_rooms() {
        let registry = RoomRegistry::new();
        let (a, _rx_a) = session();
        let (b, mut rx_b) = session();
        let a_id = a.id();

        registry.join("7", a).await;
        registry.join("8", b).await;

        assert_eq!(registry.relay("7", a_id, &draw_event()).await, 0);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_to_unknown_room_is_noop() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.relay("404", Uuid::new_v4(), &draw_event()).await, 0);
    }

    #[tokio::test]
    async fn test_relay_from_non_member_reaches_members() {
        let registry = RoomRegistry::new();
        let (b, mut rx_b) = session();

        registry.join("7", b).await;

        let outsider = Uuid::new_v4();
        assert_eq!(registry.relay("7", outsider, &draw_event()).await, 1);
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_relay_payload_carries_no_room_token() {
        let registry = RoomRegistry::new();
        let (a, _rx_a) = session();
        let (b, mut rx_b) = session();
        let a_id = a.id();

        registry.join("7", a).await;
        registry.join("7", b).await;

        let event = RelayEvent::Begin {
            point: NormPoint::new(0.25, 0.5),
            eraser: false,
        };
        registry.relay("7", a_id, &event).await;

        let Ok(Message::Text(text)) = rx_b.try_recv() else {
            panic!("expected a text frame");
        };
        assert_eq!(
            text,
            r#"{"type":"begin","point":{"nx":0.25,"ny":0.5},"eraser":false}"#
        );
    }

    #[tokio::test]
    async fn test_relay_survives_closed_recipient() {
        let registry = RoomRegistry::new();
        let (a, _rx_a) = session();
        let (b, rx_b) = session();
        let (c, mut rx_c) = session();
        let a_id = a.id();

        registry.join("7", a).await;
        registry.join("7", b).await;
        registry.join("7", c).await;
        drop(rx_b);

        assert_eq!(registry.relay("7", a_id, &draw_event()).await, 1);
        assert!(rx_c.try_recv().is_ok());
    }
}
