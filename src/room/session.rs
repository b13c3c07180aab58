use axum::extract::ws::Message;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Handle to one connected client: its identity and the outbound
/// channel drained by the connection's send task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    sender: UnboundedSender<Message>,
}

impl SessionHandle {
    pub fn new(id: Uuid, sender: UnboundedSender<Message>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Send a message to this session. Delivery is best effort: a
    /// closed channel means the connection is tearing down and the
    /// message is lost.
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }
}
