//! Protocol messages for WebSocket communication

use serde::{Deserialize, Serialize};

use crate::drawing::NormPoint;
use crate::error::SketchroomError;

/// Messages sent from client to server.
///
/// Every variant carries the room token that scopes it. The token is
/// routing information only; recipients never see it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter a room, leaving the previous one if any
    JoinRoom { room_id: String },
    /// Start a stroke at a point, with the sender's tool choice
    Begin {
        room_id: String,
        point: NormPoint,
        eraser: bool,
    },
    /// Extend the open stroke to the next point
    Draw { room_id: String, point: NormPoint },
    /// Finish the open stroke
    End { room_id: String },
    /// Wipe the shared picture
    Clear { room_id: String },
}

impl ClientMessage {
    /// Parse a client message from a raw text frame
    pub fn parse(text: &str) -> Result<Self, SketchroomError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        if message.room_id().is_empty() {
            return Err(SketchroomError::EmptyRoomToken);
        }
        Ok(message)
    }

    /// The room token this message is addressed to
    pub fn room_id(&self) -> &str {
        match self {
            ClientMessage::JoinRoom { room_id }
            | ClientMessage::Begin { room_id, .. }
            | ClientMessage::Draw { room_id, .. }
            | ClientMessage::End { room_id }
            | ClientMessage::Clear { room_id } => room_id,
        }
    }

    /// Split a drawing message into its room token and the event to
    /// forward. `JoinRoom` is not a drawing message and yields nothing.
    pub fn into_relay(self) -> Option<(String, RelayEvent)> {
        match self {
            ClientMessage::JoinRoom { .. } => None,
            ClientMessage::Begin {
                room_id,
                point,
                eraser,
            } => Some((room_id, RelayEvent::Begin { point, eraser })),
            ClientMessage::Draw { room_id, point } => Some((room_id, RelayEvent::Draw { point })),
            ClientMessage::End { room_id } => Some((room_id, RelayEvent::End)),
            ClientMessage::Clear { room_id } => Some((room_id, RelayEvent::Clear)),
        }
    }
}

/// Messages forwarded to room members. Payloads pass through from the
/// inbound message untouched, minus the room token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayEvent {
    /// A stroke opened at a point with the given tool
    Begin { point: NormPoint, eraser: bool },
    /// The open stroke reached the next point
    Draw { point: NormPoint },
    /// The open stroke finished
    End,
    /// The picture was wiped
    Clear,
}

/// Which room members receive a relayed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    /// Every member except the sender
    Others,
    /// Every member, the sender included
    All,
}

impl RelayEvent {
    /// Serialize the event to the JSON text put on the wire
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Stroke traffic echoes to the other members only; a clear goes
    /// to every member, the sender included.
    pub fn broadcast(&self) -> Broadcast {
        match self {
            RelayEvent::Clear => Broadcast::All,
            _ => Broadcast::Others,
        }
    }
}
