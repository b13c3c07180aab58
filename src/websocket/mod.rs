pub mod handler;
pub mod message;

pub use message::{Broadcast, ClientMessage, RelayEvent};
