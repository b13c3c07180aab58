pub mod registry;
pub mod session;

pub use registry::RoomRegistry;
pub use session::SessionHandle;
