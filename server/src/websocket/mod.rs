//! WebSocket snapshot push.
//!
//! Connected clients receive the full ordered catalog on connect and again
//! after every mutation.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;
