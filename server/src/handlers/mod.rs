//! Request handlers for catalog operations.

mod titles;
mod websocket;

pub use titles::*;
pub use websocket::handle_websocket_connection;
