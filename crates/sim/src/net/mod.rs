mod connection;
mod events;
mod server;

pub use connection::ClientInfo;
pub use events::{ClientId, ClientWriteError, DisconnectReason, ServerEvent};
pub use server::{BroadcastServer, ServerError, ServerHandle};
