use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::nav::VesselState;

pub type ClientId = u32;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    Listening {
        addr: SocketAddr,
    },
    ClientConnected {
        client_id: ClientId,
        addr: SocketAddr,
    },
    ClientDisconnected {
        client_id: ClientId,
        addr: SocketAddr,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: String,
    },
    Tick {
        tick: u64,
        state: Box<VesselState>,
    },
    Error {
        message: String,
    },
}

/// Why a client's writer stopped delivering batches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientWriteError {
    #[error("write failed: {0}")]
    Io(io::ErrorKind),
    #[error("write did not complete within {0:?}")]
    Timeout(Duration),
    #[error("outbox full")]
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    PeerClosed,
    WriteFailed(ClientWriteError),
    Kicked,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::PeerClosed => "disconnected",
            DisconnectReason::WriteFailed(ClientWriteError::Stalled) => "stalled",
            DisconnectReason::WriteFailed(ClientWriteError::Timeout(_)) => "timed out",
            DisconnectReason::WriteFailed(ClientWriteError::Io(_)) => "write failed",
            DisconnectReason::Kicked => "kicked",
            DisconnectReason::Shutdown => "server shutdown",
        }
    }
}

/// Optional event channel shared by the server loop and the client hub.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<UnboundedSender<ServerEvent>>);

impl EventSink {
    pub(crate) fn new(tx: UnboundedSender<ServerEvent>) -> Self {
        Self(Some(tx))
    }

    pub(crate) fn emit(&self, event: ServerEvent) {
        if let Some(tx) = &self.0 {
            // Receiver gone means nobody is watching.
            let _ = tx.send(event);
        }
    }
}
