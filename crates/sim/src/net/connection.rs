use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::events::{ClientId, ClientWriteError, DisconnectReason, EventSink, ServerEvent};

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
}

#[derive(Debug)]
struct ClientConnection {
    addr: SocketAddr,
    connected_at: Instant,
    outbox: mpsc::Sender<Arc<str>>,
    task: JoinHandle<()>,
}

#[derive(Debug)]
pub(crate) enum HubCommand {
    Register {
        stream: TcpStream,
        addr: SocketAddr,
    },
    Broadcast(Arc<str>),
    Release {
        client_id: ClientId,
        reason: DisconnectReason,
    },
    Kick(ClientId),
    List(oneshot::Sender<Vec<ClientInfo>>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HubLimits {
    pub max_clients: usize,
    pub queue_depth: usize,
    pub write_timeout: Duration,
}

/// Sending side of the hub. Commands are applied in the order they are sent.
#[derive(Debug, Clone)]
pub(crate) struct HubHandle(mpsc::UnboundedSender<HubCommand>);

impl HubHandle {
    pub(crate) fn register(&self, stream: TcpStream, addr: SocketAddr) {
        self.send(HubCommand::Register { stream, addr });
    }

    pub(crate) fn broadcast(&self, batch: Arc<str>) {
        self.send(HubCommand::Broadcast(batch));
    }

    pub(crate) fn kick(&self, client_id: ClientId) {
        self.send(HubCommand::Kick(client_id));
    }

    pub(crate) async fn list(&self) -> Vec<ClientInfo> {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::List(tx));
        rx.await.unwrap_or_default()
    }

    pub(crate) async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(HubCommand::Shutdown(tx));
        let _ = rx.await;
    }

    fn send(&self, command: HubCommand) {
        if self.0.send(command).is_err() {
            log::debug!("client hub already stopped");
        }
    }
}

/// Sole owner of the connected client set.
#[derive(Debug)]
pub(crate) struct ClientHub {
    clients: HashMap<ClientId, ClientConnection>,
    next_client_id: ClientId,
    limits: HubLimits,
    commands: mpsc::UnboundedReceiver<HubCommand>,
    handle: HubHandle,
    events: EventSink,
}

impl ClientHub {
    pub(crate) fn new(limits: HubLimits) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = HubHandle(tx);
        let hub = Self {
            clients: HashMap::new(),
            next_client_id: 1,
            limits,
            commands: rx,
            handle: handle.clone(),
            events: EventSink::default(),
        };
        (hub, handle)
    }

    pub(crate) fn set_event_sink(&mut self, events: EventSink) {
        self.events = events;
    }

    pub(crate) async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { stream, addr } => self.register(stream, addr),
                HubCommand::Broadcast(batch) => self.broadcast(batch),
                HubCommand::Release { client_id, reason } => self.remove(client_id, reason),
                HubCommand::Kick(client_id) => self.remove(client_id, DisconnectReason::Kicked),
                HubCommand::List(reply) => {
                    let _ = reply.send(self.client_infos());
                }
                HubCommand::Shutdown(reply) => {
                    self.remove_all(DisconnectReason::Shutdown);
                    let _ = reply.send(());
                    break;
                }
            }
        }
        self.remove_all(DisconnectReason::Shutdown);
    }

    fn register(&mut self, stream: TcpStream, addr: SocketAddr) {
        if self.clients.len() >= self.limits.max_clients {
            log::warn!("Refusing {}: server full ({} clients)", addr, self.clients.len());
            self.events.emit(ServerEvent::ConnectionDenied {
                addr,
                reason: String::from("Server full"),
            });
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("set_nodelay failed for {}: {}", addr, e);
        }

        let client_id = self.next_client_id;
        self.next_client_id = self.next_client_id.wrapping_add(1);

        let (outbox, rx) = mpsc::channel(self.limits.queue_depth.max(1));
        let task = tokio::spawn(client_writer(
            client_id,
            stream,
            rx,
            self.limits.write_timeout,
            self.handle.clone(),
        ));

        self.clients.insert(
            client_id,
            ClientConnection {
                addr,
                connected_at: Instant::now(),
                outbox,
                task,
            },
        );

        log::info!("Client {} connected from {}", client_id, addr);
        self.events
            .emit(ServerEvent::ClientConnected { client_id, addr });
    }

    fn broadcast(&mut self, batch: Arc<str>) {
        let mut stalled = Vec::new();
        for (&client_id, client) in &self.clients {
            match client.outbox.try_send(Arc::clone(&batch)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => stalled.push(client_id),
                // Writer already exited and queued its own release.
                Err(TrySendError::Closed(_)) => {}
            }
        }

        for client_id in stalled {
            self.remove(
                client_id,
                DisconnectReason::WriteFailed(ClientWriteError::Stalled),
            );
        }
    }

    fn remove(&mut self, client_id: ClientId, reason: DisconnectReason) {
        let Some(client) = self.clients.remove(&client_id) else {
            return;
        };

        // Dropping the writer task drops its socket.
        client.task.abort();

        match &reason {
            DisconnectReason::WriteFailed(e) => {
                log::warn!("Dropping client {} ({}): {}", client_id, client.addr, e)
            }
            _ => log::info!(
                "Client {} ({}) {}",
                client_id,
                client.addr,
                reason.as_str()
            ),
        }

        self.events.emit(ServerEvent::ClientDisconnected {
            client_id,
            addr: client.addr,
            reason,
        });
    }

    fn remove_all(&mut self, reason: DisconnectReason) {
        let client_ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for client_id in client_ids {
            self.remove(client_id, reason.clone());
        }
    }

    fn client_infos(&self) -> Vec<ClientInfo> {
        let mut infos: Vec<ClientInfo> = self
            .clients
            .iter()
            .map(|(&client_id, c)| ClientInfo {
                client_id,
                addr: c.addr,
                connected_at: c.connected_at,
            })
            .collect();
        infos.sort_by_key(|info| info.client_id);
        infos
    }
}

async fn client_writer(
    client_id: ClientId,
    stream: TcpStream,
    mut outbox: mpsc::Receiver<Arc<str>>,
    write_timeout: Duration,
    hub: HubHandle,
) {
    let (mut reader, mut writer) = stream.into_split();
    let mut discard = [0u8; 512];

    let reason = loop {
        tokio::select! {
            batch = outbox.recv() => {
                let Some(batch) = batch else {
                    // Hub dropped the connection.
                    return;
                };
                match tokio::time::timeout(write_timeout, writer.write_all(batch.as_bytes())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => break DisconnectReason::WriteFailed(ClientWriteError::Io(e.kind())),
                    Err(_) => break DisconnectReason::WriteFailed(ClientWriteError::Timeout(write_timeout)),
                }
            }
            read = reader.read(&mut discard) => match read {
                Ok(0) | Err(_) => break DisconnectReason::PeerClosed,
                // Inbound bytes are ignored.
                Ok(_) => {}
            }
        }
    };

    hub.send(HubCommand::Release { client_id, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    fn limits(max_clients: usize) -> HubLimits {
        HubLimits {
            max_clients,
            queue_depth: 4,
            write_timeout: Duration::from_millis(500),
        }
    }

    async fn connected_pair(listener: &TcpListener) -> (TcpStream, TcpStream, SocketAddr) {
        let client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (server_side, addr) = listener.accept().await.unwrap();
        (client, server_side, addr)
    }

    #[tokio::test]
    async fn registered_client_receives_broadcast() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (hub, handle) = ClientHub::new(limits(8));
        let hub_task = tokio::spawn(hub.run());

        let (client, server_side, addr) = connected_pair(&listener).await;
        handle.register(server_side, addr);
        handle.broadcast(Arc::from("$IIHDT,45.0,T*13\r\n"));

        let mut lines = tokio::io::BufReader::new(client).lines();
        let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line.as_deref(), Some("$IIHDT,45.0,T*13"));

        handle.shutdown().await;
        hub_task.await.unwrap();
    }

    #[tokio::test]
    async fn refuses_clients_over_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (mut hub, handle) = ClientHub::new(limits(1));
        let (tx, mut events) = mpsc::unbounded_channel();
        hub.set_event_sink(EventSink::new(tx));
        let hub_task = tokio::spawn(hub.run());

        let (_first, server_first, addr_first) = connected_pair(&listener).await;
        let (_second, server_second, addr_second) = connected_pair(&listener).await;
        handle.register(server_first, addr_first);
        handle.register(server_second, addr_second);

        assert_eq!(handle.list().await.len(), 1);
        assert!(matches!(
            events.recv().await,
            Some(ServerEvent::ClientConnected { client_id: 1, .. })
        ));
        assert!(matches!(
            events.recv().await,
            Some(ServerEvent::ConnectionDenied { addr, .. }) if addr == addr_second
        ));

        handle.shutdown().await;
        hub_task.await.unwrap();
    }

    #[tokio::test]
    async fn kick_closes_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (hub, handle) = ClientHub::new(limits(8));
        let hub_task = tokio::spawn(hub.run());

        let (mut client, server_side, addr) = connected_pair(&listener).await;
        handle.register(server_side, addr);
        let clients = handle.list().await;
        assert_eq!(clients.len(), 1);

        handle.kick(clients[0].client_id);
        assert!(handle.list().await.is_empty());

        let mut buf = [0u8; 16];
        let read = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));

        handle.shutdown().await;
        hub_task.await.unwrap();
    }

    #[tokio::test]
    async fn peer_close_releases_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (hub, handle) = ClientHub::new(limits(8));
        let hub_task = tokio::spawn(hub.run());

        let (client, server_side, addr) = connected_pair(&listener).await;
        handle.register(server_side, addr);
        assert_eq!(handle.list().await.len(), 1);
        drop(client);

        let deadline = Instant::now() + Duration::from_secs(2);
        while !handle.list().await.is_empty() {
            assert!(Instant::now() < deadline, "client was never released");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.shutdown().await;
        hub_task.await.unwrap();
    }
}
