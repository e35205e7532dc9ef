use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::config::SimulatorConfig;
use crate::nav::{Navigator, VesselState};
use crate::nmea::SentenceEncoder;

use super::connection::{ClientHub, ClientInfo, HubHandle, HubLimits};
use super::events::{ClientId, EventSink, ServerEvent};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Cloneable control surface for a running [`BroadcastServer`].
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: Arc<watch::Sender<bool>>,
    hub: HubHandle,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn kick(&self, client_id: ClientId) {
        self.hub.kick(client_id);
    }

    pub async fn clients(&self) -> Vec<ClientInfo> {
        self.hub.list().await
    }
}

/// Advances the navigator and renders one batch per tick.
struct Ticker<R> {
    navigator: Navigator<R>,
    encoder: SentenceEncoder,
    period: Duration,
    tick: u64,
}

impl<R: Rng> Ticker<R> {
    fn next_batch(&mut self) -> (Arc<str>, VesselState) {
        let state = self.navigator.advance(self.period);
        self.tick += 1;

        log::debug!(
            "tick {}: {} sog {:.1} cog {:.1}",
            self.tick,
            state.position,
            state.speed_over_ground,
            state.course_over_ground
        );

        (Arc::from(self.encoder.encode_batch(&state)), state)
    }
}

/// Accepts TCP clients and writes one sentence batch per tick to each of them.
pub struct BroadcastServer<R = StdRng> {
    listener: TcpListener,
    local_addr: SocketAddr,
    ticker: Ticker<R>,
    hub: ClientHub,
    hub_handle: HubHandle,
    shutdown: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    events: EventSink,
}

impl<R: Rng + Send + 'static> BroadcastServer<R> {
    pub async fn bind(config: &SimulatorConfig, navigator: Navigator<R>) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let (hub, hub_handle) = ClientHub::new(HubLimits {
            max_clients: config.max_clients,
            queue_depth: config.client_queue_depth,
            write_timeout: config.write_timeout,
        });
        let (shutdown, shutdown_rx) = watch::channel(false);

        log::info!("NMEA server listening on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            ticker: Ticker {
                navigator,
                encoder: SentenceEncoder::default(),
                period: config.tick_period,
                tick: 0,
            },
            hub,
            hub_handle,
            shutdown: Arc::new(shutdown),
            shutdown_rx,
            events: EventSink::default(),
        })
    }

    pub fn with_event_sink(mut self, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        let events = EventSink::new(tx);
        self.hub.set_event_sink(events.clone());
        self.events = events;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: Arc::clone(&self.shutdown),
            hub: self.hub_handle.clone(),
        }
    }

    /// Runs until [`ServerHandle::shutdown`] is called, then closes every client.
    pub async fn run(self) {
        let BroadcastServer {
            listener,
            local_addr,
            mut ticker,
            hub,
            hub_handle,
            shutdown: _shutdown,
            mut shutdown_rx,
            events,
        } = self;

        let hub_task = tokio::spawn(hub.run());
        events.emit(ServerEvent::Listening { addr: local_addr });

        let mut interval = time::interval(ticker.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => hub_handle.register(stream, addr),
                    Err(e) => {
                        log::warn!("Accept failed: {}", e);
                        events.emit(ServerEvent::Error {
                            message: format!("Accept failed: {}", e),
                        });
                    }
                },
                _ = interval.tick() => {
                    let (batch, state) = ticker.next_batch();
                    hub_handle.broadcast(batch);
                    events.emit(ServerEvent::Tick {
                        tick: ticker.tick,
                        state: Box::new(state),
                    });
                }
            }
        }

        log::info!("Shutting down after {} ticks", ticker.tick);
        drop(listener);
        hub_handle.shutdown().await;
        if let Err(e) = hub_task.await {
            log::error!("Client hub task failed: {}", e);
        }
    }
}
