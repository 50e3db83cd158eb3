//! The state channel. One UDP socket per peer; the host doubles as a
//! relay so clients only ever talk to the host.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use mazerush_core::car::Car;

use crate::wire::Message;
use crate::{NetConfig, NetError, discovery};

/// Inbound traffic surfaced to the simulation loop.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    /// Host-side: a new client sent its first snapshot.
    PlayerJoined(SocketAddr),
    CarUpdate(Car),
    ItemCollected(u32),
    ItemDropped(u32),
    Win(String),
    /// Client-side: the host pushed the world seed after registration.
    Seed(u64),
    Reset(u64),
}

type ClientMap = Arc<RwLock<HashMap<String, SocketAddr>>>;

enum Role {
    Host {
        /// Registered clients keyed by car id.
        clients: ClientMap,
        /// Announced and pushed to joiners; a reset swaps it.
        seed: Arc<AtomicU64>,
    },
    Client {
        host: SocketAddr,
    },
}

/// A live peer on the state port. Dropping it does not stop the tasks;
/// call [`stop`](Self::stop).
pub struct NetSession {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    role: Role,
    cancel: CancellationToken,
}

impl NetSession {
    /// Bind the state port, start announcing, and relay client traffic.
    pub async fn host(
        config: &NetConfig,
        seed: u64,
    ) -> Result<(NetSession, UnboundedReceiver<NetEvent>), NetError> {
        let socket = UdpSocket::bind(("0.0.0.0", config.state_port))
            .await
            .map_err(NetError::Bind)?;
        let local_addr = socket.local_addr().map_err(NetError::Bind)?;
        let socket = Arc::new(socket);
        let cancel = CancellationToken::new();
        let seed = Arc::new(AtomicU64::new(seed));
        let clients: ClientMap = Arc::new(RwLock::new(HashMap::new()));

        let announce_config = config.clone();
        let announce_seed = Arc::clone(&seed);
        let announce_cancel = cancel.child_token();
        tokio::spawn(async move {
            if let Err(e) =
                discovery::announce_loop(announce_config, announce_seed, announce_cancel).await
            {
                tracing::warn!(error = %e, "announce task stopped");
            }
        });

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(host_recv_loop(
            Arc::clone(&socket),
            Arc::clone(&clients),
            Arc::clone(&seed),
            tx,
            cancel.child_token(),
        ));

        tracing::info!(addr = %local_addr, "hosting race");
        let session = NetSession {
            socket,
            local_addr,
            role: Role::Host { clients, seed },
            cancel,
        };
        Ok((session, rx))
    }

    /// Knock on a host's state port and start listening. Registration
    /// completes when our first snapshot reaches the host.
    pub async fn connect(
        host: SocketAddr,
    ) -> Result<(NetSession, UnboundedReceiver<NetEvent>), NetError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(NetError::Bind)?;
        let local_addr = socket.local_addr().map_err(NetError::Bind)?;
        socket
            .send_to(Message::Hello.encode().as_bytes(), host)
            .await
            .map_err(NetError::Send)?;
        let socket = Arc::new(socket);
        let cancel = CancellationToken::new();

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(client_recv_loop(
            Arc::clone(&socket),
            tx,
            cancel.child_token(),
        ));

        tracing::info!(%host, "joined race");
        let session = NetSession {
            socket,
            local_addr,
            role: Role::Client { host },
            cancel,
        };
        Ok((session, rx))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Push a locally-owned car snapshot to every peer we talk to.
    pub async fn send_update(&self, car: &Car) {
        self.send(&Message::Update(car.clone())).await;
    }

    pub async fn send_item_collected(&self, id: u32) {
        self.send(&Message::ItemCollected(id)).await;
    }

    pub async fn send_item_dropped(&self, id: u32) {
        self.send(&Message::ItemDropped(id)).await;
    }

    pub async fn send_win(&self, winner: &str) {
        self.send(&Message::Win(winner.to_string())).await;
    }

    /// Host only: swap the announced seed and tell everyone to rebuild.
    pub async fn send_reset(&self, new_seed: u64) {
        if let Role::Host { seed, .. } = &self.role {
            seed.store(new_seed, Ordering::Relaxed);
        }
        self.send(&Message::Reset(new_seed)).await;
    }

    /// Stop the recv and announce tasks.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    // Unreachable peers are a fact of LAN life; sends never error out.
    async fn send(&self, msg: &Message) {
        let encoded = msg.encode();
        match &self.role {
            Role::Host { clients, .. } => {
                let clients = clients.read().await;
                for addr in clients.values() {
                    if let Err(e) = self.socket.send_to(encoded.as_bytes(), addr).await {
                        tracing::warn!(%addr, error = %e, "send to client failed");
                    }
                }
            },
            Role::Client { host } => {
                if let Err(e) = self.socket.send_to(encoded.as_bytes(), host).await {
                    tracing::warn!(error = %e, "send to host failed");
                }
            },
        }
    }
}

async fn host_recv_loop(
    socket: Arc<UdpSocket>,
    clients: ClientMap,
    seed: Arc<AtomicU64>,
    tx: UnboundedSender<NetEvent>,
    cancel: CancellationToken,
) {
    let mut buf = [0u8; 1024];
    loop {
        let (len, from) = tokio::select! {
            _ = cancel.cancelled() => return,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "state socket receive failed");
                    return;
                },
            },
        };
        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            continue;
        };
        let Some(msg) = Message::parse(text) else {
            tracing::debug!(%from, "discarding malformed datagram");
            continue;
        };
        match msg {
            Message::Hello => {
                tracing::debug!(%from, "client knocking");
            },
            Message::Update(car) => {
                let mut registry = clients.write().await;
                if !registry.contains_key(&car.id) {
                    registry.insert(car.id.clone(), from);
                    let greeting = Message::Seed(seed.load(Ordering::Relaxed)).encode();
                    if let Err(e) = socket.send_to(greeting.as_bytes(), from).await {
                        tracing::warn!(%from, error = %e, "seed push failed");
                    }
                    tracing::info!(%from, id = %car.id, "client registered");
                    if tx.send(NetEvent::PlayerJoined(from)).is_err() {
                        return;
                    }
                }
                // Relay to everyone but the snapshot's owner.
                let encoded = Message::Update(car.clone()).encode();
                for (id, addr) in registry.iter() {
                    if *id != car.id {
                        let _ = socket.send_to(encoded.as_bytes(), addr).await;
                    }
                }
                drop(registry);
                if tx.send(NetEvent::CarUpdate(car)).is_err() {
                    return;
                }
            },
            Message::ItemCollected(id) => {
                relay_except(&socket, &clients, from, &Message::ItemCollected(id)).await;
                if tx.send(NetEvent::ItemCollected(id)).is_err() {
                    return;
                }
            },
            Message::ItemDropped(id) => {
                relay_except(&socket, &clients, from, &Message::ItemDropped(id)).await;
                if tx.send(NetEvent::ItemDropped(id)).is_err() {
                    return;
                }
            },
            Message::Win(winner) => {
                let encoded = Message::Win(winner.clone()).encode();
                let registry = clients.read().await;
                for addr in registry.values() {
                    let _ = socket.send_to(encoded.as_bytes(), addr).await;
                }
                drop(registry);
                if tx.send(NetEvent::Win(winner)).is_err() {
                    return;
                }
            },
            // Host-originated kinds have no business arriving here.
            Message::Announce { .. } | Message::Seed(_) | Message::Reset(_) => {},
        }
    }
}

async fn relay_except(
    socket: &UdpSocket,
    clients: &ClientMap,
    sender: SocketAddr,
    msg: &Message,
) {
    let encoded = msg.encode();
    let registry = clients.read().await;
    for addr in registry.values() {
        if *addr != sender {
            let _ = socket.send_to(encoded.as_bytes(), addr).await;
        }
    }
}

async fn client_recv_loop(
    socket: Arc<UdpSocket>,
    tx: UnboundedSender<NetEvent>,
    cancel: CancellationToken,
) {
    let mut buf = [0u8; 1024];
    loop {
        let (len, from) = tokio::select! {
            _ = cancel.cancelled() => return,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "state socket receive failed");
                    return;
                },
            },
        };
        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            continue;
        };
        let Some(msg) = Message::parse(text) else {
            tracing::debug!(%from, "discarding malformed datagram");
            continue;
        };
        let event = match msg {
            Message::Update(car) => NetEvent::CarUpdate(car),
            Message::Seed(seed) => NetEvent::Seed(seed),
            Message::Win(winner) => NetEvent::Win(winner),
            Message::ItemCollected(id) => NetEvent::ItemCollected(id),
            Message::ItemDropped(id) => NetEvent::ItemDropped(id),
            Message::Reset(seed) => NetEvent::Reset(seed),
            Message::Announce { .. } | Message::Hello => continue,
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}
