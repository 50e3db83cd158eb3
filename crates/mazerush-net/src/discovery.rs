//! Host discovery: the host shouts its presence on the discovery port,
//! browsing clients listen for a fixed window and report what they heard.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{Instant, interval, timeout_at};
use tokio_util::sync::CancellationToken;

use crate::wire::Message;
use crate::{NetConfig, NetError};

/// A host heard during a browse window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHost {
    pub addr: IpAddr,
    pub seed: u64,
}

/// Broadcast `RACING_HOST_IS_HERE:<seed>` until cancelled. The seed is
/// shared so a reset changes what late joiners hear.
pub async fn announce_loop(
    config: NetConfig,
    seed: Arc<AtomicU64>,
    cancel: CancellationToken,
) -> Result<(), NetError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(NetError::Bind)?;
    socket.set_broadcast(true).map_err(NetError::Bind)?;
    let target = format!("{}:{}", config.broadcast_addr, config.discovery_port);

    let mut ticker = interval(Duration::from_millis(config.announce_interval_ms));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {
                let msg = Message::Announce { seed: seed.load(Ordering::Relaxed) };
                if let Err(e) = socket.send_to(msg.encode().as_bytes(), &target).await {
                    // Best effort; a flaky interface should not kill hosting.
                    tracing::warn!(error = %e, "discovery announce failed");
                }
            },
        }
    }
}

/// Listen on the discovery port for one window and return each distinct
/// host heard. An empty list is a normal outcome, not an error.
pub async fn find_hosts(config: &NetConfig) -> Result<Vec<DiscoveredHost>, NetError> {
    let socket = UdpSocket::bind(("0.0.0.0", config.discovery_port))
        .await
        .map_err(NetError::Bind)?;
    let deadline = Instant::now() + Duration::from_millis(config.discovery_window_ms);

    let mut hosts: Vec<DiscoveredHost> = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        let received = match timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "discovery receive failed");
                continue;
            },
            Err(_) => return Ok(hosts),
        };
        let (len, from) = received;
        let Ok(text) = std::str::from_utf8(&buf[..len]) else {
            continue;
        };
        if let Some(Message::Announce { seed }) = Message::parse(text) {
            if let Some(known) = hosts.iter_mut().find(|h| h.addr == from.ip()) {
                // A host that resets mid-window announces a new seed.
                known.seed = seed;
            } else {
                tracing::info!(host = %from.ip(), seed, "discovered race host");
                hosts.push(DiscoveredHost {
                    addr: from.ip(),
                    seed,
                });
            }
        }
    }
}
