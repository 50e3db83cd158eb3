//! LAN transport for the maze race: UDP host discovery plus a
//! host-relayed state channel speaking a colon-delimited text protocol.

pub mod discovery;
pub mod session;
pub mod wire;

/// Ports and timing for the LAN protocol. Tests override the ports to
/// stay off the well-known ones.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Host announcements broadcast to this port.
    pub discovery_port: u16,
    /// Game state and event traffic.
    pub state_port: u16,
    /// Gap between host announcements.
    pub announce_interval_ms: u64,
    /// How long a browsing client listens before reporting.
    pub discovery_window_ms: u64,
    /// Announce destination; tests point this at loopback.
    pub broadcast_addr: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            discovery_port: 8888,
            state_port: 8890,
            announce_interval_ms: 2000,
            discovery_window_ms: 5000,
            broadcast_addr: "255.255.255.255".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum NetError {
    Bind(std::io::Error),
    Send(std::io::Error),
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind(e) => write!(f, "socket bind failed: {e}"),
            Self::Send(e) => write!(f, "send failed: {e}"),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind(e) | Self::Send(e) => Some(e),
        }
    }
}
