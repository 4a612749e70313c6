use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use tokio::time::Duration;

/// Settings for the dispatcher and every worker it spawns.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening address; port 0 picks an ephemeral port.
    pub bind: SocketAddr,
    /// Directory files are served from.
    pub root: PathBuf,
    /// How long a worker waits for each acknowledgment.
    pub ack_timeout: Duration,
    /// Consecutive timeouts tolerated for one block before aborting.
    pub max_retries: u8,
    /// Upper bound on concurrently running workers.
    pub max_transfers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            root: PathBuf::from("."),
            ack_timeout: Duration::from_millis(crate::DEF_ACK_TIMEOUT_MS),
            max_retries: crate::MAX_RETRY_COUNT,
            max_transfers: crate::DEF_MAX_TRANSFERS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Any silence longer than this ends the session.
    pub receive_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(crate::DEF_RECV_TIMEOUT_MS),
        }
    }
}
