use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::packet::Packet;
use crate::store::FileStore;
use crate::worker::{self, Outcome};
use crate::{BUSY_MSG, MAX_DATAGRAM};

/// Listens on one well-known socket and hands every read request to its own
/// worker task.
pub struct Server {
    socket: UdpSocket,
    store: FileStore,
    config: ServerConfig,
    permits: Arc<Semaphore>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(config.bind).await?;
        let store = FileStore::new(config.root.clone());
        let permits = Arc::new(Semaphore::new(config.max_transfers));
        Ok(Self {
            socket,
            store,
            config,
            permits,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Run the dispatch loop forever. Only a listener failure returns.
    pub async fn serve(self) -> io::Result<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Run the dispatch loop until `shutdown` resolves.
    ///
    /// Workers already spawned keep running to their own end.
    pub async fn serve_until<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buf = [0u8; MAX_DATAGRAM];

        info!(
            addr = %self.socket.local_addr()?,
            root = %self.store.root().display(),
            timeout_ms = self.config.ack_timeout.as_millis() as u64,
            retry = self.config.max_retries,
            max_transfers = self.config.max_transfers,
            "server listening"
        );

        loop {
            let received = tokio::select! {
                _ = &mut shutdown => {
                    info!("listener shutting down");
                    return Ok(());
                }
                res = self.socket.recv_from(&mut buf) => res,
            };
            let (num, addr) = match received {
                Ok(res) => res,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                    ) =>
                {
                    warn!(error = %e, "listener receive error");
                    continue;
                }
                Err(e) => return Err(e),
            };

            self.dispatch(&buf[..num], addr).await;
        }
    }

    async fn dispatch(&self, datagram: &[u8], addr: SocketAddr) {
        let filename = match Packet::decode(datagram) {
            Ok(Packet::Request { filename }) => filename,
            Ok(other) => {
                warn!(%addr, packet = %other, "ignoring non-request packet");
                return;
            }
            Err(e) => {
                warn!(%addr, error = %e, "ignoring malformed packet");
                return;
            }
        };
        info!(%addr, %filename, "read request");

        let Ok(permit) = self.permits.clone().try_acquire_owned() else {
            warn!(%addr, %filename, "too many transfers, rejecting");
            let busy = Packet::Error {
                message: BUSY_MSG.to_string(),
            };
            if let Err(e) = self.socket.send_to(&busy.encode(), addr).await {
                warn!(%addr, error = %e, "failed to send busy error");
            }
            return;
        };

        let store = self.store.clone();
        let ack_timeout = self.config.ack_timeout;
        let max_retries = self.config.max_retries;
        task::spawn(async move {
            match worker::transfer(&store, &filename, addr, ack_timeout, max_retries).await {
                Ok(Outcome::Done { .. }) | Ok(Outcome::NotFound) => {}
                Err(e) => error!(%addr, %filename, error = %e, "transfer aborted"),
            }
            drop(permit);
        });
    }
}
