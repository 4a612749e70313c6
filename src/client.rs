use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::TransferError;
use crate::packet::Packet;
use crate::window::Window;
use crate::{BLOCK_SIZE, MAX_DATAGRAM};

/// What a completed download delivered to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub blocks: u64,
    pub bytes: u64,
}

/// Fetch `filename` from `server` into `sink`.
pub async fn run<W>(
    server: SocketAddr,
    filename: &str,
    sink: &mut W,
    config: &ClientConfig,
) -> Result<Received, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut session = Session::open(server, config).await?;
    session.request(filename).await?;
    session.receive(sink).await
}

/// State of one download, owned by the loop that drives it.
pub struct Session {
    socket: UdpSocket,
    server: SocketAddr,
    /// Transfer endpoint, learned from the first reply.
    peer: Option<SocketAddr>,
    window: Window,
    receive_timeout: Duration,
    bytes: u64,
}

impl Session {
    pub async fn open(server: SocketAddr, config: &ClientConfig) -> std::io::Result<Self> {
        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self {
            socket,
            server,
            peer: None,
            // The receiver never retransmits, so it has no retry budget.
            window: Window::new(0),
            receive_timeout: config.receive_timeout,
            bytes: 0,
        })
    }

    pub async fn request(&self, filename: &str) -> std::io::Result<()> {
        let rrq = Packet::Request {
            filename: filename.to_string(),
        };
        self.socket.send_to(&rrq.encode(), self.server).await?;
        info!(server = %self.server, filename, "requested");
        Ok(())
    }

    /// Drive the receive/acknowledge loop until the final short block.
    pub async fn receive<W>(&mut self, sink: &mut W) -> Result<Received, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = [0u8; MAX_DATAGRAM];

        loop {
            let received = timeout(self.receive_timeout, self.socket.recv_from(&mut buf)).await;
            let (num, from) = match received {
                Err(_) => return Err(TransferError::RequestTimeout),
                Ok(res) => res?,
            };

            match self.peer {
                Some(peer) if peer != from => {
                    warn!(%from, %peer, "ignoring datagram from unknown source");
                    continue;
                }
                Some(_) => {}
                None => self.peer = Some(from),
            }

            match Packet::decode(&buf[..num])? {
                Packet::Data { block, payload } => {
                    if self.window.is_current(block) {
                        self.ack(block, from).await?;
                        sink.write_all(&payload).await?;
                        self.bytes += payload.len() as u64;
                        self.window.advance();
                        debug!(block, size = payload.len(), "received");
                    } else {
                        let last = self.window.last_acked();
                        debug!(block, expected = self.window.current(), last, "duplicate block, re-acking");
                        self.ack(last, from).await?;
                    }

                    if payload.len() < BLOCK_SIZE {
                        sink.flush().await?;
                        let received = Received {
                            blocks: self.window.completed(),
                            bytes: self.bytes,
                        };
                        info!(blocks = received.blocks, bytes = received.bytes, "download complete");
                        return Ok(received);
                    }
                }
                Packet::Error { message } => return Err(TransferError::RemoteError(message)),
                other => return Err(TransferError::UnexpectedPacket(other.kind())),
            }
        }
    }

    async fn ack(&self, block: u8, to: SocketAddr) -> std::io::Result<()> {
        self.socket.send_to(&Packet::Ack(block).encode(), to).await?;
        Ok(())
    }
}
