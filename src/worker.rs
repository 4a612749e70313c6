use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::packet::Packet;
use crate::store::FileStore;
use crate::window::Window;
use crate::{BLOCK_SIZE, MAX_DATAGRAM, NOT_FOUND_MSG};

/// How a worker finished when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done { blocks: u64, bytes: u64 },
    NotFound,
}

/// Serve one read request from a fresh ephemeral socket.
///
/// A missing file costs exactly one Error packet and no retries. Otherwise
/// the file is streamed block by block until the final short block is
/// acknowledged, or until one block exhausts its retry budget.
pub async fn transfer(
    store: &FileStore,
    filename: &str,
    peer: SocketAddr,
    ack_timeout: Duration,
    max_retries: u8,
) -> Result<Outcome, TransferError> {
    let start = Instant::now();
    let local: SocketAddr = if peer.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(peer).await?;

    let file = match store.open(filename).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            send_error(&socket, NOT_FOUND_MSG).await?;
            warn!(%peer, filename, "file not found");
            return Ok(Outcome::NotFound);
        }
        Err(e) => {
            send_error(&socket, &e.to_string()).await?;
            return Err(e.into());
        }
    };

    info!(%peer, filename, "sending");
    let (blocks, bytes) = send_blocks(&socket, file, ack_timeout, max_retries).await?;

    let cost = start.elapsed().as_secs_f64();
    info!(
        %peer,
        filename,
        blocks,
        bytes,
        "transfer complete, cost: {:.3}s, speed: {:.2} MB/s",
        cost,
        bytes as f64 / cost.max(f64::EPSILON) / 1024.0 / 1024.0
    );
    Ok(Outcome::Done { blocks, bytes })
}

/// Stop-and-wait sender over an already connected socket.
///
/// Returns the number of blocks and bytes delivered. A source that ends on a
/// block boundary gets one trailing empty block so the receiver sees a short
/// packet.
pub async fn send_blocks<R>(
    socket: &UdpSocket,
    mut source: R,
    ack_timeout: Duration,
    max_retries: u8,
) -> Result<(u64, u64), TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut window = Window::new(max_retries);
    let mut chunk = vec![0u8; BLOCK_SIZE];
    let mut bytes: u64 = 0;

    loop {
        let size = read_chunk(&mut source, &mut chunk).await?;
        let block = window.current();
        let data = Packet::Data {
            block,
            payload: chunk[..size].to_vec(),
        }
        .encode();

        loop {
            socket.send(&data).await?;
            if recv_ack(socket, block, ack_timeout).await? {
                break;
            }
            if !window.timed_out() {
                return Err(TransferError::AckTimeoutExhausted {
                    block,
                    attempts: window.retries(),
                });
            }
            warn!(block, retries = window.retries(), "ack timeout, resending");
        }

        debug!(block, size, "acked");
        window.advance();
        bytes += size as u64;

        if size < BLOCK_SIZE {
            return Ok((window.completed(), bytes));
        }
    }
}

/// Wait up to `ack_timeout` for an acknowledgment of `block`.
///
/// Anything else arriving in the meantime is noise and does not extend the
/// deadline. Returns `false` on timeout.
async fn recv_ack(
    socket: &UdpSocket,
    block: u8,
    ack_timeout: Duration,
) -> Result<bool, TransferError> {
    let deadline = Instant::now() + ack_timeout;
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        let n = match timeout_at(deadline, socket.recv(&mut buf)).await {
            Err(_) => return Ok(false),
            Ok(Ok(n)) => n,
            // ICMP unreachable from an earlier send; the peer may yet answer.
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => continue,
            Ok(Err(e)) => return Err(e.into()),
        };

        match Packet::decode(&buf[..n]) {
            Ok(Packet::Ack(ack)) if ack == block => return Ok(true),
            Ok(Packet::Ack(ack)) => debug!(expected = block, ack, "ignoring stale ack"),
            Ok(Packet::Error { message }) => return Err(TransferError::RemoteError(message)),
            Ok(other) => debug!(packet = %other, "ignoring unexpected packet"),
            Err(e) => warn!(error = %e, "ignoring malformed packet"),
        }
    }
}

/// Fill `buf` from `source`, stopping early only at end of input.
async fn read_chunk<R>(source: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn send_error(socket: &UdpSocket, msg: &str) -> io::Result<()> {
    let error = Packet::Error {
        message: msg.to_string(),
    };
    socket.send(&error.encode()).await?;
    Ok(())
}
