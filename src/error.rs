use std::io;

use crate::packet::DecodeError;

/// Why a single transfer ended without delivering the whole file.
///
/// Every variant is local to one session or worker.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("server timed out or connection closed")]
    RequestTimeout,

    #[error("remote error: {0}")]
    RemoteError(String),

    #[error("no ack for block #{block} after {attempts} attempts")]
    AckTimeoutExhausted { block: u8, attempts: u8 },

    #[error("malformed packet: {0}")]
    Malformed(#[from] DecodeError),

    #[error("unexpected {0} packet")]
    UnexpectedPacket(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}
