use std::fmt;

use crate::BLOCK_SIZE;

pub const OP_REQUEST: u8 = 1;
pub const OP_DATA: u8 = 2;
pub const OP_ACK: u8 = 3;
pub const OP_ERROR: u8 = 4;

/// Reasons a datagram could not be read as a [`Packet`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty datagram")]
    Empty,

    #[error("invalid opcode: {0}")]
    UnknownOpcode(u8),

    #[error("packet truncated")]
    Truncated,

    #[error("request carries no filename")]
    MissingFilename,

    #[error("data payload of {0} bytes exceeds {}", BLOCK_SIZE)]
    PayloadTooLarge(usize),

    #[error("acknowledge must be 2 bytes, got {0}")]
    AckLength(usize),
}

/// One datagram of the protocol.
///
/// Every packet starts with a one-byte opcode. Text fields are unterminated
/// and run to the end of the datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Request { filename: String },
    Data { block: u8, payload: Vec<u8> },
    Ack(u8),
    Error { message: String },
}

impl Packet {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Packet::Request { filename } => {
                let mut bytes = Vec::with_capacity(1 + filename.len());
                bytes.push(OP_REQUEST);
                bytes.extend_from_slice(filename.as_bytes());
                bytes
            }
            Packet::Data { block, payload } => {
                let mut bytes = Vec::with_capacity(2 + payload.len());
                bytes.push(OP_DATA);
                bytes.push(*block);
                bytes.extend_from_slice(payload);
                bytes
            }
            Packet::Ack(block) => vec![OP_ACK, *block],
            Packet::Error { message } => {
                let mut bytes = Vec::with_capacity(1 + message.len());
                bytes.push(OP_ERROR);
                bytes.extend_from_slice(message.as_bytes());
                bytes
            }
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let (&opcode, rest) = buf.split_first().ok_or(DecodeError::Empty)?;

        let pkt = match opcode {
            OP_REQUEST => {
                if rest.is_empty() {
                    return Err(DecodeError::MissingFilename);
                }
                // Lossy so a garbled name still gets a "file not found" reply.
                let filename = String::from_utf8_lossy(rest).into_owned();
                Packet::Request { filename }
            }
            OP_DATA => {
                let (&block, payload) = rest.split_first().ok_or(DecodeError::Truncated)?;
                if payload.len() > BLOCK_SIZE {
                    return Err(DecodeError::PayloadTooLarge(payload.len()));
                }
                Packet::Data {
                    block,
                    payload: payload.to_vec(),
                }
            }
            OP_ACK => match rest {
                [block] => Packet::Ack(*block),
                [] => return Err(DecodeError::Truncated),
                _ => return Err(DecodeError::AckLength(buf.len())),
            },
            OP_ERROR => Packet::Error {
                message: String::from_utf8_lossy(rest).into_owned(),
            },
            _ => return Err(DecodeError::UnknownOpcode(opcode)),
        };

        Ok(pkt)
    }

    /// Short name used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Packet::Request { .. } => "request",
            Packet::Data { .. } => "data",
            Packet::Ack(_) => "ack",
            Packet::Error { .. } => "error",
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Request { filename } => write!(f, "RRQ {filename:?}"),
            Packet::Data { block, payload } => write!(f, "DATA #{block} ({} bytes)", payload.len()),
            Packet::Ack(block) => write!(f, "ACK #{block}"),
            Packet::Error { message } => write!(f, "ERROR {message:?}"),
        }
    }
}
