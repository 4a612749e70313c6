mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod packet;
pub mod server;
pub mod store;
pub mod window;
pub mod worker;

pub use crate::cli::{Cli, Command, GetArgs, ServeArgs};
pub use crate::config::{ClientConfig, ServerConfig};
pub use crate::error::TransferError;
pub use crate::packet::{DecodeError, Packet};
pub use crate::server::Server;
pub use crate::window::Window;

/// File content bytes per Data packet. A shorter payload ends the transfer.
pub const BLOCK_SIZE: usize = 512;
/// Largest datagram either side reads.
pub const MAX_DATAGRAM: usize = 1472;

pub const DEF_ACK_TIMEOUT_MS: u64 = 1000;
pub const DEF_RECV_TIMEOUT_MS: u64 = 5000;
pub const MAX_RETRY_COUNT: u8 = 5;
pub const DEF_MAX_TRANSFERS: usize = 64;

pub const NOT_FOUND_MSG: &str = "file not found";
pub const BUSY_MSG: &str = "server busy";
