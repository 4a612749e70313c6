use anstyle::AnsiColor;
use clap::builder::styling::Styles;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ClientConfig, ServerConfig};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Cyan.on_default())
    .placeholder(AnsiColor::Red.on_default());

#[derive(Parser, Debug)]
#[command(name = "mini-tftp")]
#[command(about = "A minimal stop-and-wait file transfer client/server", long_about = None)]
#[command(styles = STYLES)]
pub struct Cli {
    /// Log every block
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve files from a directory
    Serve(ServeArgs),
    /// Download a file from a server
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen ip
    #[arg(short, long, default_value = "0.0.0.0")]
    pub ip: IpAddr,

    /// Listen port, 0 for an ephemeral one
    #[arg(short, long, default_value_t = 0)]
    pub port: u16,

    /// Work directory
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Ack timeout (ms)
    #[arg(short, long, default_value_t = crate::DEF_ACK_TIMEOUT_MS)]
    pub timeout: u64,

    /// Max retries per block
    #[arg(short, long, default_value_t = crate::MAX_RETRY_COUNT)]
    pub retry: u8,

    /// Max concurrent transfers
    #[arg(short, long, default_value_t = crate::DEF_MAX_TRANSFERS,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_transfers: usize,
}

impl ServeArgs {
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            bind: SocketAddr::new(self.ip, self.port),
            root: self.directory.clone(),
            ack_timeout: Duration::from_millis(self.timeout),
            max_retries: self.retry,
            max_transfers: self.max_transfers,
        }
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Server host name or ip
    pub host: String,

    /// Server port
    pub port: u16,

    /// Remote file name
    pub filename: String,

    /// Local destination path
    pub destination: PathBuf,

    /// Receive timeout (ms)
    #[arg(short, long, default_value_t = crate::DEF_RECV_TIMEOUT_MS)]
    pub timeout: u64,
}

impl GetArgs {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            receive_timeout: Duration::from_millis(self.timeout),
        }
    }
}
