use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::fs::File;
use tokio::io::BufWriter;
use tracing_subscriber::EnvFilter;

use mini_tftp::client;
use mini_tftp::{Cli, Command, GetArgs, ServeArgs, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match args.command {
        Command::Serve(args) => serve(args).await,
        Command::Get(args) => get(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = args.config();
    config.root = std::fs::canonicalize(&config.root)
        .with_context(|| format!("bad work directory {}", config.root.display()))?;

    let server = Server::bind(config)
        .await
        .with_context(|| format!("failed to bind {}:{}", args.ip, args.port))?;

    server
        .serve_until(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("listener failed")
}

async fn get(args: GetArgs) -> anyhow::Result<()> {
    let server = tokio::net::lookup_host((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("cannot resolve {}", args.host))?
        .next()
        .ok_or(anyhow!("no address for {}", args.host))?;

    let file = File::create(&args.destination)
        .await
        .with_context(|| format!("cannot create {}", args.destination.display()))?;
    let mut sink = BufWriter::new(file);

    match client::run(server, &args.filename, &mut sink, &args.config()).await {
        Ok(received) => {
            println!(
                "RECEIVED {} SUCCESSFULLY ({} bytes, {} blocks)",
                args.filename, received.bytes, received.blocks
            );
            Ok(())
        }
        Err(e) => {
            drop(sink);
            tokio::fs::remove_file(&args.destination).await.ok();
            Err(e).with_context(|| format!("failed to get {}", args.filename))
        }
    }
}
