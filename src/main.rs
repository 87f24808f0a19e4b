use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use clap_derive::Parser;
use tracing::{info, Level};

use amqpeer::message::wire::WireCodec;
use amqpeer::peer::config::PeerConfig;
use amqpeer::peer::dispatcher;
use amqpeer::sim::engine::SimEngine;
use amqpeer::sim::remote::RemoteConfig;

/// An event-driven messaging peer: listens, then sends or receives a bounded number of
/// messages against a simulated remote client, and shuts down cleanly.
#[derive(Parser)]
struct Args {
    /// container identity; defaults to a per-run unique name
    #[clap(long)]
    container_id: Option<String>,

    /// host to listen on; empty selects the wildcard address
    #[clap(long, default_value = "")]
    host: String,

    /// port or service name to listen on
    #[clap(long, default_value = "amqp")]
    port: String,

    /// node address messages are sent to
    #[clap(long, default_value = "example")]
    address: String,

    /// messages to send or receive; 0 receives without bound
    #[clap(short, long, default_value_t = 10)]
    count: u32,

    /// role the simulated remote client plays: "receiver" makes this peer send,
    /// "sender" makes it receive
    #[clap(long, default_value = "receiver")]
    remote_role: String,

    /// messages the simulated sending client transmits; defaults to --count, or 10
    /// when receiving without bound
    #[clap(long)]
    remote_count: Option<u32>,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let container_id = args.container_id
        .unwrap_or_else(|| format!("amqpeer-{:08x}", rand::random::<u32>()));

    let remote = match args.remote_role.as_str() {
        "receiver" => RemoteConfig::receiving_client(args.remote_count.unwrap_or(args.count)),
        "sender" => {
            let count = args.remote_count.unwrap_or(if args.count > 0 { args.count } else { 10 });
            RemoteConfig::sending_client(count)
        }
        other => return Err(anyhow!("invalid remote role: {}", other)),
    };

    let config = PeerConfig {
        container_id,
        host: args.host,
        port: args.port,
        address: args.address,
        count: args.count,
    };

    let mut engine = SimEngine::new(remote);
    let stats = dispatcher::run(&mut engine, &WireCodec, config)?;

    info!(
        sent = stats.sent,
        acknowledged = stats.acknowledged,
        received = stats.received,
        "run complete"
    );
    Ok(if stats.failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
