//! Entry point for the Selective-Repeat node.
//!
//! Parses and validates the CLI arguments, then wires three perpetual loops:
//! the stdin command loop, the stdout trace printer, and the node actor
//! underneath. `main.rs` owns only process setup; all protocol work lives in
//! the library modules.

use clap::{Parser, ValueEnum};
use sr_tokio::{parse_command, Command, LossConfig, LossMode, NodeConfig, SrNode};
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Reliable, ordered transport over lossy UDP (Selective-Repeat ARQ).
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Local UDP port to bind
    local_port: u16,
    /// Peer UDP port on the same host
    remote_port: u16,
    /// Sliding window size, in packets
    window_size: u64,
    /// Retransmission timeout in milliseconds
    timeout_ms: u64,
    /// Inbound drop probability in [0.0, 1.0]
    loss_rate: f64,

    /// Which inbound datagrams the drop probability applies to
    #[arg(long, value_enum, default_value = "both")]
    loss_mode: LossModeArg,
    /// RNG seed for reproducible loss decisions
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LossModeArg {
    /// Data and ACK datagrams alike
    Both,
    /// Data datagrams only
    Data,
    /// ACK datagrams only
    Ack,
}

impl From<LossModeArg> for LossMode {
    fn from(mode: LossModeArg) -> Self {
        match mode {
            LossModeArg::Both => LossMode::Both,
            LossModeArg::Data => LossMode::Data,
            LossModeArg::Ack => LossMode::Ack,
        }
    }
}

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; stdout carries only the trace lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = NodeConfig::new(cli.local_port, cli.remote_port)
        .window_size(cli.window_size)
        .retransmit_timeout_ms(cli.timeout_ms)
        .loss(LossConfig {
            probability: cli.loss_rate,
            mode: cli.loss_mode.into(),
            seed: cli.seed,
        });

    // All validation happens before any socket is bound.
    if let Err(e) = config.validate() {
        eprintln!("{e}");
        eprintln!("Usage: sr-node <local-port> <remote-port> <window-size> <timeout-ms> <loss-rate>");
        std::process::exit(2);
    }

    let node = match SrNode::bind(config).await {
        Ok(node) => node,
        Err(e) => {
            eprintln!("failed to start node: {e}");
            std::process::exit(1);
        }
    };

    info!(addr = %node.local_addr(), "node listening");
    let (handle, mut delivered_rx, mut trace_rx) = node.split();

    // Trace printer and delivery logger.
    tokio::spawn(async move {
        loop {
            tokio::select! {
                line = trace_rx.recv() => match line {
                    Some(line) => println!("{line}"),
                    None => break,
                },
                payload = delivered_rx.recv() => match payload {
                    Some(payload) => {
                        debug!(data = %String::from_utf8_lossy(&payload), "delivered");
                    }
                    None => break,
                },
            }
        }
    });

    // Perpetual stdin command loop.
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Some(Command::Send(message)) => {
                if handle.send_message(message).await.is_err() {
                    break;
                }
            }
            None => eprintln!("unrecognized command, expected: send <message>"),
        }
    }
}
