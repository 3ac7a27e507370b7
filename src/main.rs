//! Command-line entry point for the IPK24-CHAT client.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::net::lookup_host;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use ipk24chat::client::{
    ClientConfig, ExitOutcome, run_datagram, run_stream, spawn_console_reader,
    spawn_interrupt_listener,
};
use ipk24chat::core::{
    CONSOLE_CHANNEL_CAPACITY, ClientError, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_MAX_RETRANSMISSIONS,
    DEFAULT_SERVER_PORT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Transport {
    /// Text grammar over TCP.
    Tcp,
    /// Binary grammar over UDP with confirmations.
    Udp,
}

/// IPK24-CHAT protocol client.
#[derive(Debug, Parser)]
#[command(name = "ipk24chat-client", version)]
struct Cli {
    /// Transport protocol to use.
    #[arg(short = 't', value_enum)]
    transport: Transport,

    /// Server host name or IP address.
    #[arg(short = 's')]
    server: String,

    /// Server port.
    #[arg(short = 'p', default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,

    /// UDP confirmation timeout in milliseconds.
    #[arg(short = 'd', default_value_t = DEFAULT_CONFIRM_TIMEOUT.as_millis() as u64)]
    timeout: u64,

    /// Maximum number of UDP retransmissions.
    #[arg(short = 'r', default_value_t = DEFAULT_MAX_RETRANSMISSIONS)]
    retransmissions: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(ExitOutcome::Graceful) => ExitCode::SUCCESS,
        Ok(ExitOutcome::Fatal) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("ERR: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitOutcome, ClientError> {
    let config = ClientConfig {
        server_addr: resolve(&cli.server, cli.port).await?,
        confirm_timeout: Duration::from_millis(cli.timeout),
        max_retransmissions: cli.retransmissions,
    };

    let (tx, rx) = mpsc::channel(CONSOLE_CHANNEL_CAPACITY);
    spawn_console_reader(tx.clone());
    spawn_interrupt_listener(tx);

    match cli.transport {
        Transport::Tcp => run_stream(&config, rx).await,
        Transport::Udp => run_datagram(&config, rx).await,
    }
}

/// Resolve the server address, preferring IPv4.
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ClientError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|_| ClientError::Resolve(host.to_string()))?
        .collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ClientError::Resolve(host.to_string()))
}
