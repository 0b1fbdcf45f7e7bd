//! Resolve the ping service by name and call it for every `!ping` typed on
//! stdin, until `!stop` or end of input.

use clap::Parser;
use pingrpc::{console, logging, Client, ClientConfig};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pingrpc-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name sent with every ping (overrides the config file)
    #[arg(short, long)]
    name: Option<String>,

    /// Registry host (overrides the config file)
    #[arg(long)]
    registry_host: Option<String>,

    /// Registry port (overrides the config file)
    #[arg(long)]
    registry_port: Option<u16>,

    /// Name the server is bound under (overrides the config file)
    #[arg(long)]
    binding_name: Option<String>,

    /// Give up on a call after this many milliseconds (default: wait forever)
    #[arg(long)]
    call_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level).map_err(|e| e.to_string())?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {path:?}");
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    };
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(host) = args.registry_host {
        config.registry.host = host;
    }
    if let Some(port) = args.registry_port {
        config.registry.port = port;
    }
    if let Some(binding_name) = args.binding_name {
        config.binding_name = binding_name;
    }
    if args.call_timeout_ms.is_some() {
        config.call_timeout_ms = args.call_timeout_ms;
    }
    config.validate()?;

    let client = Client::connect(&config.registry, &config.binding_name)
        .await?
        .with_call_timeout(config.call_timeout());

    console::run_client(
        &client,
        &config.name,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}
