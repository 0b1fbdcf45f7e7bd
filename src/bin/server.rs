//! Publish the ping service and serve it until a line (or end of input)
//! arrives on stdin.
//!
//! ```bash
//! pingrpc-server --registry-port 1099 --binding-name server
//! pingrpc-server --config server.json
//! ```

use clap::Parser;
use pingrpc::{console, logging, Ponger, RegistryMode, ServerConfig, ServerEndpoint};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pingrpc-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry host (overrides the config file)
    #[arg(long)]
    registry_host: Option<String>,

    /// Registry port (overrides the config file)
    #[arg(long)]
    registry_port: Option<u16>,

    /// Name to bind the endpoint under (overrides the config file)
    #[arg(long)]
    binding_name: Option<String>,

    /// Join an already running registry instead of creating one
    #[arg(long)]
    locate_registry: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level).map_err(|e| e.to_string())?;

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {path:?}");
            ServerConfig::from_file(path)?
        }
        None => ServerConfig::default(),
    };
    if let Some(host) = args.registry_host {
        config.registry.host = host;
    }
    if let Some(port) = args.registry_port {
        config.registry.port = port;
    }
    if let Some(name) = args.binding_name {
        config.binding_name = name;
    }
    if args.locate_registry {
        config.registry_mode = RegistryMode::Locate;
    }
    config.validate()?;

    let mut server = ServerEndpoint::start(&config, Ponger).await?;

    info!(
        "Serving `{}` at {}",
        server.binding_name(),
        server.endpoint()
    );
    println!("Server is up! Hit <ENTER> to exit!");
    server
        .serve(console::wait_for_stop(BufReader::new(tokio::io::stdin())))
        .await;

    // The registry, if this process created it, goes away with the process.
    drop(server.stop().await);
    info!("Server stopped");
    Ok(())
}
