//! # starbridge CLI
//!
//! Command-line interface for the receipt printer bridge.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP RPC server
//! starbridge serve --listen 0.0.0.0:8080
//!
//! # Find printers (LAN hosts must be listed)
//! starbridge --lan-host 192.168.1.50 search
//!
//! # Query status, print, pulse the drawer
//! starbridge status lan 192.168.1.50
//! starbridge print lan 192.168.1.50 "Hello\n"
//! starbridge print-commands bluetooth 00:11:62:AA:BB:CC job.json
//! starbridge drawer lan 192.168.1.50
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use starbridge::{
    config::{BridgeConfig, ConfigError},
    error::StarbridgeError,
    server,
    transport::{ConnectionDescriptor, TransportClass},
};

/// starbridge - Star receipt printer bridge
#[derive(Parser, Debug)]
#[command(name = "starbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "STARBRIDGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host to probe during LAN discovery (repeatable)
    #[arg(long = "lan-host", global = true, value_name = "HOST")]
    lan_hosts: Vec<String>,

    /// Bound each device step of print, status and drawer calls
    #[arg(long, global = true, value_name = "MS")]
    operation_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Target {
    /// Transport class: lan, bluetooth, bluetoothle or usb
    #[arg(value_parser = parse_class)]
    interface: TransportClass,

    /// Host[:port] for LAN, MAC address or device path for Bluetooth
    identifier: String,
}

impl Target {
    fn descriptor(&self) -> Result<ConnectionDescriptor, CliError> {
        ConnectionDescriptor::new(self.interface, self.identifier.as_str()).ok_or_else(|| {
            StarbridgeError::InvalidArgument("identifier must not be empty".into()).into()
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP RPC server
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Search for printers on LAN, Bluetooth and USB
    Search {
        /// Scan duration in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Print the normalized printer status as JSON
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Print a line of text followed by a partial cut
    Print {
        #[command(flatten)]
        target: Target,

        text: String,
    },

    /// Print a JSON array of command maps from a file
    PrintCommands {
        #[command(flatten)]
        target: Target,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Pulse the cash drawer
    Drawer {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}: {}", .0.kind().code(), .0.message())]
    Operation(#[from] StarbridgeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_class(name: &str) -> Result<TransportClass, String> {
    TransportClass::from_name(name).ok_or_else(|| format!("unknown transport class '{}'", name))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,starbridge=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };
    if !cli.lan_hosts.is_empty() {
        config.lan_hosts = cli.lan_hosts.clone();
    }
    if cli.operation_timeout_ms.is_some() {
        config.operation_timeout_ms = cli.operation_timeout_ms;
    }

    let service = Arc::new(config.service());

    match cli.command {
        Commands::Serve { listen } => {
            let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            server::serve(&addr, service).await?;
        }
        Commands::Search { timeout_ms } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.default_search_timeout());
            let printers = service.search_printers(timeout).await?;
            println!("{}", serde_json::to_string_pretty(&printers)?);
        }
        Commands::Status { target } => {
            let status = service.get_status(&target.descriptor()?).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Print { target, text } => {
            service.print(&target.descriptor()?, &text).await?;
            println!("Printed successfully!");
        }
        Commands::PrintCommands { target, file } => {
            let data = std::fs::read_to_string(&file)?;
            let commands: Vec<Value> = serde_json::from_str(&data)?;
            service
                .print_commands(&target.descriptor()?, &commands)
                .await?;
            println!("Printed {} commands", commands.len());
        }
        Commands::Drawer { target } => {
            service.open_drawer(&target.descriptor()?).await?;
            println!("Drawer opened");
        }
    }

    Ok(())
}
