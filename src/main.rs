// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the IronOS telemetry plotter
use anyhow::Result;
use clap::Parser;
use iron_plotter::config::{self, Config};
use iron_plotter::daemon::{Daemon, Mode};
use iron_plotter::visualization::SinkKind;
use log::{error, info};
use std::path::PathBuf;
use tokio::signal;

/// Live plot of IronOS soldering iron telemetry
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Action: `server` reads the serial port, `client` plots, `all` does both
    #[arg(value_enum, default_value_t = Mode::All)]
    command: Mode,

    /// Serial port to read, only used by `server` and `all` (`-` for stdin).
    /// Default: /dev/ttyAMA0
    serial_port: Option<String>,

    /// Address to bind (server, default 0.0.0.0) or connect to (client,
    /// default 127.0.0.1)
    #[arg(long)]
    addr: Option<String>,

    /// Port to bind or connect to. Default: 3000
    #[arg(long)]
    port: Option<u16>,

    /// Shared secret of the server/client handshake
    #[arg(long)]
    secret: Option<String>,

    /// Where rendered frames go
    #[arg(long, value_enum)]
    sink: Option<SinkKind>,

    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    // Without --config the built-in defaults apply and nothing is written
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    config.apply_args(
        args.serial_port.clone(),
        args.addr.clone(),
        args.port,
        args.secret.clone(),
        args.sink,
    );
    config.validate()?;

    let mut daemon = Daemon::new(config);
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(err) => {
                error!("Error waiting for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    daemon.launch(args.command, shutdown).await?;
    info!("Bye");
    Ok(())
}
