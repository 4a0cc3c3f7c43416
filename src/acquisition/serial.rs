// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial port byte source

use anyhow::{Context, Result};
use log::info;
use tokio::io::BufReader;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Open the serial port the iron controller is attached to
///
/// The port is opened without read timeout: the controller sets the pace and
/// the read loop simply waits for the next line.
pub fn open_serial_device(path: &str, baud_rate: u32) -> Result<BufReader<SerialStream>> {
    info!("Opening serial port {} at {} baud", path, baud_rate);

    let port = tokio_serial::new(path, baud_rate)
        .open_native_async()
        .with_context(|| format!("Failed to open serial port {}", path))?;

    info!("Serial port {} opened", path);
    Ok(BufReader::new(port))
}
