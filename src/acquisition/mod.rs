// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device acquisition module
//!
//! This module handles the acquisition side of the pipeline: opening the
//! byte source attached to the iron controller, splitting it into lines,
//! decoding each line into a [`Sample`] and handing samples to a transport
//! channel.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use tokio::io::{AsyncBufRead, BufReader};

pub mod daemon;
pub mod decoder;
mod serial;

pub use daemon::{AcquisitionDaemon, AcquisitionOutcome, AcquisitionStats};
pub use decoder::{decode, decode_at, DecodeError, MalformedCause, Sample, FIELD_COUNT};
pub use serial::open_serial_device;

use crate::config::DeviceConfig;

/// Path that selects standard input instead of a device
pub const STDIN_PATH: &str = "-";

/// Line oriented byte source feeding the acquisition daemon
pub type DeviceReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Open the byte source described by the device configuration
///
/// - `-` reads standard input (pipe a capture or another tool into the plotter)
/// - a regular file is replayed as fast as it can be read
/// - anything else is opened as a serial port at the configured baud rate
pub async fn get_device_reader(config: &DeviceConfig) -> Result<DeviceReader> {
    if config.path == STDIN_PATH {
        info!("Reading device lines from standard input");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let path = Path::new(&config.path);
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);

    if is_file {
        info!("Replaying device capture from {}", path.display());
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open capture file {}", path.display()))?;
        return Ok(Box::new(BufReader::new(file)));
    }

    Ok(Box::new(open_serial_device(&config.path, config.baud_rate)?))
}
