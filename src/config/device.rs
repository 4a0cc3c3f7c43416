// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device configuration
//!
//! Where the acquisition flow reads the controller's telemetry lines from.

use serde::{Deserialize, Serialize};

/// Byte source of the acquisition flow
///
/// `path` is a serial device node, a capture file to replay, or `-` for
/// standard input. `baud_rate` only matters for serial devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port, capture file or `-`
    pub path: String,

    /// Line speed of the serial port. IronOS debug output runs at 2 Mbaud.
    pub baud_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyAMA0".to_string(),
            baud_rate: 2_000_000,
        }
    }
}
