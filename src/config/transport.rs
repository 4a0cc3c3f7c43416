// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Transport configuration
//!
//! Settings of the channel between the acquisition and render flows. The
//! network settings are only used when the flows run in separate processes.

use serde::{Deserialize, Serialize};

use crate::transport::{DEFAULT_QUEUE_CAPACITY, DEFAULT_SECRET};

/// Settings for the sample transport channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Address the server listens on
    ///
    /// Default is "0.0.0.0" (every IPv4 interface).
    pub bind_address: String,

    /// Address or host name the client connects to
    ///
    /// Default is "127.0.0.1".
    pub connect_address: String,

    /// TCP port shared by server and client. Default is 3000.
    pub port: u16,

    /// Shared secret both ends prove knowledge of during the handshake
    pub secret: String,

    /// Number of samples buffered on the receiving end
    pub queue_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            connect_address: "127.0.0.1".to_string(),
            port: 3000,
            secret: DEFAULT_SECRET.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl TransportConfig {
    /// `address:port` the server binds
    pub fn bind_endpoint(&self) -> String {
        endpoint(&self.bind_address, self.port)
    }

    /// `address:port` the client dials
    pub fn connect_endpoint(&self) -> String {
        endpoint(&self.connect_address, self.port)
    }
}

fn endpoint(address: &str, port: u16) -> String {
    // Bare IPv6 literals need brackets to carry a port
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]:{}", address, port)
    } else {
        format!("{}:{}", address, port)
    }
}
