// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the iron plotter
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against an embedded JSON schema.
//!
//! ## Configuration Structure
//!
//! - `device`: byte source of the acquisition flow (serial port, file, stdin)
//! - `transport`: channel between the acquisition and render flows
//! - `window`: rolling window length and gap detection threshold
//! - `render`: redraw cadence and frame sink
//! - `daemon`: co-located mode shutdown settings
//!
//! ## Usage
//!
//! ```no_run
//! use iron_plotter::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyUSB0".to_string()), // Serial port
//!     Some("10.0.0.2".to_string()),     // Address
//!     Some(3001),                       // Port
//!     None,                             // Secret
//!     None,                             // Sink
//! );
//!
//! println!("Device: {}", config.device.path);
//! ```

pub mod daemon;
pub mod device;
pub mod render;
pub mod transport;
pub mod utils;
pub mod window;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use daemon::DaemonConfig;
pub use device::DeviceConfig;
pub use render::RenderConfig;
pub use transport::TransportConfig;
pub use utils::{is_valid_ip_address, output_config_schema};
pub use window::WindowConfig;

use crate::visualization::SinkKind;

/// JSON schema every configuration file is validated against
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure
///
/// Every section falls back to its defaults when absent from the file, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Byte source of the acquisition flow
    #[serde(default)]
    pub device: DeviceConfig,

    /// Channel between the two flows, network settings included
    #[serde(default)]
    pub transport: TransportConfig,

    /// Rolling window of the live chart
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. A file that
    /// fails validation leaves a `.sample.yaml` with the defaults next to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // An empty document parses as null, which means "all defaults"
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = config.validate() {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Check the rules the JSON schema cannot express
    pub fn validate(&self) -> Result<()> {
        utils::validate_specific_rules(self)
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the configuration.
    ///
    /// # Parameters
    ///
    /// * `serial_port` - Device path (`-` for standard input)
    /// * `address` - Network address; the server binds it and the client
    ///   connects to it
    /// * `port` - TCP port of the transport
    /// * `secret` - Shared secret of the transport handshake
    /// * `sink` - Render sink of the client side
    pub fn apply_args(
        &mut self,
        serial_port: Option<String>,
        address: Option<String>,
        port: Option<u16>,
        secret: Option<String>,
        sink: Option<SinkKind>,
    ) {
        if let Some(serial_port) = serial_port {
            debug!("Overriding device path from command line: {}", serial_port);
            self.device.path = serial_port;
        }

        if let Some(address) = address {
            debug!("Overriding transport address from command line: {}", address);
            self.transport.bind_address = address.clone();
            self.transport.connect_address = address;
        }

        if let Some(port) = port {
            debug!("Overriding transport port from command line: {}", port);
            self.transport.port = port;
        }

        if let Some(secret) = secret {
            debug!("Overriding transport secret from command line");
            self.transport.secret = secret;
        }

        if let Some(sink) = sink {
            debug!("Overriding render sink from command line: {:?}", sink);
            self.render.sink = sink;
        }
    }
}
