// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./iron_plotter --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Check if a string is a plausible DNS host name
pub fn is_valid_hostname(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 253
        && name.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// The same checks run for configurations built in code, which never went
/// through the schema.
///
/// # Validation Rules
///
/// - **Device**: the path is not empty and the baud rate is not zero
/// - **Addresses**: the bind address is an IP address, the connect address
///   is an IP address or a host name
/// - **Transport**: the port is not zero, the secret is not empty and the
///   queue holds at least one sample
/// - **Window**: the window and the gap threshold are not zero, and a gap
///   fits inside the window
/// - **Render**: the refresh interval is not zero
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.device.path.trim().is_empty() {
        anyhow::bail!("Device path must not be empty");
    }
    if config.device.baud_rate == 0 {
        anyhow::bail!("Invalid baud rate: 0");
    }

    let transport = &config.transport;
    if !is_valid_ip_address(&transport.bind_address) {
        anyhow::bail!("Invalid bind address: {}", transport.bind_address);
    }
    if !is_valid_ip_address(&transport.connect_address)
        && !is_valid_hostname(&transport.connect_address)
    {
        anyhow::bail!("Invalid connect address: {}", transport.connect_address);
    }
    if transport.port == 0 {
        anyhow::bail!("Invalid port number: {}", transport.port);
    }
    if transport.secret.is_empty() {
        anyhow::bail!("Transport secret must not be empty");
    }
    if transport.queue_capacity == 0 {
        anyhow::bail!("Transport queue capacity must be at least 1");
    }

    let window = &config.window;
    if window.length_secs == 0 {
        anyhow::bail!("Window length must be at least one second");
    }
    if window.gap_threshold_ms == 0 {
        anyhow::bail!("Gap threshold must be at least one millisecond");
    }
    if window.gap_threshold() >= window.length() {
        anyhow::bail!(
            "Gap threshold ({} ms) must be shorter than the window ({} s)",
            window.gap_threshold_ms,
            window.length_secs
        );
    }

    if config.render.refresh_interval_ms == 0 {
        anyhow::bail!("Refresh interval must be at least one millisecond");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses() {
        assert!(is_valid_ip_address("0.0.0.0"));
        assert!(is_valid_ip_address("::1"));
        assert!(is_valid_ip_address("localhost"));
        assert!(!is_valid_ip_address("iron.local"));

        assert!(is_valid_hostname("iron.local"));
        assert!(is_valid_hostname("pi-4"));
        assert!(!is_valid_hostname("-pi"));
        assert!(!is_valid_hostname("bad host"));
        assert!(!is_valid_hostname(""));
    }

    #[test]
    fn test_default_config_passes() {
        validate_specific_rules(&Config::default()).unwrap();
    }

    #[test]
    fn test_gap_must_fit_in_window() {
        let mut config = Config::default();
        config.window.length_secs = 1;
        config.window.gap_threshold_ms = 1000;
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(err.to_string().contains("Gap threshold"));
    }

    #[test]
    fn test_client_may_dial_a_hostname_but_server_binds_an_ip() {
        let mut config = Config::default();
        config.transport.connect_address = "iron.local".to_string();
        validate_specific_rules(&config).unwrap();

        config.transport.bind_address = "iron.local".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }
}
