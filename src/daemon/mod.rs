// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! Wires the acquisition and render flows together for one of the three
//! deployment modes:
//!
//! * **server**: device to network, one client at a time
//! * **client**: network to live chart
//! * **all**: device to live chart inside one process
//!
//! ## Usage
//!
//! ```no_run
//! use iron_plotter::{config::Config, daemon::{Daemon, Mode}};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new(config);
//!     daemon
//!         .launch(Mode::All, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::{Daemon, Mode};
