// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Iron plotter library
//!
//! Live telemetry plotting for IronOS soldering iron controllers. The
//! controller prints one comma separated reading per line on a serial port;
//! this crate decodes those lines, carries the samples from the reading flow
//! to the plotting flow (in process or over TCP), and keeps the last seconds
//! of history as chart ready series with gaps where data stopped.
//!
//! - [`acquisition`]: device byte sources, line decoding, read loop
//! - [`transport`]: co-located and networked sample channels
//! - [`visualization`]: windowed series buffer, render loop and sinks
//! - [`config`]: YAML configuration validated against a JSON schema
//! - [`daemon`]: wiring of the server, client and all-in-one modes

pub mod acquisition;
pub mod config;
pub mod daemon;
pub mod transport;
pub mod visualization;
