// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Daemon configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process level settings of the co-located mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// How long the acquisition task may keep running after the render loop
    /// ended before it is aborted, in milliseconds
    pub acquisition_grace_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            acquisition_grace_ms: 3000,
        }
    }
}

impl DaemonConfig {
    pub fn acquisition_grace(&self) -> Duration {
        Duration::from_millis(self.acquisition_grace_ms)
    }
}
