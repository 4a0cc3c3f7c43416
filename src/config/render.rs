// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Render loop configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::visualization::{SinkKind, DEFAULT_REFRESH_INTERVAL_MS};

/// Redraw cadence and frame destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Period of the render timer in milliseconds
    pub refresh_interval_ms: u64,

    /// Where frames go: `log` or `json`
    pub sink: SinkKind,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            sink: SinkKind::default(),
        }
    }
}

impl RenderConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
