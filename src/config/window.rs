// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Window configuration

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::visualization::{DEFAULT_GAP_THRESHOLD_MS, DEFAULT_WINDOW_SECS};

/// Rolling window and discontinuity detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// History kept on screen, in seconds
    pub length_secs: u64,

    /// Spacing between two samples, in milliseconds, from which the series
    /// is broken by a gap marker
    pub gap_threshold_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length_secs: DEFAULT_WINDOW_SECS,
            gap_threshold_ms: DEFAULT_GAP_THRESHOLD_MS,
        }
    }
}

impl WindowConfig {
    pub fn length(&self) -> TimeDelta {
        i64::try_from(self.length_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn gap_threshold(&self) -> TimeDelta {
        i64::try_from(self.gap_threshold_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX)
    }
}
