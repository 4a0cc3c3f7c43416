// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Windowed series buffer
//!
//! Keeps the last few seconds (30 by default) of the five plotted metrics on
//! one shared time axis and turns them into a [`RenderFrame`] on every
//! refresh tick.
//!
//! ## Gap markers
//!
//! When two consecutive real samples are at least `gap_threshold` apart
//! (1 second by default), a "no data" row is inserted just before the second
//! one, stamped with its timestamp. A line plot breaks at that point instead
//! of drawing a straight segment across the pause. Spacing is always measured
//! between real samples, so a long pause yields exactly one marker.
//!
//! ## Invariants
//!
//! - All five metrics share one row per timestamp and are evicted together,
//!   so their sequences always have the same length.
//! - Rows are ordered by time. A sample stamped earlier than the newest row
//!   (wall clock stepped back) is placed at the newest row's time.
//! - A gap row is always immediately followed by a real row with the same
//!   timestamp, so eviction never leaves a dangling marker.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::acquisition::Sample;
use crate::config::WindowConfig;
use crate::transport::{ChannelError, SampleReceiver};

/// Default retained history
pub const DEFAULT_WINDOW_SECS: u64 = 30;

/// Default spacing between real samples that triggers a gap marker
pub const DEFAULT_GAP_THRESHOLD_MS: u64 = 1000;

/// Chart axis a metric is drawn against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Upper chart, left axis (°C)
    Temperature,
    /// Upper chart, right axis (µV)
    ThermocoupleRaw,
    /// Lower chart, left axis (W)
    Power,
    /// Lower chart, right axis (duty 0-255)
    Pwm,
}

impl Axis {
    /// Whether the axis is drawn on the right hand side of its chart
    pub fn is_secondary(&self) -> bool {
        matches!(self, Axis::ThermocoupleRaw | Axis::Pwm)
    }
}

/// One plotted series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TipTemperature,
    HandleTemperature,
    TipRaw,
    Power,
    Pwm,
}

impl Metric {
    /// Every metric, in row order
    pub const ALL: [Metric; 5] = [
        Metric::TipTemperature,
        Metric::HandleTemperature,
        Metric::TipRaw,
        Metric::Power,
        Metric::Pwm,
    ];

    fn index(self) -> usize {
        match self {
            Metric::TipTemperature => 0,
            Metric::HandleTemperature => 1,
            Metric::TipRaw => 2,
            Metric::Power => 3,
            Metric::Pwm => 4,
        }
    }

    /// Legend label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::TipTemperature => "Tip",
            Metric::HandleTemperature => "Handle",
            Metric::TipRaw => "Tip Raw",
            Metric::Power => "Power",
            Metric::Pwm => "PWM",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::TipTemperature | Metric::HandleTemperature => "°C",
            Metric::TipRaw => "µV",
            Metric::Power => "W",
            Metric::Pwm => "",
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Metric::TipTemperature | Metric::HandleTemperature => Axis::Temperature,
            Metric::TipRaw => Axis::ThermocoupleRaw,
            Metric::Power => Axis::Power,
            Metric::Pwm => Axis::Pwm,
        }
    }

    /// Plotted value of this metric for a sample
    pub fn value_of(&self, sample: &Sample) -> f64 {
        match self {
            Metric::TipTemperature => f64::from(sample.tip_temp_c),
            Metric::HandleTemperature => sample.handle_temp_c,
            Metric::TipRaw => f64::from(sample.tip_raw_uv),
            Metric::Power => sample.power_w,
            Metric::Pwm => f64::from(sample.pwm_duty),
        }
    }
}

/// One plotted datum; `value` is `None` for a gap marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn is_gap(&self) -> bool {
        self.value.is_none()
    }
}

/// Time-ordered points of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub metric: Metric,
    pub points: Vec<SeriesPoint>,
}

/// Snapshot handed to the render sink on every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Left edge of the time axis (`end - window length`)
    pub start: DateTime<Utc>,
    /// Right edge of the time axis (tick time)
    pub end: DateTime<Utc>,
    /// One entry per metric, in [`Metric::ALL`] order
    pub series: Vec<Series>,
}

impl RenderFrame {
    /// True when no point is retained
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|series| series.points.is_empty())
    }

    /// Points of one metric
    pub fn points(&self, metric: Metric) -> &[SeriesPoint] {
        self.series
            .iter()
            .find(|series| series.metric == metric)
            .map(|series| series.points.as_slice())
            .unwrap_or(&[])
    }

    /// Most recent real value of one metric
    pub fn latest(&self, metric: Metric) -> Option<f64> {
        self.points(metric).iter().rev().find_map(|point| point.value)
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    timestamp: DateTime<Utc>,
    /// `None` marks a gap
    values: Option<[f64; 5]>,
}

/// Sliding time window over the sample stream
///
/// Owned by the render flow only; it is never shared.
#[derive(Debug, Clone)]
pub struct SeriesWindow {
    rows: VecDeque<Row>,
    last_real: Option<DateTime<Utc>>,
    length: TimeDelta,
    gap_threshold: TimeDelta,
}

impl Default for SeriesWindow {
    fn default() -> Self {
        Self::new(
            TimeDelta::seconds(DEFAULT_WINDOW_SECS as i64),
            TimeDelta::milliseconds(DEFAULT_GAP_THRESHOLD_MS as i64),
        )
    }
}

impl SeriesWindow {
    /// Create an empty window
    pub fn new(length: TimeDelta, gap_threshold: TimeDelta) -> Self {
        Self {
            rows: VecDeque::new(),
            last_real: None,
            length,
            gap_threshold,
        }
    }

    /// Create an empty window from the `window` configuration section
    pub fn from_config(config: &WindowConfig) -> Self {
        Self::new(config.length(), config.gap_threshold())
    }

    /// Retained history length
    pub fn length(&self) -> TimeDelta {
        self.length
    }

    /// Number of rows (real samples and gap markers) currently retained
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of gap markers currently retained
    pub fn gap_count(&self) -> usize {
        self.rows.iter().filter(|row| row.values.is_none()).count()
    }

    /// Drop every row older than `now - length`
    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = self.start_of(now);
        while self
            .rows
            .front()
            .is_some_and(|row| row.timestamp < cutoff)
        {
            self.rows.pop_front();
        }
        if self.rows.is_empty() {
            self.last_real = None;
        }
    }

    /// Append a sample, preceded by a gap marker after a pause
    pub fn push(&mut self, sample: &Sample) {
        let timestamp = match self.rows.back() {
            Some(newest) if sample.timestamp < newest.timestamp => newest.timestamp,
            _ => sample.timestamp,
        };

        if let Some(last_real) = self.last_real {
            if timestamp - last_real >= self.gap_threshold {
                self.rows.push_back(Row {
                    timestamp,
                    values: None,
                });
            }
        }

        let mut values = [0.0; 5];
        for metric in Metric::ALL {
            values[metric.index()] = metric.value_of(sample);
        }
        self.rows.push_back(Row {
            timestamp,
            values: Some(values),
        });
        self.last_real = Some(timestamp);
    }

    /// Snapshot the window for a tick at `now`
    pub fn frame(&self, now: DateTime<Utc>) -> RenderFrame {
        let series = Metric::ALL
            .iter()
            .map(|&metric| Series {
                metric,
                points: self
                    .rows
                    .iter()
                    .map(|row| SeriesPoint {
                        timestamp: row.timestamp,
                        value: row.values.map(|values| values[metric.index()]),
                    })
                    .collect(),
            })
            .collect();

        RenderFrame {
            start: self.start_of(now),
            end: now,
            series,
        }
    }

    fn start_of(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.length)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// One refresh step: evict, drain the channel without blocking, snapshot
    ///
    /// If the channel terminates during the drain, the samples received so
    /// far stay in the window and the error is returned; the caller decides
    /// whether to render a last frame with [`frame`](Self::frame).
    pub async fn tick<R>(
        &mut self,
        now: DateTime<Utc>,
        receiver: &mut R,
    ) -> Result<RenderFrame, ChannelError>
    where
        R: SampleReceiver + ?Sized,
    {
        self.evict(now);

        while receiver.poll() {
            let sample = receiver.receive().await?;
            self.push(&sample);
        }

        Ok(self.frame(now))
    }
}
