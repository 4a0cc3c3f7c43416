// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Live chart module
//!
//! Holds the rolling time window of samples, turns it into render frames at a
//! fixed cadence and hands those frames to a pluggable sink.
//!
//! - [`window`]: the windowed series buffer (eviction, gap markers, series)
//! - [`renderer`]: the fixed cadence render loop
//! - [`sink`]: frame consumers (log summary, JSON lines)

pub mod renderer;
pub mod sink;
pub mod window;

pub use renderer::{RenderDaemon, RenderOutcome, DEFAULT_REFRESH_INTERVAL_MS};
pub use sink::{create_sink, JsonLinesSink, LogSink, RenderSink, SinkKind};
pub use window::{
    Axis, Metric, RenderFrame, Series, SeriesPoint, SeriesWindow, DEFAULT_GAP_THRESHOLD_MS,
    DEFAULT_WINDOW_SECS,
};
