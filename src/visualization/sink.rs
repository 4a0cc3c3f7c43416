// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Render sinks
//!
//! A sink receives one [`RenderFrame`] per refresh tick and draws it. The
//! window logic makes no assumption about the drawing technology.

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

use super::window::{Metric, RenderFrame};

/// Consumer of render frames
pub trait RenderSink: Send {
    /// Draw one frame
    fn render(&mut self, frame: &RenderFrame) -> Result<()>;
}

/// Available sink implementations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Console summary through the logger
    #[default]
    Log,
    /// One JSON document per frame on standard output
    Json,
}

/// Build the sink selected on the command line or in the configuration
pub fn create_sink(kind: SinkKind) -> Box<dyn RenderSink> {
    match kind {
        SinkKind::Log => Box::new(LogSink::new()),
        SinkKind::Json => Box::new(JsonLinesSink::new(std::io::stdout())),
    }
}

/// Logs the latest value of every series once per frame
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// One line summary of a frame
    pub fn summarize(frame: &RenderFrame) -> String {
        if frame.is_empty() {
            return format!(
                "[{} .. {}] no data",
                frame.start.format("%H:%M:%S"),
                frame.end.format("%H:%M:%S")
            );
        }

        let mut line = format!(
            "[{} .. {}] {} points",
            frame.start.format("%H:%M:%S"),
            frame.end.format("%H:%M:%S"),
            frame.points(Metric::TipTemperature).len()
        );
        for metric in Metric::ALL {
            match frame.latest(metric) {
                Some(value) => {
                    let _ = write!(line, " | {} {:.1}{}", metric.label(), value, metric.unit());
                }
                None => {
                    let _ = write!(line, " | {} -", metric.label());
                }
            }
        }
        line
    }
}

impl RenderSink for LogSink {
    fn render(&mut self, frame: &RenderFrame) -> Result<()> {
        self.frames += 1;
        info!("Frame {}: {}", self.frames, Self::summarize(frame));
        Ok(())
    }
}

/// Writes each frame as one JSON line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RenderSink for JsonLinesSink<W> {
    fn render(&mut self, frame: &RenderFrame) -> Result<()> {
        serde_json::to_writer(&mut self.writer, frame).context("Failed to serialize frame")?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .context("Failed to write frame")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::decode_at;
    use crate::visualization::window::SeriesWindow;
    use chrono::{TimeZone, Utc};

    fn frame_with_gap() -> RenderFrame {
        let mut window = SeriesWindow::default();
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        window.push(&decode_at(b"230,650,120,128,15000", t0).unwrap());
        let t2 = t0 + chrono::TimeDelta::seconds(2);
        window.push(&decode_at(b"240,660,130,140,15500", t2).unwrap());
        window.frame(t2)
    }

    #[test]
    fn test_json_sink_writes_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let frame = frame_with_gap();
        sink.render(&frame).unwrap();
        sink.render(&frame).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let decoded: RenderFrame = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(decoded, frame);

        // Gap markers are explicit nulls, not zeros
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert!(value["series"][0]["points"][1]["value"].is_null());
        assert_eq!(value["series"][0]["metric"], "tip_temperature");
    }

    #[test]
    fn test_summary_reports_latest_values() {
        let summary = LogSink::summarize(&frame_with_gap());
        assert!(summary.contains("3 points"), "{summary}");
        assert!(summary.contains("Tip 240.0°C"), "{summary}");
        assert!(summary.contains("Power 13.0W"), "{summary}");
    }

    #[test]
    fn test_summary_of_empty_frame() {
        let window = SeriesWindow::default();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(LogSink::summarize(&window.frame(now)).ends_with("no data"));
    }
}
