// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Render daemon
//!
//! Drives the [`SeriesWindow`] from a fixed cadence timer, independently of
//! when samples arrive, and hands every frame to a [`RenderSink`].

use anyhow::Result;
use chrono::Utc;
use log::{debug, error, info};
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::sink::RenderSink;
use super::window::SeriesWindow;
use crate::transport::{ChannelError, SampleReceiver};

/// Default redraw period
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 200;

/// Why the render loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The shutdown future completed
    Shutdown,
    /// The acquisition side went away
    ChannelClosed,
}

/// Fixed cadence render loop owning the series window
pub struct RenderDaemon {
    window: SeriesWindow,
    sink: Box<dyn RenderSink>,
    refresh_interval: Duration,
    frames_rendered: u64,
}

impl RenderDaemon {
    /// Create a new render daemon
    pub fn new(window: SeriesWindow, sink: Box<dyn RenderSink>, refresh_interval: Duration) -> Self {
        Self {
            window,
            sink,
            refresh_interval,
            frames_rendered: 0,
        }
    }

    /// Number of frames handed to the sink so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// The window, for inspection after the loop ended
    pub fn window(&self) -> &SeriesWindow {
        &self.window
    }

    /// Tick until `shutdown` resolves or the channel terminates
    ///
    /// The receiver is closed before returning. A terminated channel ends the
    /// session after one last frame with everything received so far; it is
    /// not an error.
    pub async fn run<R, F>(&mut self, receiver: &mut R, shutdown: F) -> Result<RenderOutcome>
    where
        R: SampleReceiver + ?Sized,
        F: Future<Output = ()>,
    {
        info!(
            "Render loop started, refresh every {} ms",
            self.refresh_interval.as_millis()
        );
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Render loop shutting down");
                    break RenderOutcome::Shutdown;
                }
                _ = ticker.tick() => {
                    let now = Utc::now();
                    match self.window.tick(now, receiver).await {
                        Ok(frame) => {
                            self.render(&frame)?;
                        }
                        Err(ChannelError::ChannelClosed) => {
                            info!("Transport closed, live chart stops updating");
                            let frame = self.window.frame(now);
                            self.render(&frame)?;
                            break RenderOutcome::ChannelClosed;
                        }
                        Err(err) => {
                            error!("Transport failure: {}", err);
                            receiver.close();
                            return Err(err.into());
                        }
                    }
                }
            }
        };

        receiver.close();
        info!("Render loop stopped after {} frames", self.frames_rendered);
        Ok(outcome)
    }

    fn render(&mut self, frame: &super::window::RenderFrame) -> Result<()> {
        self.sink.render(frame)?;
        self.frames_rendered += 1;
        if self.frames_rendered % 50 == 0 {
            debug!(
                "Rendered {} frames, {} rows retained ({} gaps)",
                self.frames_rendered,
                self.window.len(),
                self.window.gap_count()
            );
        }
        Ok(())
    }
}
