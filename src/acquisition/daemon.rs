// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Acquisition daemon
//!
//! Reads the device byte stream line by line, decodes every line and sends
//! the resulting samples over a transport channel. A malformed line is logged
//! and skipped; it never stops the stream.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::decoder::decode;
use crate::transport::{ChannelError, SampleSender};

/// Longest line accepted from the device before it is split
pub const MAX_LINE_LEN: usize = 1024;

/// Counters kept by the acquisition loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStats {
    /// Lines read from the device, valid or not
    pub lines_read: u64,
    /// Samples handed to the transport
    pub samples_sent: u64,
    /// Lines rejected by the decoder
    pub malformed_lines: u64,
}

/// Why the acquisition loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// The byte source reached end of input
    EndOfInput,
    /// The consumer went away or the channel was closed
    ChannelClosed,
}

/// Device read loop: readline, decode, send
#[derive(Debug, Default)]
pub struct AcquisitionDaemon {
    stats: AcquisitionStats,
}

impl AcquisitionDaemon {
    /// Create a new acquisition daemon
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    /// Run until the device stops producing or the channel closes
    ///
    /// Device read errors are returned; a closed channel is a normal way
    /// for this flow to end.
    pub async fn run<R, S>(&mut self, mut reader: R, sender: &mut S) -> Result<AcquisitionOutcome>
    where
        R: AsyncBufRead + Unpin,
        S: SampleSender + ?Sized,
    {
        info!("Acquisition started");
        let mut line = Vec::with_capacity(64);

        let outcome = loop {
            line.clear();
            let read = (&mut reader)
                .take(MAX_LINE_LEN as u64)
                .read_until(b'\n', &mut line)
                .await
                .context("Failed to read from device")?;
            if read == 0 {
                info!("Device input ended");
                break AcquisitionOutcome::EndOfInput;
            }
            self.stats.lines_read += 1;

            if read == MAX_LINE_LEN && line.last() != Some(&b'\n') {
                self.stats.malformed_lines += 1;
                warn!(
                    "Received garbage data: line longer than {} bytes",
                    MAX_LINE_LEN
                );
                discard_rest_of_line(&mut reader)
                    .await
                    .context("Failed to read from device")?;
                continue;
            }

            let sample = match decode(&line) {
                Ok(sample) => sample,
                Err(err) => {
                    self.stats.malformed_lines += 1;
                    warn!("Received garbage data: {}", err);
                    continue;
                }
            };

            match sender.send(sample).await {
                Ok(()) => {
                    self.stats.samples_sent += 1;
                    if self.stats.samples_sent % 500 == 0 {
                        debug!(
                            "Acquisition: {} lines, {} samples, {} malformed",
                            self.stats.lines_read,
                            self.stats.samples_sent,
                            self.stats.malformed_lines
                        );
                    }
                }
                Err(ChannelError::ChannelClosed) => {
                    info!("Transport closed, stopping acquisition");
                    break AcquisitionOutcome::ChannelClosed;
                }
                Err(err) => return Err(err).context("Failed to send sample"),
            }
        };

        info!(
            "Acquisition stopped: {} samples sent, {} malformed lines",
            self.stats.samples_sent, self.stats.malformed_lines
        );
        Ok(outcome)
    }
}

/// Skip input up to and including the next newline, or to end of input
async fn discard_rest_of_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{local, SampleReceiver};

    #[tokio::test]
    async fn test_garbage_lines_are_skipped() {
        let input: &[u8] = b"230,650,120,128,15000\n\
            230,650,120,128\n\
            \xff\xfe\n\
            231,651,121,129,15001\n";
        let (mut tx, mut rx) = local::channel(16);

        let mut daemon = AcquisitionDaemon::new();
        let outcome = daemon.run(input, &mut tx).await.unwrap();

        assert_eq!(outcome, AcquisitionOutcome::EndOfInput);
        assert_eq!(
            daemon.stats(),
            AcquisitionStats {
                lines_read: 4,
                samples_sent: 2,
                malformed_lines: 2,
            }
        );
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 230);
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 231);
        assert!(!rx.poll());
    }

    #[tokio::test]
    async fn test_overlong_line_is_rejected_whole() {
        // The tail of the oversized line looks like a valid reading
        let mut input = vec![b'x'; MAX_LINE_LEN];
        input.extend_from_slice(b"1,2,3,4,5\n");
        input.extend(std::iter::repeat(b'y').take(3 * MAX_LINE_LEN));
        input.extend_from_slice(b",7,8,9,10\n");
        input.extend_from_slice(b"6,7,8,9,10\n");
        let (mut tx, mut rx) = local::channel(16);

        let mut daemon = AcquisitionDaemon::new();
        let outcome = daemon.run(&input[..], &mut tx).await.unwrap();

        assert_eq!(outcome, AcquisitionOutcome::EndOfInput);
        assert_eq!(
            daemon.stats(),
            AcquisitionStats {
                lines_read: 3,
                samples_sent: 1,
                malformed_lines: 2,
            }
        );
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 6);
        assert!(!rx.poll());
    }

    #[tokio::test]
    async fn test_line_of_maximum_length_is_decoded() {
        let mut input = b"230,650,120,128,".to_vec();
        let padding = MAX_LINE_LEN - input.len() - "15000\n".len();
        input.extend(std::iter::repeat(b' ').take(padding));
        input.extend_from_slice(b"15000\n");
        assert_eq!(input.len(), MAX_LINE_LEN);
        let (mut tx, mut rx) = local::channel(4);

        let mut daemon = AcquisitionDaemon::new();
        daemon.run(&input[..], &mut tx).await.unwrap();

        assert_eq!(daemon.stats().malformed_lines, 0);
        assert_eq!(rx.receive().await.unwrap().tip_raw_uv, 15000);
    }

    #[tokio::test]
    async fn test_malformed_only_input_delivers_nothing() {
        let (mut tx, mut rx) = local::channel(4);
        let mut daemon = AcquisitionDaemon::new();
        daemon
            .run(&b"230,650,120,128\n"[..], &mut tx)
            .await
            .unwrap();

        assert_eq!(daemon.stats().samples_sent, 0);
        assert_eq!(daemon.stats().malformed_lines, 1);
        assert!(!rx.poll());
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_decoded() {
        let (mut tx, mut rx) = local::channel(4);
        let mut daemon = AcquisitionDaemon::new();
        daemon
            .run(&b"100,200,300,40,5000"[..], &mut tx)
            .await
            .unwrap();

        assert_eq!(rx.receive().await.unwrap().tip_raw_uv, 5000);
    }

    #[tokio::test]
    async fn test_closed_channel_stops_loop() {
        let (mut tx, mut rx) = local::channel(4);
        rx.close();

        let mut daemon = AcquisitionDaemon::new();
        let outcome = daemon
            .run(&b"1,2,3,4,5\n6,7,8,9,10\n"[..], &mut tx)
            .await
            .unwrap();

        assert_eq!(outcome, AcquisitionOutcome::ChannelClosed);
        assert_eq!(daemon.stats().lines_read, 1);
        assert_eq!(daemon.stats().samples_sent, 0);
    }
}
