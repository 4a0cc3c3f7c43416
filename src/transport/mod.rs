// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sample transport
//!
//! Ordered, reliable delivery of [`Sample`]s from exactly one producer (the
//! acquisition flow) to exactly one consumer (the render flow).
//!
//! Two implementations share the [`SampleSender`] / [`SampleReceiver`] pair of
//! traits, so the rest of the application does not know how it is deployed:
//!
//! - [`local`]: co-located flows in one process, bounded in-memory queue.
//! - [`network`]: flows in separate processes or hosts, one TCP connection
//!   authenticated by a shared secret, samples framed as JSON lines.
//!
//! In both cases the receiving end buffers samples in the same bounded inbox,
//! so `poll`/`receive` behave identically.
//!
//! ## Usage
//!
//! ```no_run
//! use iron_plotter::transport::{local, SampleReceiver, SampleSender};
//! # use iron_plotter::acquisition::decode;
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut tx, mut rx) = local::channel(64);
//! tx.send(decode(b"230,650,120,128,15000\n")?).await?;
//! while rx.poll() {
//!     let sample = rx.receive().await?;
//!     println!("{} °C", sample.tip_temp_c);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::acquisition::Sample;

mod codec;
pub mod handshake;
mod inbox;
pub mod local;
pub mod network;

pub use local::{LocalReceiver, LocalSender};
pub use network::{NetworkListener, NetworkReceiver, NetworkSender};

/// Default shared secret, as used by the reference IronOS plotting tool
pub const DEFAULT_SECRET: &str = "IronOS";

/// Default number of samples buffered between the two flows
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Transport failures
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was closed locally or the link to the peer dropped
    #[error("channel closed")]
    ChannelClosed,

    /// The shared secret handshake failed
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame: {0}")]
    Frame(#[from] serde_json::Error),
}

/// Producer end of a transport channel
#[async_trait]
pub trait SampleSender: Send {
    /// Enqueue a sample for delivery
    ///
    /// Waits only while the transport's own buffer is full; fails with
    /// [`ChannelError::ChannelClosed`] once either end has gone away.
    async fn send(&mut self, sample: Sample) -> Result<(), ChannelError>;

    /// Release the channel; later sends fail with `ChannelClosed`
    async fn close(&mut self);
}

/// Consumer end of a transport channel
#[async_trait]
pub trait SampleReceiver: Send {
    /// Non-blocking readiness check
    ///
    /// Returns `true` when [`receive`](Self::receive) would complete without
    /// waiting: a sample is pending, or the channel has terminated and
    /// `receive` would report `ChannelClosed`.
    ///
    /// A `true` result therefore does not guarantee a sample: once the
    /// channel has terminated, `poll` keeps returning `true` and the next
    /// `receive` yields the error instead of blocking forever.
    fn poll(&mut self) -> bool;

    /// Dequeue the next sample in producer order, waiting for one if needed
    async fn receive(&mut self) -> Result<Sample, ChannelError>;

    /// Release the channel; later receives fail with `ChannelClosed`
    fn close(&mut self);
}
