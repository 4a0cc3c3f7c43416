// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Co-located transport
//!
//! Both flows live in the same process; samples travel through a bounded
//! in-memory queue without any authentication. A full queue makes `send`
//! wait, which throttles the device read loop.

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;

use super::inbox::Inbox;
use super::{ChannelError, SampleReceiver, SampleSender};
use crate::acquisition::Sample;

/// Create a connected sender/receiver pair buffering up to `capacity` samples
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn channel(capacity: usize) -> (LocalSender, LocalReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (
        LocalSender {
            sender: Some(sender),
        },
        LocalReceiver {
            inbox: Inbox::new(receiver),
        },
    )
}

/// Producer end of a [`channel`]
#[derive(Debug)]
pub struct LocalSender {
    sender: Option<mpsc::Sender<Sample>>,
}

#[async_trait]
impl SampleSender for LocalSender {
    async fn send(&mut self, sample: Sample) -> Result<(), ChannelError> {
        let sender = self.sender.as_ref().ok_or(ChannelError::ChannelClosed)?;
        sender
            .send(sample)
            .await
            .map_err(|_| ChannelError::ChannelClosed)
    }

    async fn close(&mut self) {
        if self.sender.take().is_some() {
            debug!("Local channel sender closed");
        }
    }
}

/// Consumer end of a [`channel`]
pub struct LocalReceiver {
    inbox: Inbox,
}

#[async_trait]
impl SampleReceiver for LocalReceiver {
    fn poll(&mut self) -> bool {
        self.inbox.poll()
    }

    async fn receive(&mut self) -> Result<Sample, ChannelError> {
        self.inbox.receive().await
    }

    fn close(&mut self) {
        debug!("Local channel receiver closed");
        self.inbox.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::decode_at;
    use chrono::{TimeZone, Utc};

    fn sample(tip: i32) -> Sample {
        let line = format!("{tip},650,120,128,15000");
        decode_at(line.as_bytes(), Utc.timestamp_opt(1_700_000_000 + tip as i64, 0).unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (mut tx, mut rx) = channel(16);
        for tip in 0..10 {
            tx.send(sample(tip)).await.unwrap();
        }

        for tip in 0..10 {
            assert!(rx.poll());
            assert_eq!(rx.receive().await.unwrap(), sample(tip));
        }
        assert!(!rx.poll());
    }

    #[tokio::test]
    async fn test_poll_does_not_consume() {
        let (mut tx, mut rx) = channel(4);
        tx.send(sample(1)).await.unwrap();

        assert!(rx.poll());
        assert!(rx.poll());
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 1);
        assert!(!rx.poll());
    }

    #[tokio::test]
    async fn test_sender_close_drains_then_reports_closed() {
        let (mut tx, mut rx) = channel(4);
        tx.send(sample(1)).await.unwrap();
        tx.close().await;

        assert!(matches!(
            tx.send(sample(2)).await,
            Err(ChannelError::ChannelClosed)
        ));
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 1);
        assert!(rx.poll(), "terminated channel must not block receive");
        assert!(matches!(
            rx.receive().await,
            Err(ChannelError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_receiver_close_stops_producer() {
        let (mut tx, mut rx) = channel(4);
        tx.send(sample(1)).await.unwrap();
        rx.close();

        assert!(matches!(
            rx.receive().await,
            Err(ChannelError::ChannelClosed)
        ));
        assert!(matches!(
            tx.send(sample(2)).await,
            Err(ChannelError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let (mut tx, mut rx) = channel(1);
        tx.send(sample(1)).await.unwrap();

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(50), tx.send(sample(2))).await;
        assert!(blocked.is_err(), "send should wait while the queue is full");

        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 1);
        tx.send(sample(3)).await.unwrap();
        assert_eq!(rx.receive().await.unwrap().tip_temp_c, 3);
    }
}
