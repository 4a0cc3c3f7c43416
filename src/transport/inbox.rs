// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Receiving-side buffer shared by both transport implementations.

use tokio::sync::mpsc::{self, error::TryRecvError};

use super::ChannelError;
use crate::acquisition::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InboxState {
    Open,
    /// Every producer handle is gone; buffered samples are still delivered
    Disconnected,
    /// Closed by the consumer
    Closed,
}

/// Bounded FIFO with a one-sample lookahead slot for `poll`
pub(crate) struct Inbox {
    receiver: mpsc::Receiver<Sample>,
    pending: Option<Sample>,
    state: InboxState,
}

impl Inbox {
    pub(crate) fn new(receiver: mpsc::Receiver<Sample>) -> Self {
        Self {
            receiver,
            pending: None,
            state: InboxState::Open,
        }
    }

    pub(crate) fn poll(&mut self) -> bool {
        if self.pending.is_some() || self.state != InboxState::Open {
            return true;
        }

        match self.receiver.try_recv() {
            Ok(sample) => {
                self.pending = Some(sample);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.state = InboxState::Disconnected;
                true
            }
        }
    }

    pub(crate) async fn receive(&mut self) -> Result<Sample, ChannelError> {
        if self.state == InboxState::Closed {
            return Err(ChannelError::ChannelClosed);
        }
        if let Some(sample) = self.pending.take() {
            return Ok(sample);
        }

        match self.receiver.recv().await {
            Some(sample) => Ok(sample),
            None => {
                self.state = InboxState::Disconnected;
                Err(ChannelError::ChannelClosed)
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.receiver.close();
        self.pending = None;
        self.state = InboxState::Closed;
    }
}
