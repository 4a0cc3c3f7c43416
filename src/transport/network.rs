// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Distributed transport
//!
//! The acquisition process binds a [`NetworkListener`] and accepts a single
//! rendering process, which dials in with [`connect`]. Both sides run the
//! shared secret [`handshake`](super::handshake) before any sample flows;
//! afterwards samples travel producer to consumer as JSON lines.
//!
//! The receiving side decodes frames on a background task into the same
//! bounded inbox used by the co-located channel. When the link drops the task
//! ends and `receive` reports [`ChannelError::ChannelClosed`]; there is no
//! automatic reconnect.

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::codec::{read_frame, write_frame};
use super::handshake;
use super::inbox::Inbox;
use super::{ChannelError, SampleReceiver, SampleSender};
use crate::acquisition::Sample;

/// Time allowed for the shared secret exchange
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

async fn bounded_handshake<F>(exchange: F) -> Result<(), ChannelError>
where
    F: std::future::Future<Output = Result<(), ChannelError>>,
{
    match timeout(HANDSHAKE_TIMEOUT, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ChannelError::HandshakeRejected(format!(
            "no handshake within {:?}",
            HANDSHAKE_TIMEOUT
        ))),
    }
}

/// Acquisition side listening socket
pub struct NetworkListener {
    listener: TcpListener,
    secret: Vec<u8>,
}

impl NetworkListener {
    /// Bind the listening socket
    pub async fn bind<A: ToSocketAddrs>(
        address: A,
        secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ChannelError> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            secret: secret.into(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the consumer and authenticate it
    ///
    /// A peer failing the handshake is disconnected and the error is
    /// returned to the caller.
    pub async fn accept(&self) -> Result<NetworkSender, ChannelError> {
        let (stream, peer) = self.listener.accept().await?;
        info!("Incoming connection from {}", peer);
        configure_stream(&stream);

        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);

        if let Err(err) =
            bounded_handshake(handshake::accept_side(&mut reader, &mut writer, &self.secret)).await
        {
            warn!("Rejected connection from {}: {}", peer, err);
            let _ = writer.shutdown().await;
            return Err(err);
        }

        info!("Consumer {} authenticated", peer);
        Ok(NetworkSender {
            writer: Some(writer),
            peer,
            _reader: reader,
        })
    }
}

fn configure_stream(stream: &TcpStream) {
    // Samples are small and latency matters more than throughput
    if let Err(err) = stream.set_nodelay(true) {
        debug!("Could not set TCP_NODELAY: {}", err);
    }
}

/// Connect to an acquisition process and authenticate
///
/// `capacity` bounds the number of samples buffered on the receiving side.
pub async fn connect<A: ToSocketAddrs>(
    address: A,
    secret: impl AsRef<[u8]>,
    capacity: usize,
) -> Result<NetworkReceiver, ChannelError> {
    let stream = TcpStream::connect(address).await?;
    let peer = stream.peer_addr()?;
    configure_stream(&stream);

    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    bounded_handshake(handshake::connect_side(
        &mut reader,
        &mut writer,
        secret.as_ref(),
    ))
    .await?;
    info!("Connected to {}", peer);

    let (sender, receiver) = mpsc::channel(capacity);
    let reader_task = tokio::spawn(read_samples(reader, sender, peer));

    Ok(NetworkReceiver {
        inbox: Inbox::new(receiver),
        reader_task,
        peer,
        _writer: writer,
    })
}

/// Move frames from the socket into the inbox until the link ends
async fn read_samples(
    mut reader: BufReader<OwnedReadHalf>,
    sender: mpsc::Sender<Sample>,
    peer: SocketAddr,
) {
    let mut line = Vec::new();
    let mut received: u64 = 0;
    loop {
        match read_frame::<_, Sample>(&mut reader, &mut line).await {
            Ok(Some(sample)) => {
                received += 1;
                if sender.send(sample).await.is_err() {
                    debug!("Receiver closed, stop reading from {}", peer);
                    break;
                }
            }
            Ok(None) => {
                info!("Connection to {} closed after {} samples", peer, received);
                break;
            }
            Err(err) => {
                error!("Link to {} failed after {} samples: {}", peer, received, err);
                break;
            }
        }
    }
}

/// Producer end of a network channel
pub struct NetworkSender {
    writer: Option<BufWriter<OwnedWriteHalf>>,
    peer: SocketAddr,
    _reader: BufReader<OwnedReadHalf>,
}

impl NetworkSender {
    /// Address of the connected consumer
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl SampleSender for NetworkSender {
    async fn send(&mut self, sample: Sample) -> Result<(), ChannelError> {
        let writer = self.writer.as_mut().ok_or(ChannelError::ChannelClosed)?;
        if let Err(err) = write_frame(writer, &sample).await {
            warn!("Lost connection to {}: {}", self.peer, err);
            self.writer = None;
            return Err(ChannelError::ChannelClosed);
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.shutdown().await {
                debug!("Error shutting down link to {}: {}", self.peer, err);
            }
            info!("Closed connection to {}", self.peer);
        }
    }
}

/// Consumer end of a network channel
pub struct NetworkReceiver {
    inbox: Inbox,
    reader_task: JoinHandle<()>,
    peer: SocketAddr,
    _writer: BufWriter<OwnedWriteHalf>,
}

impl NetworkReceiver {
    /// Address of the acquisition process
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl SampleReceiver for NetworkReceiver {
    fn poll(&mut self) -> bool {
        self.inbox.poll()
    }

    async fn receive(&mut self) -> Result<Sample, ChannelError> {
        self.inbox.receive().await
    }

    fn close(&mut self) {
        self.inbox.close();
        self.reader_task.abort();
    }
}

impl Drop for NetworkReceiver {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
