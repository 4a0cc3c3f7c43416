// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the iron-plotter project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time;

use crate::acquisition::{get_device_reader, AcquisitionDaemon, AcquisitionOutcome};
use crate::config::Config;
use crate::transport::{self, local, NetworkListener, SampleSender};
use crate::visualization::{create_sink, RenderDaemon, RenderOutcome, RenderSink, SeriesWindow};

/// Which flows this process runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Read the device and serve samples to one remote client
    Server,
    /// Connect to a server and plot what it sends
    Client,
    /// Both flows in this process over an in-memory channel
    #[default]
    All,
}

/// Runs the flows of one [`Mode`] until they end or shutdown is requested
pub struct Daemon {
    config: Config,
    sink: Option<Box<dyn RenderSink>>,
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new(config: Config) -> Self {
        Daemon { config, sink: None }
    }

    /// Render into `sink` instead of the one named in the configuration
    pub fn with_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the selected flows
    ///
    /// `shutdown` is usually Ctrl+C. A rejected handshake, an unreadable
    /// device or a transport failure is returned as an error.
    pub async fn launch<F>(&mut self, mode: Mode, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Starting in {:?} mode", mode);
        match mode {
            Mode::Server => {
                let endpoint = self.config.transport.bind_endpoint();
                let listener = NetworkListener::bind(
                    endpoint.as_str(),
                    self.config.transport.secret.as_bytes(),
                )
                .await
                .with_context(|| format!("Failed to listen on {}", endpoint))?;
                self.serve(listener, shutdown).await
            }
            Mode::Client => self.run_client(shutdown).await.map(|_| ()),
            Mode::All => self.run_all(shutdown).await.map(|_| ()),
        }
    }

    /// Acquisition side of the distributed mode on an already bound listener
    ///
    /// A single client is accepted, then the listener is released and the
    /// device opened. The session ends with the device input, when the client
    /// goes away, or on shutdown.
    pub async fn serve<F>(&self, listener: NetworkListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let device = self.config.device.clone();
        let session = async move {
            info!("Listening on {}", listener.local_addr()?);
            let mut sender = listener
                .accept()
                .await
                .context("Failed to accept a client")?;
            drop(listener);
            info!("Serving samples to {}", sender.peer_addr());

            let reader = get_device_reader(&device).await?;
            let mut acquisition = AcquisitionDaemon::new();
            let outcome = acquisition.run(reader, &mut sender).await;
            sender.close().await;
            debug!("Server session ended: {:?}", outcome?);
            anyhow::Ok(())
        };

        tokio::select! {
            result = session => result,
            _ = shutdown => {
                info!("Shutdown requested, closing server session");
                Ok(())
            }
        }
    }

    /// Render side of the distributed mode
    pub async fn run_client<F>(&mut self, shutdown: F) -> Result<RenderOutcome>
    where
        F: Future<Output = ()>,
    {
        let endpoint = self.config.transport.connect_endpoint();
        info!("Connecting to {}", endpoint);
        let mut receiver = transport::network::connect(
            endpoint.as_str(),
            self.config.transport.secret.as_bytes(),
            self.config.transport.queue_capacity,
        )
        .await
        .with_context(|| format!("Failed to connect to {}", endpoint))?;
        info!("Connected to {}", receiver.peer_addr());

        let mut render = self.render_daemon();
        render.run(&mut receiver, shutdown).await
    }

    /// Both flows in this process
    ///
    /// The render loop runs here while acquisition runs on its own task. When
    /// rendering ends the receiver is closed and acquisition gets the
    /// configured grace period to notice before it is aborted.
    pub async fn run_all<F>(&mut self, shutdown: F) -> Result<RenderOutcome>
    where
        F: Future<Output = ()>,
    {
        let (mut sender, mut receiver) = local::channel(self.config.transport.queue_capacity);
        let device = self.config.device.clone();
        let mut acquisition: JoinHandle<Result<AcquisitionOutcome>> = tokio::spawn(async move {
            let reader = get_device_reader(&device).await?;
            let mut daemon = AcquisitionDaemon::new();
            let outcome = daemon.run(reader, &mut sender).await;
            sender.close().await;
            outcome
        });

        let mut render = self.render_daemon();
        let rendered = render.run(&mut receiver, shutdown).await;
        drop(receiver);

        let grace = self.config.daemon.acquisition_grace();
        let acquired = match time::timeout(grace, &mut acquisition).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(anyhow::anyhow!("Acquisition task failed: {}", join_error)),
            Err(_) => {
                warn!(
                    "Acquisition still running {} ms after render stopped, aborting it",
                    grace.as_millis()
                );
                acquisition.abort();
                Ok(AcquisitionOutcome::ChannelClosed)
            }
        };

        match (rendered, acquired) {
            (Err(err), acquired) => {
                if let Err(acq_err) = acquired {
                    error!("Acquisition error: {:#}", acq_err);
                }
                Err(err)
            }
            (Ok(_), Err(err)) => Err(err),
            (Ok(outcome), Ok(acquisition_outcome)) => {
                debug!("Acquisition ended: {:?}", acquisition_outcome);
                Ok(outcome)
            }
        }
    }

    fn render_daemon(&mut self) -> RenderDaemon {
        let sink = self
            .sink
            .take()
            .unwrap_or_else(|| create_sink(self.config.render.sink));
        RenderDaemon::new(
            SeriesWindow::from_config(&self.config.window),
            sink,
            self.config.render.refresh_interval(),
        )
    }
}
