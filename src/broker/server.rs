//! TCP server.
//!
//! Accepts connections and serves each one from its own task. Within a
//! connection, requests are processed strictly sequentially: read one
//! frame, dispatch, write the response, repeat. Logical errors keep the
//! connection alive; framing violations, a clean close, or a transport
//! write failure end it.

use crate::broker::handler::{MessageHandler, RequestError};
use crate::config::BrokerConfig;
use crate::metrics::BrokerMetrics;
use crate::protocol::frame::FrameCodec;
use crate::{CafelogError, Result};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

pub struct BrokerServer {
    config: BrokerConfig,
    handler: Arc<MessageHandler>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BrokerServer {
    pub fn new(config: BrokerConfig) -> Result<Self> {
        config.validate().map_err(CafelogError::Config)?;

        let metrics = Arc::new(BrokerMetrics::new());
        let handler = Arc::new(MessageHandler::new(metrics));
        let (shutdown_tx, _) = broadcast::channel(16);

        Ok(Self {
            config,
            handler,
            shutdown_tx,
        })
    }

    pub fn handler(&self) -> Arc<MessageHandler> {
        Arc::clone(&self.handler)
    }

    pub fn metrics(&self) -> Arc<BrokerMetrics> {
        self.handler.metrics()
    }

    /// Handle used to signal graceful shutdown of the accept loop.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Bind the listener and serve until a shutdown signal arrives.
    pub async fn run(&self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(address = %addr, "broker listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let metrics = self.handler.metrics();
                            if metrics.active_connections() >= self.config.max_connections as i64 {
                                warn!(
                                    peer = %peer,
                                    max = self.config.max_connections,
                                    "connection rejected: limit reached"
                                );
                                continue;
                            }

                            metrics.connection_opened();
                            debug!(peer = %peer, "accepted connection");

                            let handler = Arc::clone(&self.handler);
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, handler).await {
                                    debug!(peer = %peer, error = %e, "connection ended with error");
                                } else {
                                    debug!(peer = %peer, "connection closed");
                                }
                                metrics.connection_closed();
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "accept failed");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received, stopping accept loop");
                    break;
                }
            }
        }

        self.drain_connections().await;
        info!("broker shutdown complete");
        Ok(())
    }

    /// Wait up to five seconds for in-flight connections to finish.
    async fn drain_connections(&self) {
        let metrics = self.handler.metrics();
        if metrics.active_connections() == 0 {
            return;
        }

        info!(
            active = metrics.active_connections(),
            "draining active connections"
        );
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while metrics.active_connections() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let remaining = metrics.active_connections();
        if remaining > 0 {
            warn!(remaining, "drain window elapsed with connections open");
        }
    }
}

/// Per-connection request/response loop.
///
/// The last successfully decoded type byte is echoed on framing-error
/// responses; before the first good frame it is 0.
async fn serve_connection(stream: TcpStream, handler: Arc<MessageHandler>) -> Result<()> {
    let mut framed = Framed::new(stream, FrameCodec);
    let mut last_type: u8 = 0;

    loop {
        match framed.next().await {
            Some(Ok(frame)) => {
                last_type = frame.frame_type;
                let response = handler.handle_frame(&frame);
                // A transport write failure terminates the connection.
                framed.send(response).await?;
            }
            Some(Err(e)) => {
                // Framing or read error: report once, then close.
                let response =
                    handler.error_frame(last_type, RequestError::invalid(e.to_string()));
                let _ = framed.send(response).await;
                return Ok(());
            }
            // Clean end of stream.
            None => return Ok(()),
        }
    }
}
