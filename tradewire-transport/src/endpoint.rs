/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! WebSocket client endpoint.
//!
//! Owns the WebSocket connection and a private tokio runtime for its I/O
//! workers, keeping the rest of the stack synchronous. Inbound binary
//! frames are enqueued onto the ring dispatcher tagged with the peer URI;
//! outbound frames are handed over through [`FrameSink`]. A disconnect
//! listener fires when the read stream ends for any reason.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tracing::{debug, info, warn};
use tradewire_buffer::RingProducer;
use tradewire_core::error::TransportError;
use tradewire_core::message::FrameSink;

use crate::tls;

/// Callback fired when the connection's read stream ends.
pub type DisconnectListener = Arc<dyn Fn() + Send + Sync>;

/// How long `close` waits for the I/O tasks before aborting them.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Outbound queue depth between senders and the write task.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

enum Command {
    Frame(Bytes),
    Close,
}

struct Connection {
    out_tx: mpsc::Sender<Command>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// WebSocket client connection with explicit lifecycle.
pub struct ClientEndpoint {
    uri: String,
    source: Arc<str>,
    handshake_timeout: Duration,
    runtime: Runtime,
    producer: RingProducer,
    disconnect_listener: Mutex<Option<DisconnectListener>>,
    conn: Mutex<Option<Connection>>,
}

impl ClientEndpoint {
    /// Creates an endpoint for `uri`.
    ///
    /// # Arguments
    /// * `uri` - Full endpoint URI (e.g. `wss://localhost:443/trade`)
    /// * `handshake_timeout` - Bound on TLS handshake + WebSocket upgrade
    /// * `producer` - Ring dispatcher producer for inbound frames
    ///
    /// # Errors
    /// Fails if the I/O runtime cannot be built.
    pub fn new(
        uri: impl Into<String>,
        handshake_timeout: Duration,
        producer: RingProducer,
    ) -> std::io::Result<Self> {
        let uri = uri.into();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ws-endpoint")
            .enable_all()
            .build()?;

        Ok(Self {
            source: Arc::from(uri.as_str()),
            uri,
            handshake_timeout,
            runtime,
            producer,
            disconnect_listener: Mutex::new(None),
            conn: Mutex::new(None),
        })
    }

    /// Sets the disconnect listener. Call before `open`.
    pub fn set_disconnect_listener(&self, listener: DisconnectListener) {
        *self.disconnect_listener.lock() = Some(listener);
    }

    /// Returns the opaque source identifier (the peer URI).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Opens the connection.
    ///
    /// Returns only once the TLS handshake and WebSocket upgrade have
    /// succeeded. Opening an already-open endpoint is a no-op.
    ///
    /// # Errors
    /// Fails with [`TransportError::HandshakeTimeout`] or
    /// [`TransportError::ConnectFailed`].
    pub fn open(&self) -> Result<(), TransportError> {
        let mut conn = self.conn.lock();
        if conn.is_some() {
            debug!(uri = %self.uri, "endpoint already open");
            return Ok(());
        }

        let connector = tls::build_connector()?;
        let stream = self
            .runtime
            .block_on(async {
                timeout(
                    self.handshake_timeout,
                    connect_async_tls_with_config(self.uri.as_str(), None, false, connector),
                )
                .await
            })
            .map_err(|_| TransportError::HandshakeTimeout {
                uri: self.uri.clone(),
                waited_ms: self.handshake_timeout.as_millis() as u64,
            })?
            .map_err(|e| TransportError::ConnectFailed {
                uri: self.uri.clone(),
                reason: e.to_string(),
            })?
            .0;
        info!(uri = %self.uri, "websocket connection established");

        let (mut ws_tx, mut ws_rx) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Command>(OUTBOUND_QUEUE_DEPTH);

        let writer = self.runtime.spawn(async move {
            while let Some(command) = out_rx.recv().await {
                match command {
                    Command::Frame(frame) => {
                        if let Err(e) = ws_tx.send(Message::Binary(frame.to_vec())).await {
                            warn!(error = %e, "websocket write failed");
                            break;
                        }
                    }
                    Command::Close => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        let producer = self.producer.clone();
        let source = Arc::clone(&self.source);
        let listener = self.disconnect_listener.lock().clone();
        let reader = self.runtime.spawn(async move {
            loop {
                match ws_rx.next().await {
                    Some(Ok(Message::Binary(data))) => {
                        if producer.enqueue(Arc::clone(&source), Bytes::from(data)).is_err() {
                            warn!("ring dispatcher stopped, dropping connection");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Text(text))) => {
                        warn!(len = text.len(), "ignoring unexpected text frame");
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("websocket closed by peer");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket read failed");
                        break;
                    }
                }
            }
            if let Some(listener) = listener {
                listener();
            }
        });

        *conn = Some(Connection {
            out_tx,
            reader,
            writer,
        });
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Sends a close frame, waits briefly for the I/O tasks, and invokes
    /// the disconnect listener. Closing a closed endpoint is a no-op.
    pub fn close(&self) {
        let connection = self.conn.lock().take();
        let Some(connection) = connection else {
            return;
        };

        let _ = connection.out_tx.try_send(Command::Close);
        self.runtime.block_on(async {
            let mut writer = connection.writer;
            if timeout(CLOSE_GRACE, &mut writer).await.is_err() {
                writer.abort();
            }
            let mut reader = connection.reader;
            if timeout(CLOSE_GRACE, &mut reader).await.is_err() {
                reader.abort();
            }
        });

        // An aborted reader never reached its exit path; unbinding must
        // still be observed.
        let listener = self.disconnect_listener.lock().clone();
        if let Some(listener) = listener {
            listener();
        }
        info!(uri = %self.uri, "websocket connection closed");
    }
}

impl FrameSink for ClientEndpoint {
    fn send_frame(&self, frame: &[u8]) -> Result<(), TransportError> {
        let conn = self.conn.lock();
        let connection = conn.as_ref().ok_or(TransportError::NotOpen)?;
        connection
            .out_tx
            .blocking_send(Command::Frame(Bytes::copy_from_slice(frame)))
            .map_err(|_| TransportError::SendFailed {
                reason: "connection write queue closed".to_string(),
            })
    }
}

impl Drop for ClientEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewire_buffer::RingDispatcher;

    fn endpoint(uri: &str) -> ClientEndpoint {
        let dispatcher = RingDispatcher::new(16, Box::new(|_, _| {}));
        ClientEndpoint::new(uri, Duration::from_millis(200), dispatcher.producer()).unwrap()
    }

    #[test]
    fn test_send_frame_requires_open_connection() {
        let endpoint = endpoint("wss://localhost:1/trade");
        assert_eq!(
            endpoint.send_frame(b"frame"),
            Err(TransportError::NotOpen)
        );
    }

    #[test]
    fn test_open_fails_against_unreachable_peer() {
        let endpoint = endpoint("wss://localhost:1/trade");
        let err = endpoint.open().unwrap_err();
        assert!(matches!(
            err,
            TransportError::ConnectFailed { .. } | TransportError::HandshakeTimeout { .. }
        ));
    }

    #[test]
    fn test_source_is_the_peer_uri() {
        let endpoint = endpoint("wss://exchange.example:443/trade");
        assert_eq!(endpoint.source(), "wss://exchange.example:443/trade");
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let endpoint = endpoint("wss://localhost:1/trade");
        endpoint.close();
    }
}
