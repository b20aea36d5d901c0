/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Trader facade.
//!
//! Ties the buffer pool, ring dispatcher, codec provider, session, and
//! transport into one blocking order-entry API. One trader owns exactly
//! one session and one transport; the session identity is generated once
//! and survives reopens.

use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tradewire_buffer::{BufferPool, RingDispatcher, DEFAULT_RING_CAPACITY};
use tradewire_core::error::{Result, TradewireError};
use tradewire_core::message::{
    ApplicationMessageConsumer, FrameSink, MutableMessage, MutableNewOrderSingle,
    MutableOrderCancelRequest, RequestMessageFactory,
};
use tradewire_core::provider::find_provider;
use tradewire_core::types::SeqNum;
use tradewire_session::{ClientSession, EventSubscription, SessionState};
use tradewire_transport::ClientEndpoint;

/// Default exchange host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default exchange port.
pub const DEFAULT_PORT: u16 = 443;
/// Default WebSocket path.
pub const DEFAULT_PATH: &str = "/trade";
/// Default encoding name.
pub const DEFAULT_ENCODING: &str = "SBE";
/// Default bound on blocking waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sink for asynchronous trader errors.
pub type ErrorListener = Arc<dyn Fn(&TradewireError) + Send + Sync>;

/// Builds a [`Trader`].
///
/// Example:
///
/// ```rust,ignore
/// let trader = Trader::builder()
///     .host("exchange.example")
///     .port(8025)
///     .message_listener(Box::new(listener))
///     .build()?;
/// ```
pub struct TraderBuilder {
    host: String,
    port: u16,
    path: String,
    uri: Option<String>,
    encoding: String,
    timeout: Duration,
    heartbeat_interval: Duration,
    ring_capacity: usize,
    message_listener: Option<Box<dyn ApplicationMessageConsumer>>,
    error_listener: Option<ErrorListener>,
}

impl TraderBuilder {
    /// Creates a builder with the communication defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            uri: None,
            encoding: DEFAULT_ENCODING.to_string(),
            timeout: DEFAULT_TIMEOUT,
            heartbeat_interval: DEFAULT_TIMEOUT,
            ring_capacity: DEFAULT_RING_CAPACITY,
            message_listener: None,
            error_listener: None,
        }
    }

    /// Sets the exchange host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the exchange port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the WebSocket path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the full endpoint URI, overriding host, port, and path.
    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the encoding name used for provider selection.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Sets the bound on blocking waits.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the heartbeat interval proposed at negotiation.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the inbound ring capacity.
    #[must_use]
    pub fn ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    /// Sets the application message listener (required).
    #[must_use]
    pub fn message_listener(mut self, listener: Box<dyn ApplicationMessageConsumer>) -> Self {
        self.message_listener = Some(listener);
        self
    }

    /// Sets the error listener.
    ///
    /// Without one, errors are logged.
    #[must_use]
    pub fn error_listener(mut self, listener: ErrorListener) -> Self {
        self.error_listener = Some(listener);
        self
    }

    /// Builds the trader.
    ///
    /// # Errors
    /// Fails with `NoSuchProvider` for an unknown encoding name and with
    /// an I/O error if the transport runtime cannot start.
    ///
    /// # Panics
    /// Panics if the message listener is not set.
    pub fn build(self) -> Result<Trader> {
        tradewire_sbe::register();

        let mut message_listener = self.message_listener.expect("message listener not set");
        let error_listener: ErrorListener = self.error_listener.unwrap_or_else(|| {
            Arc::new(|e: &TradewireError| error!(error = %e, "trader error"))
        });

        let provider = find_provider(&self.encoding)?;
        let uri = self
            .uri
            .unwrap_or_else(|| format!("wss://{}:{}{}", self.host, self.port, self.path));

        let pool = BufferPool::new();
        let request_factory = provider.request_factory(pool.clone());
        let response_factory = provider.response_factory();

        // Application messages leave the session here, already in order.
        let consumer_errors = Arc::clone(&error_listener);
        let session = Arc::new(
            ClientSession::builder()
                .heartbeat_interval(self.heartbeat_interval)
                .session_messenger(provider.session_messenger())
                .session_message_consumer(Box::new(
                    move |source: &str, payload: &[u8], seq_no: SeqNum| {
                        match response_factory.wrap(payload) {
                            Ok(response) => message_listener.on_message(source, &response, seq_no),
                            Err(e) => consumer_errors(&e.into()),
                        }
                    },
                ))
                .build(),
        );

        // Inbound frames drain through the ring into the session. Decode
        // failures are reported and skipped; anything else unbinds the
        // transport but keeps the session usable.
        let sink_session = Arc::clone(&session);
        let sink_errors = Arc::clone(&error_listener);
        let ring = RingDispatcher::new(
            self.ring_capacity,
            Box::new(move |_source, frame| {
                if let Err(e) = sink_session.message_received(&frame) {
                    sink_errors(&e);
                    if !matches!(e, TradewireError::Message(_)) {
                        sink_session.disconnected();
                    }
                }
            }),
        );

        let endpoint = Arc::new(
            ClientEndpoint::new(uri, self.timeout, ring.producer()).map_err(TradewireError::Io)?,
        );
        let unbind_session = Arc::clone(&session);
        endpoint.set_disconnect_listener(Arc::new(move || unbind_session.disconnected()));

        Ok(Trader {
            pool,
            ring,
            endpoint,
            session,
            request_factory,
            error_listener,
            timeout: self.timeout,
        })
    }
}

impl Default for TraderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-entry client: sends orders and cancels, receives executions.
///
/// One trader has a 1:1 relationship with its session and transport.
pub struct Trader {
    pool: BufferPool,
    ring: RingDispatcher,
    endpoint: Arc<ClientEndpoint>,
    session: Arc<ClientSession>,
    request_factory: Box<dyn RequestMessageFactory>,
    error_listener: ErrorListener,
    timeout: Duration,
}

impl std::fmt::Debug for Trader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trader").finish_non_exhaustive()
    }
}

impl Trader {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> TraderBuilder {
        TraderBuilder::new()
    }

    /// Opens the session with the exchange.
    ///
    /// Starts the dispatcher, connects the transport, and binds it to the
    /// session. Reopens reuse the session identity generated at
    /// construction.
    ///
    /// # Errors
    /// Fails if the transport cannot connect or the session is finalized.
    pub fn open(&self) -> Result<()> {
        if self.session.session_state().is_terminal() {
            return Err(tradewire_core::error::SessionError::Finalized.into());
        }
        self.ring.start();
        self.endpoint.open()?;
        self.session.connected(
            Arc::clone(&self.endpoint) as Arc<dyn FrameSink>,
            self.endpoint.source(),
        )
    }

    /// Returns an order message builder.
    ///
    /// Builders may be created concurrently, but each must be populated
    /// on the thread that created it.
    #[must_use]
    pub fn create_order(&self) -> Box<dyn MutableNewOrderSingle> {
        self.request_factory.new_order_single()
    }

    /// Returns an order cancel message builder.
    #[must_use]
    pub fn create_order_cancel_request(&self) -> Box<dyn MutableOrderCancelRequest> {
        self.request_factory.order_cancel_request()
    }

    /// Sends an order or cancel request.
    ///
    /// Blocks while the session is not established, bounded by the
    /// configured timeout. The message's buffer is consumed regardless of
    /// the outcome.
    ///
    /// # Errors
    /// Fails with `NotEstablished` when the wait expires.
    pub fn send(&self, message: Box<dyn MutableMessage>) -> Result<SeqNum> {
        self.session.wait_established(self.timeout)?;
        self.session.send_application_message(message.into_buffer())
    }

    /// Attaches a subscriber for session state-change events.
    #[must_use]
    pub fn subscribe_for_events(&self) -> EventSubscription {
        self.session.subscribe_for_events()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.session_state()
    }

    /// Finalizes the session and stops the dispatcher.
    ///
    /// Waits up to the configured timeout for FINALIZED. Failures are
    /// reported to the error listener; shutdown proceeds regardless.
    pub fn close(&self) {
        if let Err(e) = self.session.finalize_flow() {
            (self.error_listener)(&e);
        }
        if let Err(e) = self
            .session
            .wait_for_state(SessionState::Finalized, self.timeout)
        {
            (self.error_listener)(&e);
        }
        self.endpoint.close();
        self.ring.stop();
    }

    /// Closes the transport without finalizing the session.
    ///
    /// Waits up to the configured timeout for NOT_ESTABLISHED; a later
    /// `open` re-establishes the same flow.
    pub fn suspend(&self) {
        self.endpoint.close();
        if let Err(e) = self
            .session
            .wait_for_state(SessionState::NotEstablished, self.timeout)
        {
            (self.error_listener)(&e);
        }
    }

    /// Returns the buffer pool backing the request builders.
    #[must_use]
    pub fn buffer_pool(&self) -> &BufferPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewire_core::error::ProviderError;
    use tradewire_core::message::Response;

    fn null_listener() -> Box<dyn ApplicationMessageConsumer> {
        Box::new(|_: &str, _: &Response<'_>, _: SeqNum| {})
    }

    #[test]
    fn test_builder_rejects_unknown_encoding() {
        let err = Trader::builder()
            .encoding("PROTOBUF")
            .message_listener(null_listener())
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            TradewireError::Provider(ProviderError::NoSuchProvider { .. })
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let trader = Trader::builder()
            .message_listener(null_listener())
            .build()
            .unwrap();

        assert_eq!(trader.session_state(), SessionState::NotNegotiated);
        assert_eq!(trader.endpoint.source(), "wss://localhost:443/trade");
    }

    #[test]
    fn test_builder_uri_override() {
        let trader = Trader::builder()
            .uri("wss://exchange.example:8025/orders")
            .message_listener(null_listener())
            .build()
            .unwrap();

        assert_eq!(trader.endpoint.source(), "wss://exchange.example:8025/orders");
    }

    #[test]
    fn test_builders_draw_from_the_pool() {
        let trader = Trader::builder()
            .message_listener(null_listener())
            .build()
            .unwrap();

        let order = trader.create_order();
        drop(order);
        assert_eq!(trader.buffer_pool().free_count(), 1);

        let cancel = trader.create_order_cancel_request();
        drop(cancel);
    }

    #[test]
    fn test_send_without_open_times_out() {
        let trader = Trader::builder()
            .timeout(Duration::from_millis(20))
            .message_listener(null_listener())
            .build()
            .unwrap();

        let order = trader.create_order();
        let err = trader.send(order).unwrap_err();
        assert!(matches!(
            err,
            TradewireError::Session(tradewire_core::error::SessionError::NotEstablished { .. })
        ));
        // The builder's region was still returned to the pool.
        assert_eq!(trader.buffer_pool().free_count(), 1);
    }
}
