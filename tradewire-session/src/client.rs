/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Client session.
//!
//! Drives the negotiate/establish/finalize flow over a bound transport,
//! sequences application messages in both directions, keeps the flow
//! alive with Sequence heartbeats, and publishes state changes to the
//! event subscriber.
//!
//! Threading: inbound frames arrive serially on the dispatcher worker,
//! sends come from application threads, and the heartbeat fires on a
//! dedicated timer thread. All three synchronize on the session lock;
//! waiters (`send`, `close`, `suspend`) park on the associated condvar.

use crate::event::{EventCause, EventPublisher, EventSubscription, SessionEvent};
use crate::keepalive::KeepaliveTracker;
use crate::sequence::{InboundSequence, Sequencer};
use crate::state::SessionState;
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tradewire_buffer::PooledBuffer;
use tradewire_core::error::{Result, SessionError, TradewireError, TransportError};
use tradewire_core::message::{control, stamp_seq_no, FrameSink, SessionFrame, SessionMessenger};
use tradewire_core::types::{SeqNum, SessionId, Timestamp};

/// Termination code sent on an orderly local finalization.
const TERMINATION_FINISHED: u8 = 0;

/// Consumer of in-order inbound application payloads.
///
/// Invoked on the dispatcher worker with the transport source, the
/// payload starting at the message header, and the wire sequence number.
pub type SessionMessageConsumer = Box<dyn FnMut(&str, &[u8], SeqNum) + Send>;

/// Builds a [`ClientSession`].
pub struct ClientSessionBuilder {
    session_id: Option<SessionId>,
    heartbeat_interval: Duration,
    messenger: Option<Box<dyn SessionMessenger>>,
    consumer: Option<SessionMessageConsumer>,
}

impl ClientSessionBuilder {
    /// Creates a builder with a 30 second heartbeat interval.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_id: None,
            heartbeat_interval: Duration::from_secs(30),
            messenger: None,
            consumer: None,
        }
    }

    /// Sets the session identity.
    #[must_use]
    pub fn session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Sets the heartbeat interval proposed at negotiation.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the session-control framer.
    #[must_use]
    pub fn session_messenger(mut self, messenger: Box<dyn SessionMessenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    /// Sets the application message consumer.
    #[must_use]
    pub fn session_message_consumer(mut self, consumer: SessionMessageConsumer) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Builds the session.
    ///
    /// # Panics
    /// Panics if the framer or the consumer is not set.
    #[must_use]
    pub fn build(self) -> ClientSession {
        let messenger = self.messenger.expect("session_messenger is required");
        let consumer = self.consumer.expect("session_message_consumer is required");

        ClientSession {
            core: Arc::new(SessionCore {
                session_id: self.session_id.unwrap_or_else(SessionId::generate),
                heartbeat_interval: self.heartbeat_interval,
                messenger,
                consumer: Mutex::new(consumer),
                sequencer: Sequencer::new(),
                keepalive: Mutex::new(KeepaliveTracker::new(self.heartbeat_interval)),
                conn: Mutex::new(Conn {
                    state: SessionState::NotNegotiated,
                    sink: None,
                    source: Arc::from(""),
                    negotiated_once: false,
                }),
                state_changed: Condvar::new(),
                events: EventPublisher::new(),
                timer: Mutex::new(None),
            }),
        }
    }
}

impl Default for ClientSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Conn {
    state: SessionState,
    sink: Option<Arc<dyn FrameSink>>,
    source: Arc<str>,
    negotiated_once: bool,
}

struct SessionCore {
    session_id: SessionId,
    heartbeat_interval: Duration,
    messenger: Box<dyn SessionMessenger>,
    consumer: Mutex<SessionMessageConsumer>,
    sequencer: Sequencer,
    keepalive: Mutex<KeepaliveTracker>,
    conn: Mutex<Conn>,
    state_changed: Condvar,
    events: EventPublisher,
    timer: Mutex<Option<HeartbeatTimer>>,
}

/// Client half of a FIXP-style ordered session.
pub struct ClientSession {
    core: Arc<SessionCore>,
}

impl ClientSession {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ClientSessionBuilder {
        ClientSessionBuilder::new()
    }

    /// Returns the session identity.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.core.session_id
    }

    /// Returns the current session state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.core.conn.lock().state
    }

    /// Attaches a subscriber for state-change events.
    ///
    /// At most one subscriber is active; a second call replaces the first.
    #[must_use]
    pub fn subscribe_for_events(&self) -> EventSubscription {
        self.core.events.subscribe()
    }

    /// Binds a freshly opened transport to the session.
    ///
    /// On first connection this emits Negotiate; on a reconnect after a
    /// transport unbind it emits Establish without renegotiating.
    ///
    /// # Errors
    /// Fails if the session is finalized or the control frame cannot be
    /// handed to the transport.
    pub fn connected(&self, sink: Arc<dyn FrameSink>, source: &str) -> Result<()> {
        let core = &self.core;
        let mut conn = core.conn.lock();

        if conn.state.is_terminal() {
            return Err(SessionError::Finalized.into());
        }

        conn.sink = Some(sink);
        conn.source = Arc::from(source);
        core.keepalive.lock().reset();

        let frame = if conn.negotiated_once {
            info!(session_id = %core.session_id, %source, "transport rebound, re-establishing");
            core.messenger.encode_establish(
                core.session_id,
                Timestamp::now(),
                core.heartbeat_interval,
                core.sequencer.next_outbound(),
            )
        } else {
            info!(session_id = %core.session_id, %source, "transport bound, negotiating");
            core.messenger.encode_negotiate(
                core.session_id,
                Timestamp::now(),
                core.heartbeat_interval,
            )
        };

        core.send_control(&conn, &frame)
    }

    /// Handles a transport unbind.
    ///
    /// Demotes an established or negotiated session to NOT_ESTABLISHED
    /// and stops the heartbeat timer.
    pub fn disconnected(&self) {
        let core = &self.core;
        let event = {
            let mut conn = core.conn.lock();
            conn.sink = None;
            match conn.state {
                SessionState::Negotiated | SessionState::Established => {
                    Some(core.transition(&mut conn, SessionState::NotEstablished, EventCause::TransportUnbound))
                }
                _ => None,
            }
        };

        core.stop_timer();
        if let Some(event) = event {
            core.events.publish(event);
        }
    }

    /// Processes one inbound frame from the dispatcher.
    ///
    /// # Errors
    /// Decoding failures surface as [`TradewireError::Message`]; the
    /// session itself remains usable.
    pub fn message_received(&self, frame: &[u8]) -> Result<()> {
        let core = &self.core;
        core.keepalive.lock().on_frame_received();

        match core.messenger.decode_frame(frame)? {
            SessionFrame::Application { seq_no, payload } => core.on_application(seq_no, payload),
            SessionFrame::NegotiationResponse(response) => {
                SessionCore::on_negotiation_response(core, &response)
            }
            SessionFrame::NegotiationReject(reject) => core.on_negotiation_reject(&reject),
            SessionFrame::EstablishmentAck(ack) => SessionCore::on_establishment_ack(core, &ack),
            SessionFrame::EstablishmentReject(reject) => core.on_establishment_reject(&reject),
            SessionFrame::Sequence(sequence) => core.on_sequence(&sequence),
            SessionFrame::Terminate(terminate) => core.on_terminate(&terminate),
            SessionFrame::RetransmitRequest(request) => core.on_retransmit_request(&request),
            SessionFrame::Retransmission(retransmission) => {
                debug!(
                    from = retransmission.next_seq_no.value(),
                    count = retransmission.count,
                    "retransmission run announced"
                );
                Ok(())
            }
        }
    }

    /// Blocks until the session is established.
    ///
    /// # Errors
    /// Fails with [`SessionError::NotEstablished`] when the timeout
    /// expires and [`SessionError::Interrupted`] if the session finalizes
    /// while waiting.
    pub fn wait_established(&self, timeout: Duration) -> Result<()> {
        let core = &self.core;
        let deadline = Instant::now() + timeout;
        let mut conn = core.conn.lock();

        loop {
            match conn.state {
                SessionState::Established => return Ok(()),
                SessionState::Finalized => return Err(SessionError::Interrupted.into()),
                _ => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::NotEstablished {
                    state: conn.state.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                }
                .into());
            }
            core.state_changed.wait_for(&mut conn, deadline - now);
        }
    }

    /// Blocks until the session reaches `target`.
    ///
    /// # Errors
    /// Fails with [`SessionError::TimedOut`] when the timeout expires and
    /// [`SessionError::Interrupted`] if the session finalizes while
    /// waiting for a different state.
    pub fn wait_for_state(&self, target: SessionState, timeout: Duration) -> Result<()> {
        let core = &self.core;
        let deadline = Instant::now() + timeout;
        let mut conn = core.conn.lock();

        loop {
            if conn.state == target {
                return Ok(());
            }
            if conn.state.is_terminal() && target != SessionState::Finalized {
                return Err(SessionError::Interrupted.into());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::TimedOut {
                    target: target.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                }
                .into());
            }
            core.state_changed.wait_for(&mut conn, deadline - now);
        }
    }

    /// Sequences and sends one application message.
    ///
    /// The buffer is consumed and returned to its pool whether the send
    /// succeeds or fails. The sequence number is assigned atomically with
    /// the emission, so peers observe the same order as successful
    /// returns.
    ///
    /// # Errors
    /// Fails if the session is not established or the transport rejects
    /// the frame.
    pub fn send_application_message(&self, mut buffer: PooledBuffer) -> Result<SeqNum> {
        let core = &self.core;
        let outcome = {
            let conn = core.conn.lock();
            if conn.state != SessionState::Established {
                Err(TradewireError::from(SessionError::NotEstablished {
                    state: conn.state.to_string(),
                    waited_ms: 0,
                }))
            } else if let Some(sink) = &conn.sink {
                let seq_no = core.sequencer.allocate_outbound();
                stamp_seq_no(buffer.buf_mut(), seq_no);
                let sent = sink
                    .send_frame(buffer.as_slice())
                    .map(|()| seq_no)
                    .map_err(TradewireError::from);
                if sent.is_ok() {
                    core.keepalive.lock().on_frame_sent();
                }
                sent
            } else {
                Err(TransportError::NotOpen.into())
            }
        };

        buffer.release();
        outcome
    }

    /// Finalizes the session flow.
    ///
    /// Emits Terminate (best effort), moves to FINALIZED, and rejects all
    /// further sends. Idempotent.
    ///
    /// # Errors
    /// Reports a transport failure while emitting Terminate; the session
    /// is finalized regardless.
    pub fn finalize_flow(&self) -> Result<()> {
        let core = &self.core;
        let (event, send_result) = {
            let mut conn = core.conn.lock();
            if conn.state.is_terminal() {
                return Ok(());
            }

            let frame = core
                .messenger
                .encode_terminate(core.session_id, TERMINATION_FINISHED);
            let send_result = match conn.sink.as_ref() {
                Some(_) => core.send_control(&conn, &frame),
                None => Ok(()),
            };

            let event = core.transition(&mut conn, SessionState::Finalized, EventCause::Finalized);
            (event, send_result)
        };

        core.stop_timer();
        core.events.publish(event);
        send_result
    }
}

impl SessionCore {
    /// Applies a state change under the session lock and wakes waiters.
    fn transition(&self, conn: &mut Conn, next: SessionState, cause: EventCause) -> SessionEvent {
        debug_assert!(conn.state.can_transition_to(next));
        info!(from = %conn.state, to = %next, "session state change");
        conn.state = next;
        self.state_changed.notify_all();
        SessionEvent { state: next, cause }
    }

    /// Sends a control frame over the bound transport.
    fn send_control(&self, conn: &Conn, frame: &[u8]) -> Result<()> {
        let sink = conn.sink.as_ref().ok_or(TransportError::NotOpen)?;
        sink.send_frame(frame)?;
        self.keepalive.lock().on_frame_sent();
        Ok(())
    }

    fn on_negotiation_response(
        core: &Arc<Self>,
        response: &control::NegotiationResponse,
    ) -> Result<()> {
        let event = {
            let mut conn = core.conn.lock();
            if conn.state != SessionState::NotNegotiated {
                debug!(state = %conn.state, "ignoring negotiation response");
                return Ok(());
            }
            if response.session_id != core.session_id {
                warn!(echoed = %response.session_id, "negotiation response for foreign session");
                return Ok(());
            }

            conn.negotiated_once = true;
            let event = core.transition(
                &mut conn,
                SessionState::Negotiated,
                EventCause::NegotiationAccepted,
            );

            let frame = core.messenger.encode_establish(
                core.session_id,
                Timestamp::now(),
                core.heartbeat_interval,
                core.sequencer.next_outbound(),
            );
            core.send_control(&conn, &frame)?;
            event
        };

        Self::start_timer(core);
        core.events.publish(event);
        Ok(())
    }

    fn on_negotiation_reject(&self, reject: &control::NegotiationReject) -> Result<()> {
        warn!(code = reject.code, "negotiation rejected by peer");
        let state = self.conn.lock().state;
        self.events.publish(SessionEvent {
            state,
            cause: EventCause::NegotiationRejected { code: reject.code },
        });
        Ok(())
    }

    fn on_establishment_ack(core: &Arc<Self>, ack: &control::EstablishmentAck) -> Result<()> {
        let (event, timer_stale) = {
            let mut conn = core.conn.lock();
            match conn.state {
                SessionState::Negotiated | SessionState::NotEstablished => {
                    if ack.keepalive_interval_ms as u128 != core.heartbeat_interval.as_millis() {
                        debug!(
                            granted_ms = ack.keepalive_interval_ms,
                            "peer granted a different keepalive interval"
                        );
                    }
                    // A rebind cancelled the timer; restart it.
                    let timer_stale = conn.state == SessionState::NotEstablished;
                    let event = core.transition(
                        &mut conn,
                        SessionState::Established,
                        EventCause::EstablishmentAccepted,
                    );
                    (event, timer_stale)
                }
                other => {
                    debug!(state = %other, "ignoring establishment ack");
                    return Ok(());
                }
            }
        };

        if timer_stale {
            Self::start_timer(core);
        }
        core.events.publish(event);
        Ok(())
    }

    fn on_establishment_reject(&self, reject: &control::EstablishmentReject) -> Result<()> {
        warn!(code = reject.code, "establishment rejected by peer");
        let state = self.conn.lock().state;
        self.events.publish(SessionEvent {
            state,
            cause: EventCause::EstablishmentRejected { code: reject.code },
        });
        Ok(())
    }

    fn on_sequence(&self, sequence: &control::Sequence) -> Result<()> {
        let expected = self.sequencer.expected_inbound();
        if sequence.next_seq_no > expected {
            // The keepalive itself revealed missed messages.
            let count = (sequence.next_seq_no.value() - expected.value()) as u32;
            warn!(
                expected = expected.value(),
                announced = sequence.next_seq_no.value(),
                "sequence announcement ahead of expected, requesting retransmit"
            );
            let conn = self.conn.lock();
            let frame = self.messenger.encode_retransmit_request(
                self.session_id,
                Timestamp::now(),
                expected,
                count,
            );
            self.send_control(&conn, &frame)?;
        }
        Ok(())
    }

    fn on_terminate(&self, terminate: &control::Terminate) -> Result<()> {
        let event = {
            let mut conn = self.conn.lock();
            if conn.state.is_terminal() {
                return Ok(());
            }
            info!(code = terminate.code, "peer finalized the session");
            self.transition(
                &mut conn,
                SessionState::Finalized,
                EventCause::PeerTerminated {
                    code: terminate.code,
                },
            )
        };

        self.stop_timer();
        self.events.publish(event);
        Ok(())
    }

    fn on_retransmit_request(&self, request: &control::RetransmitRequest) -> Result<()> {
        // The client flow is not recoverable: nothing is stored, so the
        // reply announces an empty run.
        warn!(
            from = request.from_seq_no.value(),
            count = request.count,
            "peer requested retransmission of an unrecoverable flow"
        );
        let conn = self.conn.lock();
        let frame = self.messenger.encode_retransmission(
            self.session_id,
            request.timestamp,
            request.from_seq_no,
            0,
        );
        self.send_control(&conn, &frame)
    }

    fn on_application(&self, seq_no: SeqNum, payload: &[u8]) -> Result<()> {
        let source = {
            let conn = self.conn.lock();
            if conn.state != SessionState::Established {
                warn!(state = %conn.state, seq_no = seq_no.value(), "application frame outside established state");
                return Ok(());
            }

            match self.sequencer.classify_inbound(seq_no) {
                InboundSequence::InOrder => {
                    self.sequencer.advance_inbound();
                    Arc::clone(&conn.source)
                }
                InboundSequence::Duplicate { expected, received } => {
                    debug!(expected, received, "discarding duplicate inbound message");
                    return Ok(());
                }
                InboundSequence::Gap { expected, received } => {
                    warn!(expected, received, "inbound sequence gap, requesting retransmit");
                    let frame = self.messenger.encode_retransmit_request(
                        self.session_id,
                        Timestamp::now(),
                        SeqNum::new(expected),
                        (received - expected) as u32,
                    );
                    return self.send_control(&conn, &frame);
                }
            }
        };

        // Deliver outside the session lock; the consumer may call back in.
        let mut consumer = self.consumer.lock();
        (*consumer)(&source, payload, seq_no);
        Ok(())
    }

    fn on_heartbeat_tick(&self) -> bool {
        let lapsed = self.keepalive.lock().is_lapsed();
        if lapsed {
            let event = {
                let mut conn = self.conn.lock();
                match conn.state {
                    SessionState::Negotiated | SessionState::Established => {
                        warn!("keepalive lapsed, unbinding transport");
                        conn.sink = None;
                        Some(self.transition(
                            &mut conn,
                            SessionState::NotEstablished,
                            EventCause::KeepaliveLapsed,
                        ))
                    }
                    _ => None,
                }
            };
            if let Some(event) = event {
                self.events.publish(event);
            }
            return false;
        }

        let heartbeat_due = {
            let keepalive = self.keepalive.lock();
            keepalive.needs_heartbeat() || keepalive.probe_due()
        };
        if heartbeat_due {
            let conn = self.conn.lock();
            if conn.state == SessionState::Established {
                let frame = self.messenger.encode_sequence(self.sequencer.next_outbound());
                if let Err(e) = self.send_control(&conn, &frame) {
                    warn!(error = %e, "failed to emit heartbeat");
                }
            }
        }
        true
    }

    /// Starts (or restarts) the heartbeat timer thread.
    fn start_timer(core: &Arc<Self>) {
        let mut slot = core.timer.lock();
        if let Some(old) = slot.take() {
            old.stop();
        }
        *slot = Some(HeartbeatTimer::start(
            Arc::downgrade(core),
            core.heartbeat_interval,
        ));
    }

    fn stop_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.stop();
        }
    }
}

/// Dedicated heartbeat timer thread.
///
/// Fires every interval and posts onto the session; the handler is
/// re-entrant-safe with send because both go through the session lock.
struct HeartbeatTimer {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatTimer {
    fn start(core: Weak<SessionCore>, interval: Duration) -> Self {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("session-heartbeat".into())
            .spawn(move || {
                let (flag, cv) = &*thread_stop;
                loop {
                    {
                        let mut stopped = flag.lock();
                        if !*stopped {
                            cv.wait_for(&mut stopped, interval);
                        }
                        if *stopped {
                            break;
                        }
                    }
                    let Some(core) = core.upgrade() else { break };
                    if !core.on_heartbeat_tick() {
                        break;
                    }
                }
            })
            .expect("failed to spawn heartbeat timer");

        Self {
            stop,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        let (flag, cv) = &*self.stop;
        *flag.lock() = true;
        cv.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
