/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message traits and views for the tradewire order-entry stack.
//!
//! This module defines the codec-neutral surface between the trading
//! application, the session layer, and a wire encoding:
//! - Mutable request builders ([`MutableNewOrderSingle`],
//!   [`MutableOrderCancelRequest`]) backed by pooled buffer regions
//! - Read-only response views ([`Response`]) borrowed from inbound buffers
//! - The session-control framer ([`SessionMessenger`]) and its decoded
//!   frame model ([`SessionFrame`])
//!
//! ## Buffer ownership
//!
//! A builder owns its pooled region. `into_buffer` transfers the region to
//! the session on send; dropping an unsent builder returns the region to
//! the pool. Response views never own their bytes and are only valid for
//! the duration of the dispatch callback that produced them.

use crate::error::{MessageError, TransportError};
use crate::types::{
    ClOrdId, CxlRejReason, ExecType, OrdStatus, OrdType, Price, SeqNum, SessionId, Side, Symbol,
    Timestamp,
};
use bytes::Bytes;
use std::time::Duration;
use tradewire_buffer::PooledBuffer;

/// Length of the session header prefixed to every frame.
///
/// The session header carries the assigned sequence number for
/// application frames and zero for unsequenced session-control frames.
pub const SESSION_HEADER_LEN: usize = 8;

/// Writes the sequence number into a frame's session header.
///
/// # Panics
/// Panics if the frame is shorter than the session header.
#[inline]
pub fn stamp_seq_no(frame: &mut [u8], seq_no: SeqNum) {
    frame[..SESSION_HEADER_LEN].copy_from_slice(&seq_no.value().to_le_bytes());
}

/// Reads the sequence number from a frame's session header.
///
/// # Errors
/// Returns [`MessageError::Truncated`] if the frame is too short.
#[inline]
pub fn read_seq_no(frame: &[u8]) -> Result<SeqNum, MessageError> {
    let bytes: [u8; SESSION_HEADER_LEN] =
        frame
            .get(..SESSION_HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(MessageError::Truncated {
                needed: SESSION_HEADER_LEN,
                available: frame.len(),
            })?;
    Ok(SeqNum::new(u64::from_le_bytes(bytes)))
}

/// An outbound message under construction.
///
/// Builders are owned by the thread that created them and must be
/// populated there. `send` consumes the builder; the underlying region is
/// released back to the pool exactly once, whether the send succeeds or
/// fails.
pub trait MutableMessage: Send {
    /// Consumes the builder and transfers its buffer region.
    fn into_buffer(self: Box<Self>) -> PooledBuffer;
}

/// Builder for an outbound new order.
pub trait MutableNewOrderSingle: MutableMessage {
    /// Sets the client order id.
    fn set_cl_ord_id(&mut self, cl_ord_id: ClOrdId);
    /// Sets the instrument symbol.
    fn set_symbol(&mut self, symbol: Symbol);
    /// Sets the order side.
    fn set_side(&mut self, side: Side);
    /// Sets the order quantity.
    fn set_order_qty(&mut self, qty: u32);
    /// Sets the limit price.
    fn set_price(&mut self, price: Price);
    /// Sets the order type.
    fn set_ord_type(&mut self, ord_type: OrdType);
    /// Sets the transaction time.
    fn set_transact_time(&mut self, time: Timestamp);
}

/// Builder for an outbound order cancel request.
pub trait MutableOrderCancelRequest: MutableMessage {
    /// Sets the client order id of the cancel request.
    fn set_cl_ord_id(&mut self, cl_ord_id: ClOrdId);
    /// Sets the instrument symbol.
    fn set_symbol(&mut self, symbol: Symbol);
    /// Sets the side of the order being canceled.
    fn set_side(&mut self, side: Side);
    /// Sets the transaction time.
    fn set_transact_time(&mut self, time: Timestamp);
}

/// Factory for outbound request builders.
///
/// Factories may be shared across threads; each call returns a fresh
/// builder backed by a pool region, owned by the calling thread.
pub trait RequestMessageFactory: Send + Sync {
    /// Returns a new order builder.
    fn new_order_single(&self) -> Box<dyn MutableNewOrderSingle>;
    /// Returns an order cancel request builder.
    fn order_cancel_request(&self) -> Box<dyn MutableOrderCancelRequest>;
}

/// Read-only view of an inbound execution report.
///
/// Borrows from the inbound buffer; valid only inside the dispatch
/// callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport<'a> {
    /// Exchange-assigned order id.
    pub order_id: &'a str,
    /// Client order id being reported on.
    pub cl_ord_id: &'a str,
    /// Exchange-assigned execution id.
    pub exec_id: &'a str,
    /// Kind of execution event.
    pub exec_type: ExecType,
    /// Order status after the event.
    pub ord_status: OrdStatus,
    /// Instrument symbol.
    pub symbol: &'a str,
    /// Order side.
    pub side: Side,
    /// Quantity still working.
    pub leaves_qty: u32,
    /// Quantity filled so far.
    pub cum_qty: u32,
    /// Execution or order price.
    pub price: Price,
    /// Transaction time.
    pub transact_time: Timestamp,
}

/// Read-only view of an inbound order cancel reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancelReject<'a> {
    /// Client order id of the rejected cancel.
    pub cl_ord_id: &'a str,
    /// Exchange-assigned order id.
    pub order_id: &'a str,
    /// Reject reason.
    pub cxl_rej_reason: CxlRejReason,
    /// Status of the order the cancel addressed.
    pub ord_status: OrdStatus,
}

/// An inbound application message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// Execution report from the exchange.
    ExecutionReport(ExecutionReport<'a>),
    /// Cancel reject from the exchange.
    OrderCancelReject(OrderCancelReject<'a>),
}

/// Factory producing response views over inbound buffers.
pub trait ResponseMessageFactory: Send + Sync {
    /// Wraps an inbound application payload in a typed read-only view.
    ///
    /// The payload starts at the message header (the session header has
    /// already been stripped by the framer).
    ///
    /// # Errors
    /// Fails with [`MessageError::UnknownSchema`] on a schema-id mismatch
    /// and [`MessageError::UnknownTemplate`] on an unrecognized template,
    /// before any field is decoded.
    fn wrap<'a>(&self, payload: &'a [u8]) -> Result<Response<'a>, MessageError>;
}

/// Decoded session-control frame fields.
pub mod control {
    use super::{SeqNum, SessionId, Timestamp};

    /// Peer accepted negotiation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NegotiationResponse {
        /// Echoed session identity.
        pub session_id: SessionId,
        /// Timestamp of the negotiate request being answered.
        pub request_timestamp: Timestamp,
    }

    /// Peer rejected negotiation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NegotiationReject {
        /// Echoed session identity.
        pub session_id: SessionId,
        /// Timestamp of the negotiate request being answered.
        pub request_timestamp: Timestamp,
        /// Reject code.
        pub code: u8,
    }

    /// Peer accepted establishment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EstablishmentAck {
        /// Echoed session identity.
        pub session_id: SessionId,
        /// Timestamp of the establish request being answered.
        pub request_timestamp: Timestamp,
        /// Keepalive interval granted by the peer.
        pub keepalive_interval_ms: u32,
        /// Next sequence number the peer will send.
        pub next_seq_no: SeqNum,
    }

    /// Peer rejected establishment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EstablishmentReject {
        /// Echoed session identity.
        pub session_id: SessionId,
        /// Timestamp of the establish request being answered.
        pub request_timestamp: Timestamp,
        /// Reject code.
        pub code: u8,
    }

    /// Keepalive / sequence announcement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sequence {
        /// Next sequence number the peer will send.
        pub next_seq_no: SeqNum,
    }

    /// Peer is finalizing the session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Terminate {
        /// Session identity.
        pub session_id: SessionId,
        /// Termination code.
        pub code: u8,
    }

    /// Peer requests retransmission of missed messages.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RetransmitRequest {
        /// Session identity.
        pub session_id: SessionId,
        /// Request timestamp.
        pub timestamp: Timestamp,
        /// First missed sequence number.
        pub from_seq_no: SeqNum,
        /// Number of messages requested.
        pub count: u32,
    }

    /// Peer announces a retransmission run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Retransmission {
        /// Session identity.
        pub session_id: SessionId,
        /// Timestamp of the retransmit request being answered.
        pub request_timestamp: Timestamp,
        /// First retransmitted sequence number.
        pub next_seq_no: SeqNum,
        /// Number of messages being retransmitted.
        pub count: u32,
    }
}

/// A decoded inbound frame, classified by the session framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFrame<'a> {
    /// Sequenced application message; `payload` starts at the message
    /// header.
    Application {
        /// Assigned sequence number from the session header.
        seq_no: SeqNum,
        /// Message header plus body.
        payload: &'a [u8],
    },
    /// Negotiation accepted.
    NegotiationResponse(control::NegotiationResponse),
    /// Negotiation rejected.
    NegotiationReject(control::NegotiationReject),
    /// Establishment accepted.
    EstablishmentAck(control::EstablishmentAck),
    /// Establishment rejected.
    EstablishmentReject(control::EstablishmentReject),
    /// Keepalive / sequence announcement.
    Sequence(control::Sequence),
    /// Peer-initiated finalization.
    Terminate(control::Terminate),
    /// Peer requests retransmission.
    RetransmitRequest(control::RetransmitRequest),
    /// Peer announces retransmission.
    Retransmission(control::Retransmission),
}

/// Framer for session-control messages.
///
/// Encodes the client-side control messages as complete frames (session
/// header included) and classifies inbound frames.
pub trait SessionMessenger: Send + Sync {
    /// Encodes a Negotiate frame.
    fn encode_negotiate(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        keepalive: Duration,
    ) -> Bytes;

    /// Encodes an Establish frame.
    fn encode_establish(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        keepalive: Duration,
        next_seq_no: SeqNum,
    ) -> Bytes;

    /// Encodes a Sequence (heartbeat) frame.
    fn encode_sequence(&self, next_seq_no: SeqNum) -> Bytes;

    /// Encodes a Terminate frame.
    fn encode_terminate(&self, session_id: SessionId, code: u8) -> Bytes;

    /// Encodes a RetransmitRequest frame.
    fn encode_retransmit_request(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        from_seq_no: SeqNum,
        count: u32,
    ) -> Bytes;

    /// Encodes a Retransmission frame.
    fn encode_retransmission(
        &self,
        session_id: SessionId,
        request_timestamp: Timestamp,
        next_seq_no: SeqNum,
        count: u32,
    ) -> Bytes;

    /// Classifies and decodes an inbound frame.
    ///
    /// # Errors
    /// Fails with a [`MessageError`] on truncation, schema mismatch, or an
    /// unrecognized session-control layout.
    fn decode_frame<'a>(&self, frame: &'a [u8]) -> Result<SessionFrame<'a>, MessageError>;
}

/// Outbound frame acceptor implemented by the transport adapter.
pub trait FrameSink: Send + Sync {
    /// Hands a complete frame to the transport.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the connection is closed or the
    /// frame cannot be queued.
    fn send_frame(&self, frame: &[u8]) -> Result<(), TransportError>;
}

/// Consumer of in-order inbound application messages.
///
/// Implemented for any suitable closure; invoked on the dispatcher worker
/// with the source identifier, the decoded view, and the wire sequence
/// number.
pub trait ApplicationMessageConsumer: Send {
    /// Delivers one application message.
    fn on_message(&mut self, source: &str, message: &Response<'_>, seq_no: SeqNum);
}

impl<F> ApplicationMessageConsumer for F
where
    F: FnMut(&str, &Response<'_>, SeqNum) + Send,
{
    fn on_message(&mut self, source: &str, message: &Response<'_>, seq_no: SeqNum) {
        self(source, message, seq_no);
    }
}
