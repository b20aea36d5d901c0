/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire Core
//!
//! Core types, traits, and error definitions for the tradewire
//! order-entry stack.
//!
//! This crate provides the building blocks used across all tradewire
//! crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Message surface**: Request builders, response views, and the
//!   session-control framer trait
//! - **Provider registry**: Name-keyed codec provider discovery
//! - **Core types**: `SeqNum`, `SessionId`, `Timestamp`, `Price`, and the
//!   order enumerations
//!
//! ## Zero-copy design
//!
//! Inbound views borrow from the dispatch buffer and never outlive the
//! dispatch callback; outbound builders reuse pooled regions so the
//! encode path allocates nothing in steady state.

pub mod error;
pub mod message;
pub mod provider;
pub mod types;

pub use error::{
    MessageError, ProviderError, Result, SessionError, TradewireError, TransportError,
};
pub use message::{
    ApplicationMessageConsumer, ExecutionReport, FrameSink, MutableMessage, MutableNewOrderSingle,
    MutableOrderCancelRequest, OrderCancelReject, RequestMessageFactory, Response,
    ResponseMessageFactory, SessionFrame, SessionMessenger, SESSION_HEADER_LEN,
};
pub use provider::{find_provider, register_provider, MessageProvider};
pub use types::{
    ClOrdId, CxlRejReason, ExecType, OrdStatus, OrdType, Price, SeqNum, SessionId, Side, Symbol,
    Timestamp,
};
