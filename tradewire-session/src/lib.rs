/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire Session
//!
//! FIXP-style client session layer for the tradewire order-entry stack.
//!
//! This crate provides:
//! - **State machine**: Runtime session FSM with asserted transitions
//! - **Sequence management**: Atomic per-direction sequence counters
//! - **Keepalive handling**: Heartbeat emission and 2x-interval liveness
//! - **Event publication**: Demand-pull state-change events
//! - **Client session**: The negotiate/establish/finalize driver

pub mod client;
pub mod event;
pub mod keepalive;
pub mod sequence;
pub mod state;

pub use client::{ClientSession, ClientSessionBuilder, SessionMessageConsumer};
pub use event::{EventCause, EventPublisher, EventSubscription, SessionEvent};
pub use keepalive::KeepaliveTracker;
pub use sequence::{InboundSequence, Sequencer};
pub use state::SessionState;
