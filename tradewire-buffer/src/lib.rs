/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire Buffer
//!
//! Buffer management for the tradewire order-entry stack.
//!
//! This crate provides:
//! - **Buffer pool**: Size-classed free lists of reusable byte regions
//! - **Ring dispatcher**: A bounded, lossless inbound frame pump with a
//!   dedicated worker thread

pub mod pool;
pub mod ring;

pub use pool::{BufferPool, PooledBuffer, MIN_REGION_CAPACITY};
pub use ring::{DispatchSink, RingClosed, RingDispatcher, RingProducer, DEFAULT_RING_CAPACITY};
