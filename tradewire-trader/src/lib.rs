/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire Trader
//!
//! High-level order-entry facade for the tradewire stack.
//!
//! This crate provides:
//! - **Trader**: Blocking request/response API over an established session
//! - **Builder API**: Fluent configuration of endpoint, encoding, and
//!   listeners
//! - **CLI driver**: The `trader` binary for connectivity testing

pub mod trader;

pub use trader::{
    ErrorListener, Trader, TraderBuilder, DEFAULT_ENCODING, DEFAULT_HOST, DEFAULT_PATH,
    DEFAULT_PORT, DEFAULT_TIMEOUT,
};
