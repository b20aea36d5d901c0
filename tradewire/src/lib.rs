/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire
//!
//! A FIX-over-WebSocket order-entry client stack for Rust.
//!
//! Tradewire implements the client half of a FIXP-style ordered trading
//! session: negotiation, establishment, sequenced application flow with
//! gap detection, keepalive liveness, and orderly finalization, over a
//! TLS WebSocket transport with pooled encode/decode buffers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tradewire::prelude::*;
//!
//! let trader = Trader::builder()
//!     .host("exchange.example")
//!     .port(8025)
//!     .message_listener(Box::new(|source: &str, message: &Response<'_>, seq_no: SeqNum| {
//!         println!("{source} #{seq_no}: {message:?}");
//!     }))
//!     .build()?;
//!
//! trader.open()?;
//! let mut order = trader.create_order();
//! order.set_cl_ord_id(ClOrdId::new("ORD-1").unwrap());
//! order.set_symbol(Symbol::new("MSFT").unwrap());
//! order.set_side(Side::Buy);
//! order.set_order_qty(100);
//! let seq_no = trader.send(order)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Types, traits, and error definitions
//! - [`buffer`]: Buffer pool and ring dispatcher
//! - [`sbe`]: Simple Binary Encoding codec provider
//! - [`session`]: FIXP-style client session layer
//! - [`transport`]: WebSocket transport adapter
//! - [`trader`]: High-level order-entry facade

pub mod core {
    //! Types, traits, and error definitions.
    pub use tradewire_core::*;
}

pub mod buffer {
    //! Buffer pool and ring dispatcher.
    pub use tradewire_buffer::*;
}

pub mod sbe {
    //! Simple Binary Encoding codec provider.
    pub use tradewire_sbe::*;
}

pub mod session {
    //! FIXP-style client session layer.
    pub use tradewire_session::*;
}

pub mod transport {
    //! WebSocket transport adapter.
    pub use tradewire_transport::*;
}

pub mod trader {
    //! High-level order-entry facade.
    pub use tradewire_trader::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use tradewire_core::{
        ClOrdId, CxlRejReason, ExecType, MessageError, MutableMessage, MutableNewOrderSingle,
        MutableOrderCancelRequest, OrdStatus, OrdType, Price, ProviderError, Response, Result,
        SeqNum, SessionError, SessionId, Side, Symbol, Timestamp, TradewireError, TransportError,
    };

    // Buffers
    pub use tradewire_buffer::{BufferPool, PooledBuffer, RingDispatcher};

    // Session
    pub use tradewire_session::{
        ClientSession, EventCause, EventSubscription, SessionEvent, SessionState,
    };

    // Transport
    pub use tradewire_transport::ClientEndpoint;

    // Trader
    pub use tradewire_trader::{Trader, TraderBuilder};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _seq = SeqNum::new(1);
        let _id = SessionId::generate();
        let _state = SessionState::NotNegotiated;
        let _side = Side::Buy;
    }

    #[test]
    fn test_sbe_provider_available() {
        tradewire_sbe::register();
        let provider = tradewire_core::find_provider("SBE").unwrap();
        assert_eq!(provider.name(), "SBE");
    }
}
