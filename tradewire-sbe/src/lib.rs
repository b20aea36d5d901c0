/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # Tradewire SBE
//!
//! Simple Binary Encoding codec provider for the tradewire order-entry
//! stack.
//!
//! This crate provides:
//! - **Wire layout**: The SBE message header and fixed-block field layouts
//! - **Request builders**: Pool-backed encoders for orders and cancels
//! - **Response views**: Zero-copy views over execution reports and
//!   cancel rejects
//! - **Session framer**: Encoding and classification of session-control
//!   frames
//! - **Provider**: Registration under the encoding name `"SBE"`

pub mod flow;
pub mod order;
pub mod provider;
pub mod report;
pub mod wire;

pub use flow::SbeSessionMessenger;
pub use order::{SbeNewOrderSingle, SbeOrderCancelRequest, SbeRequestMessageFactory};
pub use provider::{register, SbeProvider, ENCODING_NAME};
pub use report::SbeResponseMessageFactory;
pub use wire::{MessageHeader, BLOCK_OFFSET, MESSAGE_HEADER_LEN, SCHEMA_ID, SCHEMA_VERSION};
