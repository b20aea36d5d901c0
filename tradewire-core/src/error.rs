/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the tradewire order-entry stack.
//!
//! This module provides a unified error hierarchy using `thiserror` for
//! typed, domain-specific errors across all tradewire operations.

use thiserror::Error;

/// Result type alias using [`TradewireError`] as the error type.
pub type Result<T> = std::result::Result<T, TradewireError>;

/// Top-level error type for all tradewire operations.
#[derive(Debug, Error)]
pub enum TradewireError {
    /// Failure in the WebSocket/TLS transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed or unrecognized wire message.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Session layer failure.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Codec provider lookup failure.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// I/O error from the environment.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the transport adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// TCP connect, TLS handshake, or WebSocket upgrade failed.
    #[error("connect to {uri} failed: {reason}")]
    ConnectFailed {
        /// Endpoint URI.
        uri: String,
        /// Underlying failure description.
        reason: String,
    },

    /// The handshake did not complete within the configured timeout.
    #[error("handshake with {uri} timed out after {waited_ms} ms")]
    HandshakeTimeout {
        /// Endpoint URI.
        uri: String,
        /// Milliseconds waited.
        waited_ms: u64,
    },

    /// TLS trust material could not be loaded.
    #[error("tls configuration error: {reason}")]
    Tls {
        /// Description of the configuration problem.
        reason: String,
    },

    /// An operation required an open connection.
    #[error("transport is not open")]
    NotOpen,

    /// An outbound frame could not be handed to the connection.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Underlying failure description.
        reason: String,
    },
}

/// Errors raised while decoding or encoding wire messages.
///
/// These are surfaced to the error listener and skipped; they never take
/// the session down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Frame carries a schema id other than the registered one.
    #[error("unknown message schema: expected {expected}, received {actual}")]
    UnknownSchema {
        /// Schema id registered with the provider.
        expected: u16,
        /// Schema id found in the frame.
        actual: u16,
    },

    /// Frame carries a template id the provider does not recognize.
    #[error("unknown template id {template_id}")]
    UnknownTemplate {
        /// Template id found in the frame.
        template_id: u16,
    },

    /// Frame is shorter than its headers or declared block length.
    #[error("truncated frame: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to decode.
        needed: usize,
        /// Bytes present in the frame.
        available: usize,
    },

    /// A field value could not be decoded.
    #[error("invalid value for field {field}: {reason}")]
    InvalidFieldValue {
        /// Field name.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Errors raised by session layer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A send was attempted, or waited, past the timeout without the
    /// session reaching the established state.
    #[error("session not established after {waited_ms} ms (state {state})")]
    NotEstablished {
        /// Session state observed when the wait expired.
        state: String,
        /// Milliseconds waited.
        waited_ms: u64,
    },

    /// A blocking wait was abandoned because the session shut down.
    #[error("wait interrupted by session shutdown")]
    Interrupted,

    /// A bounded wait expired.
    #[error("timed out after {waited_ms} ms waiting for state {target}")]
    TimedOut {
        /// State the caller was waiting for.
        target: String,
        /// Milliseconds waited.
        waited_ms: u64,
    },

    /// The session has been finalized and accepts no further operations.
    #[error("session is finalized")]
    Finalized,
}

/// Errors raised during codec provider lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No registered provider matches the requested encoding name.
    #[error("no message provider named {name:?}")]
    NoSuchProvider {
        /// Requested encoding name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_error_display() {
        let err = MessageError::UnknownSchema {
            expected: 1,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "unknown message schema: expected 1, received 9"
        );
    }

    #[test]
    fn test_tradewire_error_from_message() {
        let err: TradewireError = MessageError::UnknownTemplate { template_id: 42 }.into();
        assert!(matches!(
            err,
            TradewireError::Message(MessageError::UnknownTemplate { template_id: 42 })
        ));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::NotEstablished {
            state: "NOT_NEGOTIATED".to_string(),
            waited_ms: 1000,
        };
        assert_eq!(
            err.to_string(),
            "session not established after 1000 ms (state NOT_NEGOTIATED)"
        );
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::NoSuchProvider {
            name: "JSON".to_string(),
        };
        assert_eq!(err.to_string(), "no message provider named \"JSON\"");
    }
}
