/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for the tradewire order-entry stack.
//!
//! This module provides the fundamental types used throughout the
//! workspace:
//! - [`SeqNum`]: Session sequence number
//! - [`SessionId`]: 16-byte opaque session identity
//! - [`Timestamp`]: Wall-clock timestamp with nanosecond precision
//! - [`Price`]: Fixed-exponent decimal price
//! - [`ClOrdId`] / [`Symbol`]: Fixed-length wire strings
//! - Order enumerations ([`Side`], [`OrdType`], [`ExecType`], ...)

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use rust_decimal::prelude::ToPrimitive as _;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length of a client order id in bytes.
pub const CL_ORD_ID_MAX_LEN: usize = 16;

/// Maximum length of an instrument symbol in bytes.
pub const SYMBOL_MAX_LEN: usize = 8;

/// Session message sequence number.
///
/// Sequence numbers are unsigned 64-bit integers that order application
/// messages within a session flow. They start at 1 and increment for each
/// message sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Checks if this sequence number is valid (>= 1).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u64 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 16-byte session identity.
///
/// Generated once per trader instance, transmitted during negotiation and
/// echoed by the peer. Reopens of the same trader reuse the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionId([u8; 16]);

impl SessionId {
    /// Generates a fresh random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    /// Creates an identity from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw identity bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_bytes(self.0))
    }
}

/// Wall-clock timestamp with nanosecond precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            nanos_since_epoch: nanos,
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        let dt = Utc::now();
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }

    /// Returns nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos_since_epoch
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y%m%d-%H:%M:%S%.3f"))
    }
}

/// Price as a fixed-exponent decimal.
///
/// Encoded on the wire as a signed 64-bit mantissa with an implied
/// exponent of -3 (thousandths).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Implied decimal exponent of the mantissa.
    pub const EXPONENT: u32 = 3;

    /// Creates a price from a raw mantissa (value × 10³).
    #[inline]
    #[must_use]
    pub const fn from_mantissa(mantissa: i64) -> Self {
        Self(mantissa)
    }

    /// Returns the raw mantissa.
    #[inline]
    #[must_use]
    pub const fn mantissa(self) -> i64 {
        self.0
    }

    /// Creates a price from a decimal value.
    ///
    /// # Returns
    /// `None` if the value does not fit the fixed-exponent representation.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.round_dp(Self::EXPONENT) != value {
            return None;
        }
        let mut scaled = value;
        scaled.rescale(Self::EXPONENT);
        scaled.mantissa().to_i64().map(Self)
    }

    /// Converts the price to a decimal value.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::EXPONENT)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// Client-assigned order identifier.
///
/// Maximum length is 16 bytes; transmitted NUL-padded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ClOrdId(ArrayString<CL_ORD_ID_MAX_LEN>);

impl ClOrdId {
    /// Creates a new client order id.
    ///
    /// # Returns
    /// `None` if the string exceeds the maximum length.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ClOrdId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ClOrdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument symbol.
///
/// Maximum length is 8 bytes; transmitted NUL-padded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Symbol(ArrayString<SYMBOL_MAX_LEN>);

impl Symbol {
    /// Creates a new symbol.
    ///
    /// # Returns
    /// `None` if the string exceeds the maximum length.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the symbol as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
pub enum Side {
    /// Buy order.
    Buy = 1,
    /// Sell order.
    Sell = 2,
}

/// Order type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
pub enum OrdType {
    /// Execute at the best available price.
    Market = 1,
    /// Execute at the limit price or better.
    Limit = 2,
}

/// Execution report type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
pub enum ExecType {
    /// Order accepted.
    New = 0,
    /// Partial fill.
    PartialFill = 1,
    /// Complete fill.
    Fill = 2,
    /// Order canceled.
    Canceled = 3,
    /// Order rejected.
    Rejected = 4,
}

/// Current order status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
pub enum OrdStatus {
    /// Working, nothing filled.
    New = 0,
    /// Working, partially filled.
    PartiallyFilled = 1,
    /// Completely filled.
    Filled = 2,
    /// Canceled.
    Canceled = 3,
    /// Rejected.
    Rejected = 4,
}

/// Reason an order cancel request was rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive, ToPrimitive,
)]
#[repr(u8)]
pub enum CxlRejReason {
    /// Too late to cancel.
    TooLateToCancel = 0,
    /// Unknown order.
    UnknownOrder = 1,
    /// Duplicate client order id.
    DuplicateClOrdId = 2,
    /// Other reason.
    Other = 99,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_operations() {
        let seq = SeqNum::new(5);
        assert_eq!(seq.value(), 5);
        assert_eq!(seq.next().value(), 6);
        assert!(seq.is_valid());
        assert!(!SeqNum::new(0).is_valid());
    }

    #[test]
    fn test_seq_num_default() {
        assert_eq!(SeqNum::default().value(), 1);
    }

    #[test]
    fn test_session_id_round_trip() {
        let id = SessionId::generate();
        let copy = SessionId::from_bytes(*id.as_bytes());
        assert_eq!(id, copy);
    }

    #[test]
    fn test_session_ids_are_distinct() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn test_timestamp_conversions() {
        let ts = Timestamp::from_millis(1000);
        assert_eq!(ts.as_millis(), 1000);
        assert_eq!(ts.as_nanos(), 1_000_000_000);
    }

    #[test]
    fn test_price_decimal_round_trip() {
        let price = Price::from_decimal(Decimal::new(98_765, 3)).unwrap();
        assert_eq!(price.mantissa(), 98_765);
        assert_eq!(price.to_decimal(), Decimal::new(98_765, 3));
    }

    #[test]
    fn test_price_rejects_excess_precision() {
        assert!(Price::from_decimal(Decimal::new(12_345, 4)).is_none());
    }

    #[test]
    fn test_cl_ord_id_length_limit() {
        assert!(ClOrdId::new("ORDER-1").is_some());
        assert!(ClOrdId::new("THIS-ID-IS-FAR-TOO-LONG").is_none());
    }

    #[test]
    fn test_symbol_length_limit() {
        assert_eq!(Symbol::new("MSFT").unwrap().as_str(), "MSFT");
        assert!(Symbol::new("TOO-LONG-SYM").is_none());
    }

    #[test]
    fn test_side_from_primitive() {
        use num_traits::FromPrimitive;
        assert_eq!(Side::from_u8(1), Some(Side::Buy));
        assert_eq!(Side::from_u8(2), Some(Side::Sell));
        assert_eq!(Side::from_u8(9), None);
    }
}
