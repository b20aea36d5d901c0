/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Mutable request builders.
//!
//! Builders acquire a pooled region at creation, pre-write the frame
//! headers, and expose field setters over the fixed block. The calling
//! thread owns the builder; `send` consumes it and the region travels with
//! the frame.

use crate::wire::{self, block, template, MessageHeader, BLOCK_OFFSET};
use bytes::BufMut;
use tradewire_buffer::{BufferPool, PooledBuffer};
use tradewire_core::message::{
    MutableMessage, MutableNewOrderSingle, MutableOrderCancelRequest, RequestMessageFactory,
};
use tradewire_core::types::{ClOrdId, OrdType, Price, Side, Symbol, Timestamp};

/// Acquires a region and pre-writes session and message headers.
fn framed_buffer(pool: &BufferPool, template_id: u16, block_length: u16) -> PooledBuffer {
    let total = BLOCK_OFFSET + block_length as usize;
    let mut buffer = pool.acquire(total);

    let buf = buffer.buf_mut();
    buf.put_u64_le(0); // session header, stamped at send time
    MessageHeader::for_template(template_id, block_length).write(buf);
    buf.resize(total, 0);

    debug_assert_eq!(buffer.len(), total);
    buffer
}

/// SBE encoder for an outbound new order.
#[derive(Debug)]
pub struct SbeNewOrderSingle {
    buffer: PooledBuffer,
}

impl SbeNewOrderSingle {
    pub(crate) fn new(pool: &BufferPool) -> Self {
        Self {
            buffer: framed_buffer(pool, template::NEW_ORDER_SINGLE, block::NEW_ORDER_SINGLE),
        }
    }

    #[inline]
    fn block(&mut self) -> &mut [u8] {
        &mut self.buffer.buf_mut()[BLOCK_OFFSET..]
    }
}

impl MutableMessage for SbeNewOrderSingle {
    fn into_buffer(self: Box<Self>) -> PooledBuffer {
        self.buffer
    }
}

impl MutableNewOrderSingle for SbeNewOrderSingle {
    fn set_cl_ord_id(&mut self, cl_ord_id: ClOrdId) {
        wire::put_padded(&mut self.block()[0..16], cl_ord_id.as_str());
    }

    fn set_symbol(&mut self, symbol: Symbol) {
        wire::put_padded(&mut self.block()[16..24], symbol.as_str());
    }

    fn set_side(&mut self, side: Side) {
        self.block()[24] = side as u8;
    }

    fn set_order_qty(&mut self, qty: u32) {
        wire::put_u32(self.block(), 25, qty);
    }

    fn set_price(&mut self, price: Price) {
        wire::put_i64(self.block(), 29, price.mantissa());
    }

    fn set_ord_type(&mut self, ord_type: OrdType) {
        self.block()[37] = ord_type as u8;
    }

    fn set_transact_time(&mut self, time: Timestamp) {
        wire::put_u64(self.block(), 38, time.as_nanos());
    }
}

/// SBE encoder for an outbound order cancel request.
#[derive(Debug)]
pub struct SbeOrderCancelRequest {
    buffer: PooledBuffer,
}

impl SbeOrderCancelRequest {
    pub(crate) fn new(pool: &BufferPool) -> Self {
        Self {
            buffer: framed_buffer(
                pool,
                template::ORDER_CANCEL_REQUEST,
                block::ORDER_CANCEL_REQUEST,
            ),
        }
    }

    #[inline]
    fn block(&mut self) -> &mut [u8] {
        &mut self.buffer.buf_mut()[BLOCK_OFFSET..]
    }
}

impl MutableMessage for SbeOrderCancelRequest {
    fn into_buffer(self: Box<Self>) -> PooledBuffer {
        self.buffer
    }
}

impl MutableOrderCancelRequest for SbeOrderCancelRequest {
    fn set_cl_ord_id(&mut self, cl_ord_id: ClOrdId) {
        wire::put_padded(&mut self.block()[0..16], cl_ord_id.as_str());
    }

    fn set_symbol(&mut self, symbol: Symbol) {
        wire::put_padded(&mut self.block()[16..24], symbol.as_str());
    }

    fn set_side(&mut self, side: Side) {
        self.block()[24] = side as u8;
    }

    fn set_transact_time(&mut self, time: Timestamp) {
        wire::put_u64(self.block(), 25, time.as_nanos());
    }
}

/// Factory for SBE request builders.
///
/// Shareable across threads; every call hands out a fresh builder backed
/// by a pool region owned by the caller.
#[derive(Debug, Clone)]
pub struct SbeRequestMessageFactory {
    pool: BufferPool,
}

impl SbeRequestMessageFactory {
    /// Creates a factory drawing regions from `pool`.
    #[must_use]
    pub fn new(pool: BufferPool) -> Self {
        Self { pool }
    }
}

impl RequestMessageFactory for SbeRequestMessageFactory {
    fn new_order_single(&self) -> Box<dyn MutableNewOrderSingle> {
        Box::new(SbeNewOrderSingle::new(&self.pool))
    }

    fn order_cancel_request(&self) -> Box<dyn MutableOrderCancelRequest> {
        Box::new(SbeOrderCancelRequest::new(&self.pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{get_i64, get_u16, get_u32, get_u64};

    fn factory() -> (BufferPool, SbeRequestMessageFactory) {
        let pool = BufferPool::new();
        (pool.clone(), SbeRequestMessageFactory::new(pool))
    }

    #[test]
    fn test_new_order_single_layout() {
        let (_pool, factory) = factory();

        let mut order = factory.new_order_single();
        order.set_cl_ord_id(ClOrdId::new("ORD-1").unwrap());
        order.set_symbol(Symbol::new("MSFT").unwrap());
        order.set_side(Side::Buy);
        order.set_order_qty(100);
        order.set_price(Price::from_mantissa(387_250));
        order.set_ord_type(OrdType::Limit);
        order.set_transact_time(Timestamp::from_nanos(42));

        let buffer = order.into_buffer();
        let frame = buffer.as_slice();

        assert_eq!(frame.len(), BLOCK_OFFSET + block::NEW_ORDER_SINGLE as usize);
        // Session header is left for the session to stamp.
        assert_eq!(get_u64(frame, 0), 0);
        assert_eq!(get_u16(frame, 8), block::NEW_ORDER_SINGLE);
        assert_eq!(get_u16(frame, 10), template::NEW_ORDER_SINGLE);
        assert_eq!(get_u16(frame, 12), crate::wire::SCHEMA_ID);

        let body = &frame[BLOCK_OFFSET..];
        assert_eq!(&body[0..5], b"ORD-1");
        assert_eq!(&body[16..20], b"MSFT");
        assert_eq!(body[24], Side::Buy as u8);
        assert_eq!(get_u32(body, 25), 100);
        assert_eq!(get_i64(body, 29), 387_250);
        assert_eq!(body[37], OrdType::Limit as u8);
        assert_eq!(get_u64(body, 38), 42);
    }

    #[test]
    fn test_order_cancel_request_layout() {
        let (_pool, factory) = factory();

        let mut cancel = factory.order_cancel_request();
        cancel.set_cl_ord_id(ClOrdId::new("CXL-1").unwrap());
        cancel.set_symbol(Symbol::new("MSFT").unwrap());
        cancel.set_side(Side::Sell);
        cancel.set_transact_time(Timestamp::from_nanos(7));

        let buffer = cancel.into_buffer();
        let frame = buffer.as_slice();

        assert_eq!(
            frame.len(),
            BLOCK_OFFSET + block::ORDER_CANCEL_REQUEST as usize
        );
        assert_eq!(get_u16(frame, 10), template::ORDER_CANCEL_REQUEST);

        let body = &frame[BLOCK_OFFSET..];
        assert_eq!(&body[0..5], b"CXL-1");
        assert_eq!(body[24], Side::Sell as u8);
        assert_eq!(get_u64(body, 25), 7);
    }

    #[test]
    fn test_dropped_builder_returns_region_to_pool() {
        let (pool, factory) = factory();

        let order = factory.new_order_single();
        assert_eq!(pool.free_count(), 0);
        drop(order);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_builders_reuse_pool_regions() {
        let (pool, factory) = factory();

        drop(factory.new_order_single());
        assert_eq!(pool.free_count(), 1);

        // The next builder reuses the recycled region.
        let order = factory.new_order_single();
        assert_eq!(pool.free_count(), 0);
        drop(order);
    }
}
