/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Response views over inbound application payloads.
//!
//! The factory validates the message header, then lays a typed read-only
//! view over the fixed block. Views borrow from the dispatch buffer and
//! must not be retained past the dispatch callback.

use crate::wire::{self, block, template, MessageHeader, MESSAGE_HEADER_LEN, SCHEMA_ID};
use num_traits::FromPrimitive;
use tradewire_core::error::MessageError;
use tradewire_core::message::{
    ExecutionReport, OrderCancelReject, Response, ResponseMessageFactory,
};
use tradewire_core::types::{CxlRejReason, ExecType, OrdStatus, Price, Side, Timestamp};

/// Factory producing SBE response views.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbeResponseMessageFactory;

impl SbeResponseMessageFactory {
    /// Creates a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResponseMessageFactory for SbeResponseMessageFactory {
    fn wrap<'a>(&self, payload: &'a [u8]) -> Result<Response<'a>, MessageError> {
        let header = MessageHeader::read(payload)?;

        if header.schema_id != SCHEMA_ID {
            return Err(MessageError::UnknownSchema {
                expected: SCHEMA_ID,
                actual: header.schema_id,
            });
        }

        let needed = MESSAGE_HEADER_LEN + header.block_length as usize;
        wire::require(payload, needed)?;
        let body = &payload[MESSAGE_HEADER_LEN..needed];

        match header.template_id {
            template::EXECUTION_REPORT => {
                wire::require(body, block::EXECUTION_REPORT as usize)?;
                Ok(Response::ExecutionReport(decode_execution_report(body)?))
            }
            template::ORDER_CANCEL_REJECT => {
                wire::require(body, block::ORDER_CANCEL_REJECT as usize)?;
                Ok(Response::OrderCancelReject(decode_order_cancel_reject(
                    body,
                )?))
            }
            other => Err(MessageError::UnknownTemplate { template_id: other }),
        }
    }
}

fn decode_execution_report(body: &[u8]) -> Result<ExecutionReport<'_>, MessageError> {
    Ok(ExecutionReport {
        order_id: wire::get_padded(body, 0, 16, "order_id")?,
        cl_ord_id: wire::get_padded(body, 16, 16, "cl_ord_id")?,
        exec_id: wire::get_padded(body, 32, 16, "exec_id")?,
        exec_type: decode_enum(body[48], "exec_type", ExecType::from_u8)?,
        ord_status: decode_enum(body[49], "ord_status", OrdStatus::from_u8)?,
        symbol: wire::get_padded(body, 50, 8, "symbol")?,
        side: decode_enum(body[58], "side", Side::from_u8)?,
        leaves_qty: wire::get_u32(body, 59),
        cum_qty: wire::get_u32(body, 63),
        price: Price::from_mantissa(wire::get_i64(body, 67)),
        transact_time: Timestamp::from_nanos(wire::get_u64(body, 75)),
    })
}

fn decode_order_cancel_reject(body: &[u8]) -> Result<OrderCancelReject<'_>, MessageError> {
    Ok(OrderCancelReject {
        cl_ord_id: wire::get_padded(body, 0, 16, "cl_ord_id")?,
        order_id: wire::get_padded(body, 16, 16, "order_id")?,
        cxl_rej_reason: decode_enum(body[32], "cxl_rej_reason", CxlRejReason::from_u8)?,
        ord_status: decode_enum(body[33], "ord_status", OrdStatus::from_u8)?,
    })
}

fn decode_enum<T>(
    raw: u8,
    field: &'static str,
    from: impl FnOnce(u8) -> Option<T>,
) -> Result<T, MessageError> {
    from(raw).ok_or_else(|| MessageError::InvalidFieldValue {
        field,
        reason: format!("unrecognized discriminant {raw}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};

    fn execution_report_payload() -> Vec<u8> {
        let mut buf = BytesMut::new();
        MessageHeader::for_template(template::EXECUTION_REPORT, block::EXECUTION_REPORT)
            .write(&mut buf);

        let mut body = vec![0u8; block::EXECUTION_REPORT as usize];
        wire::put_padded(&mut body[0..16], "ORDER-9");
        wire::put_padded(&mut body[16..32], "ORD-1");
        wire::put_padded(&mut body[32..48], "EXEC-1");
        body[48] = ExecType::Fill as u8;
        body[49] = OrdStatus::Filled as u8;
        wire::put_padded(&mut body[50..58], "MSFT");
        body[58] = Side::Buy as u8;
        wire::put_u32(&mut body, 59, 0);
        wire::put_u32(&mut body, 63, 100);
        wire::put_i64(&mut body, 67, 387_250);
        wire::put_u64(&mut body, 75, 42);

        buf.put_slice(&body);
        buf.to_vec()
    }

    #[test]
    fn test_wrap_execution_report() {
        let payload = execution_report_payload();
        let factory = SbeResponseMessageFactory::new();

        let Response::ExecutionReport(report) = factory.wrap(&payload).unwrap() else {
            panic!("expected an execution report");
        };

        assert_eq!(report.order_id, "ORDER-9");
        assert_eq!(report.cl_ord_id, "ORD-1");
        assert_eq!(report.exec_id, "EXEC-1");
        assert_eq!(report.exec_type, ExecType::Fill);
        assert_eq!(report.ord_status, OrdStatus::Filled);
        assert_eq!(report.symbol, "MSFT");
        assert_eq!(report.side, Side::Buy);
        assert_eq!(report.leaves_qty, 0);
        assert_eq!(report.cum_qty, 100);
        assert_eq!(report.price, Price::from_mantissa(387_250));
        assert_eq!(report.transact_time, Timestamp::from_nanos(42));
    }

    #[test]
    fn test_wrap_order_cancel_reject() {
        let mut buf = BytesMut::new();
        MessageHeader::for_template(template::ORDER_CANCEL_REJECT, block::ORDER_CANCEL_REJECT)
            .write(&mut buf);

        let mut body = vec![0u8; block::ORDER_CANCEL_REJECT as usize];
        wire::put_padded(&mut body[0..16], "ORD-1");
        wire::put_padded(&mut body[16..32], "ORDER-9");
        body[32] = CxlRejReason::UnknownOrder as u8;
        body[33] = OrdStatus::Rejected as u8;
        buf.put_slice(&body);

        let factory = SbeResponseMessageFactory::new();
        let Response::OrderCancelReject(reject) = factory.wrap(&buf).unwrap() else {
            panic!("expected a cancel reject");
        };

        assert_eq!(reject.cl_ord_id, "ORD-1");
        assert_eq!(reject.order_id, "ORDER-9");
        assert_eq!(reject.cxl_rej_reason, CxlRejReason::UnknownOrder);
        assert_eq!(reject.ord_status, OrdStatus::Rejected);
    }

    #[test]
    fn test_wrap_rejects_foreign_schema() {
        let mut payload = execution_report_payload();
        // Overwrite the schema id field.
        payload[4..6].copy_from_slice(&99u16.to_le_bytes());

        let factory = SbeResponseMessageFactory::new();
        assert_eq!(
            factory.wrap(&payload).unwrap_err(),
            MessageError::UnknownSchema {
                expected: SCHEMA_ID,
                actual: 99
            }
        );
    }

    #[test]
    fn test_wrap_rejects_unknown_template() {
        let mut buf = BytesMut::new();
        MessageHeader::for_template(77, 4).write(&mut buf);
        buf.put_slice(&[0u8; 4]);

        let factory = SbeResponseMessageFactory::new();
        assert_eq!(
            factory.wrap(&buf).unwrap_err(),
            MessageError::UnknownTemplate { template_id: 77 }
        );
    }

    #[test]
    fn test_wrap_rejects_truncated_block() {
        let payload = execution_report_payload();
        let factory = SbeResponseMessageFactory::new();

        let err = factory.wrap(&payload[..20]).unwrap_err();
        assert!(matches!(err, MessageError::Truncated { .. }));
    }
}
