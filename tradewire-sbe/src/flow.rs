/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session-control framer.
//!
//! Encodes the client-side session-control messages as complete frames and
//! classifies inbound frames into control messages or sequenced
//! application payloads. Control frames carry a zero session header; only
//! application frames are sequenced.

use crate::wire::{self, block, template, MessageHeader, BLOCK_OFFSET};
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;
use tradewire_core::error::MessageError;
use tradewire_core::message::{control, read_seq_no, SessionFrame, SessionMessenger};
use tradewire_core::types::{SeqNum, SessionId, Timestamp};
use tradewire_core::SESSION_HEADER_LEN;

/// SBE session-control framer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SbeSessionMessenger;

impl SbeSessionMessenger {
    /// Creates a new framer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn control_frame(
    template_id: u16,
    block_length: u16,
    fill: impl FnOnce(&mut BytesMut),
) -> Bytes {
    let total = BLOCK_OFFSET + block_length as usize;
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u64_le(0);
    MessageHeader::for_template(template_id, block_length).write(&mut buf);
    fill(&mut buf);
    debug_assert_eq!(buf.len(), total);
    buf.freeze()
}

impl SessionMessenger for SbeSessionMessenger {
    fn encode_negotiate(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        keepalive: Duration,
    ) -> Bytes {
        control_frame(template::NEGOTIATE, block::NEGOTIATE, |buf| {
            buf.put_slice(session_id.as_bytes());
            buf.put_u64_le(timestamp.as_nanos());
            buf.put_u32_le(keepalive.as_millis() as u32);
        })
    }

    fn encode_establish(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        keepalive: Duration,
        next_seq_no: SeqNum,
    ) -> Bytes {
        control_frame(template::ESTABLISH, block::ESTABLISH, |buf| {
            buf.put_slice(session_id.as_bytes());
            buf.put_u64_le(timestamp.as_nanos());
            buf.put_u32_le(keepalive.as_millis() as u32);
            buf.put_u64_le(next_seq_no.value());
        })
    }

    fn encode_sequence(&self, next_seq_no: SeqNum) -> Bytes {
        control_frame(template::SEQUENCE, block::SEQUENCE, |buf| {
            buf.put_u64_le(next_seq_no.value());
        })
    }

    fn encode_terminate(&self, session_id: SessionId, code: u8) -> Bytes {
        control_frame(template::TERMINATE, block::TERMINATE, |buf| {
            buf.put_slice(session_id.as_bytes());
            buf.put_u8(code);
        })
    }

    fn encode_retransmit_request(
        &self,
        session_id: SessionId,
        timestamp: Timestamp,
        from_seq_no: SeqNum,
        count: u32,
    ) -> Bytes {
        control_frame(
            template::RETRANSMIT_REQUEST,
            block::RETRANSMIT_REQUEST,
            |buf| {
                buf.put_slice(session_id.as_bytes());
                buf.put_u64_le(timestamp.as_nanos());
                buf.put_u64_le(from_seq_no.value());
                buf.put_u32_le(count);
            },
        )
    }

    fn encode_retransmission(
        &self,
        session_id: SessionId,
        request_timestamp: Timestamp,
        next_seq_no: SeqNum,
        count: u32,
    ) -> Bytes {
        control_frame(template::RETRANSMISSION, block::RETRANSMISSION, |buf| {
            buf.put_slice(session_id.as_bytes());
            buf.put_u64_le(request_timestamp.as_nanos());
            buf.put_u64_le(next_seq_no.value());
            buf.put_u32_le(count);
        })
    }

    fn decode_frame<'a>(&self, frame: &'a [u8]) -> Result<SessionFrame<'a>, MessageError> {
        let seq_no = read_seq_no(frame)?;
        let header = MessageHeader::read(&frame[SESSION_HEADER_LEN..])?;

        if header.schema_id != wire::SCHEMA_ID {
            return Err(MessageError::UnknownSchema {
                expected: wire::SCHEMA_ID,
                actual: header.schema_id,
            });
        }

        wire::require(&frame[BLOCK_OFFSET..], header.block_length as usize)?;
        let body = &frame[BLOCK_OFFSET..BLOCK_OFFSET + header.block_length as usize];

        let expect_block = |minimum: u16| -> Result<(), MessageError> {
            wire::require(body, minimum as usize)
        };

        match header.template_id {
            template::NEW_ORDER_SINGLE
            | template::EXECUTION_REPORT
            | template::ORDER_CANCEL_REQUEST
            | template::ORDER_CANCEL_REJECT => Ok(SessionFrame::Application {
                seq_no,
                payload: &frame[SESSION_HEADER_LEN..],
            }),
            template::NEGOTIATION_RESPONSE => {
                expect_block(block::NEGOTIATION_RESPONSE)?;
                Ok(SessionFrame::NegotiationResponse(
                    control::NegotiationResponse {
                        session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                        request_timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                    },
                ))
            }
            template::NEGOTIATION_REJECT => {
                expect_block(block::NEGOTIATION_REJECT)?;
                Ok(SessionFrame::NegotiationReject(control::NegotiationReject {
                    session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                    request_timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                    code: body[24],
                }))
            }
            template::ESTABLISHMENT_ACK => {
                expect_block(block::ESTABLISHMENT_ACK)?;
                Ok(SessionFrame::EstablishmentAck(control::EstablishmentAck {
                    session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                    request_timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                    keepalive_interval_ms: wire::get_u32(body, 24),
                    next_seq_no: SeqNum::new(wire::get_u64(body, 28)),
                }))
            }
            template::ESTABLISHMENT_REJECT => {
                expect_block(block::ESTABLISHMENT_REJECT)?;
                Ok(SessionFrame::EstablishmentReject(
                    control::EstablishmentReject {
                        session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                        request_timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                        code: body[24],
                    },
                ))
            }
            template::SEQUENCE => {
                expect_block(block::SEQUENCE)?;
                Ok(SessionFrame::Sequence(control::Sequence {
                    next_seq_no: SeqNum::new(wire::get_u64(body, 0)),
                }))
            }
            template::TERMINATE => {
                expect_block(block::TERMINATE)?;
                Ok(SessionFrame::Terminate(control::Terminate {
                    session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                    code: body[16],
                }))
            }
            template::RETRANSMIT_REQUEST => {
                expect_block(block::RETRANSMIT_REQUEST)?;
                Ok(SessionFrame::RetransmitRequest(control::RetransmitRequest {
                    session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                    timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                    from_seq_no: SeqNum::new(wire::get_u64(body, 24)),
                    count: wire::get_u32(body, 32),
                }))
            }
            template::RETRANSMISSION => {
                expect_block(block::RETRANSMISSION)?;
                Ok(SessionFrame::Retransmission(control::Retransmission {
                    session_id: SessionId::from_bytes(wire::get_id(body, 0)),
                    request_timestamp: Timestamp::from_nanos(wire::get_u64(body, 16)),
                    next_seq_no: SeqNum::new(wire::get_u64(body, 24)),
                    count: wire::get_u32(body, 32),
                }))
            }
            other => Err(MessageError::UnknownTemplate { template_id: other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messenger() -> SbeSessionMessenger {
        SbeSessionMessenger::new()
    }

    #[test]
    fn test_negotiate_frame_layout() {
        let session_id = SessionId::from_bytes([7u8; 16]);
        let frame = messenger().encode_negotiate(
            session_id,
            Timestamp::from_nanos(123),
            Duration::from_secs(10),
        );

        assert_eq!(frame.len(), BLOCK_OFFSET + block::NEGOTIATE as usize);
        assert_eq!(read_seq_no(&frame).unwrap(), SeqNum::new(0));

        let header = MessageHeader::read(&frame[SESSION_HEADER_LEN..]).unwrap();
        assert_eq!(header.template_id, template::NEGOTIATE);
        assert_eq!(header.schema_id, wire::SCHEMA_ID);

        let body = &frame[BLOCK_OFFSET..];
        assert_eq!(&body[0..16], &[7u8; 16]);
        assert_eq!(wire::get_u64(body, 16), 123);
        assert_eq!(wire::get_u32(body, 24), 10_000);
    }

    #[test]
    fn test_sequence_round_trip() {
        let frame = messenger().encode_sequence(SeqNum::new(42));

        match messenger().decode_frame(&frame).unwrap() {
            SessionFrame::Sequence(seq) => assert_eq!(seq.next_seq_no, SeqNum::new(42)),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_terminate_round_trip() {
        let session_id = SessionId::from_bytes([9u8; 16]);
        let frame = messenger().encode_terminate(session_id, 1);

        match messenger().decode_frame(&frame).unwrap() {
            SessionFrame::Terminate(terminate) => {
                assert_eq!(terminate.session_id, session_id);
                assert_eq!(terminate.code, 1);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_retransmit_request_round_trip() {
        let session_id = SessionId::from_bytes([3u8; 16]);
        let frame = messenger().encode_retransmit_request(
            session_id,
            Timestamp::from_nanos(55),
            SeqNum::new(5),
            2,
        );

        match messenger().decode_frame(&frame).unwrap() {
            SessionFrame::RetransmitRequest(request) => {
                assert_eq!(request.session_id, session_id);
                assert_eq!(request.from_seq_no, SeqNum::new(5));
                assert_eq!(request.count, 2);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_application_frame_classified_with_seq_no() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&9u64.to_le_bytes());
        let mut header = BytesMut::new();
        MessageHeader::for_template(template::EXECUTION_REPORT, 4).write(&mut header);
        frame.extend_from_slice(&header);
        frame.extend_from_slice(&[0u8; 4]);

        match messenger().decode_frame(&frame).unwrap() {
            SessionFrame::Application { seq_no, payload } => {
                assert_eq!(seq_no, SeqNum::new(9));
                // Payload starts at the message header.
                assert_eq!(wire::get_u16(payload, 2), template::EXECUTION_REPORT);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_foreign_schema() {
        let mut frame = messenger().encode_sequence(SeqNum::new(1)).to_vec();
        frame[SESSION_HEADER_LEN + 4..SESSION_HEADER_LEN + 6]
            .copy_from_slice(&77u16.to_le_bytes());

        assert_eq!(
            messenger().decode_frame(&frame).unwrap_err(),
            MessageError::UnknownSchema {
                expected: wire::SCHEMA_ID,
                actual: 77
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_template() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&0u64.to_le_bytes());
        let mut header = BytesMut::new();
        MessageHeader::for_template(99, 0).write(&mut header);
        frame.extend_from_slice(&header);

        assert_eq!(
            messenger().decode_frame(&frame).unwrap_err(),
            MessageError::UnknownTemplate { template_id: 99 }
        );
    }

    #[test]
    fn test_decode_rejects_truncated_frame() {
        let frame = messenger().encode_sequence(SeqNum::new(1));
        let err = messenger().decode_frame(&frame[..10]).unwrap_err();
        assert!(matches!(err, MessageError::Truncated { .. }));
    }
}
