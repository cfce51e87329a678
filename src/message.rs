//! Community-based SNMP message format (v1/v2c).
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! SNMPv3 messages share only the outer SEQUENCE and the version field; they
//! are recognised so the caller can drop them with a precise reason.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::{Pdu, PduType, TrapV1Pdu};
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;

/// PDU carried by a community message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePdu {
    /// SNMPv1 Trap-PDU.
    TrapV1(TrapV1Pdu),
    /// Any PDU with the generic request-id layout.
    Generic(Pdu),
}

impl MessagePdu {
    /// PDU type tag.
    pub fn pdu_type(&self) -> PduType {
        match self {
            MessagePdu::TrapV1(_) => PduType::TrapV1,
            MessagePdu::Generic(pdu) => pdu.pdu_type,
        }
    }

    /// Variable bindings in wire order.
    pub fn varbinds(&self) -> &[VarBind] {
        match self {
            MessagePdu::TrapV1(pdu) => &pdu.varbinds,
            MessagePdu::Generic(pdu) => &pdu.varbinds,
        }
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            MessagePdu::TrapV1(pdu) => pdu.encode(buf),
            MessagePdu::Generic(pdu) => pdu.encode(buf),
        }
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        match decoder.peek_tag() {
            Some(tag::pdu::TRAP_V1) => Ok(MessagePdu::TrapV1(TrapV1Pdu::decode(decoder)?)),
            Some(_) => Ok(MessagePdu::Generic(Pdu::decode(decoder)?)),
            None => Err(Error::decode(decoder.offset(), DecodeErrorKind::MissingPdu)),
        }
    }
}

impl From<TrapV1Pdu> for MessagePdu {
    fn from(pdu: TrapV1Pdu) -> Self {
        MessagePdu::TrapV1(pdu)
    }
}

impl From<Pdu> for MessagePdu {
    fn from(pdu: Pdu) -> Self {
        MessagePdu::Generic(pdu)
    }
}

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c)
    pub version: Version,
    /// Community string
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: MessagePdu,
}

impl CommunityMessage {
    /// Create a V1 message.
    pub fn v1(community: impl Into<Bytes>, pdu: impl Into<MessagePdu>) -> Self {
        Self {
            version: Version::V1,
            community: community.into(),
            pdu: pdu.into(),
        }
    }

    /// Create a V2c message.
    pub fn v2c(community: impl Into<Bytes>, pdu: impl Into<MessagePdu>) -> Self {
        Self {
            version: Version::V2c,
            community: community.into(),
            pdu: pdu.into(),
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }
}

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// SNMPv1 or SNMPv2c message.
    Community(CommunityMessage),
    /// SNMPv3 message; the body is not parsed.
    V3,
}

impl Message {
    /// Decode one datagram.
    ///
    /// The whole buffer must be consumed by the outer SEQUENCE.
    pub fn decode(data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::decode(0, DecodeErrorKind::EmptyMessage));
        }

        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        if !decoder.is_empty() {
            return Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: decoder.remaining(),
                },
            ));
        }

        let version_offset = seq.offset();
        let version_num = seq.read_integer()?;
        let version = Version::from_i32(version_num).ok_or_else(|| {
            Error::decode(version_offset, DecodeErrorKind::UnknownVersion(version_num))
        })?;

        if !version.is_community() {
            return Ok(Message::V3);
        }

        let community = seq.read_octet_string()?;
        let pdu = MessagePdu::decode(&mut seq)?;

        Ok(Message::Community(CommunityMessage {
            version,
            community,
            pdu,
        }))
    }
}
