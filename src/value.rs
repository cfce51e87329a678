//! SNMP value types.
//!
//! [`Value`] covers every SMIv2 scalar carried in a notification plus the
//! three exception values. Its [`Display`](std::fmt::Display) implementation
//! is the canonical textual form written into events.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;
use std::fmt;

const TICKS_PER_DAY: u32 = 8_640_000;
const TICKS_PER_HOUR: u32 = 360_000;
const TICKS_PER_MINUTE: u32 = 6_000;

/// SNMP value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING
    OctetString(Bytes),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// IpAddress
    IpAddress([u8; 4]),
    /// Counter32
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks, in hundredths of a second.
    TimeTicks(u32),
    /// Opaque (legacy wrapper around arbitrary bytes)
    Opaque(Bytes),
    /// Counter64
    Counter64(u64),
    /// noSuchObject exception
    NoSuchObject,
    /// noSuchInstance exception
    NoSuchInstance,
    /// endOfMibView exception
    EndOfMibView,
    /// Any other tag, kept verbatim.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Returns the value for [`Value::Integer`].
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of any unsigned 32-bit kind.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the raw bytes of an OCTET STRING or Opaque.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value for [`Value::ObjectIdentifier`].
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Returns the address for [`Value::IpAddress`].
    pub fn as_ip(&self) -> Option<std::net::Ipv4Addr> {
        match self {
            Value::IpAddress(bytes) => Some(std::net::Ipv4Addr::from(*bytes)),
            _ => None,
        }
    }

    /// Check if this is an exception value.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Name of the SMI type, as used in trap renderings.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::OctetString(_) => "OctetString",
            Value::Null => "Null",
            Value::ObjectIdentifier(_) => "ObjectId",
            Value::IpAddress(_) => "IpAddress",
            Value::Counter32(_) => "Counter32",
            Value::Gauge32(_) => "Gauge32",
            Value::TimeTicks(_) => "TimeTicks",
            Value::Opaque(_) => "Opaque",
            Value::Counter64(_) => "Counter64",
            Value::NoSuchObject => "NoSuchObject",
            Value::NoSuchInstance => "NoSuchInstance",
            Value::EndOfMibView => "EndOfMibView",
            Value::Unknown { .. } => "Unknown",
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => buf.push_primitive(tag::application::OPAQUE, data),
            Value::Counter64(v) => buf.push_counter64(*v),
            Value::NoSuchObject => buf.push_primitive(tag::context::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => buf.push_primitive(tag::context::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => buf.push_primitive(tag::context::END_OF_MIB_VIEW, &[]),
            Value::Unknown { tag, data } => buf.push_primitive(*tag, data),
        }
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::decode(offset, DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::decode(
                        offset,
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_integer64_value(len)?))
            }
            tag::context::NO_SUCH_OBJECT => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                decoder.read_bytes(len)?;
                Ok(Value::EndOfMibView)
            }
            tag::universal::OCTET_STRING_CONSTRUCTED => Err(Error::decode(
                offset,
                DecodeErrorKind::ConstructedOctetString,
            )),
            _ => Ok(Value::Unknown {
                tag,
                data: decoder.read_bytes(len)?,
            }),
        }
    }
}

/// Render TimeTicks as `HH:MM:SS.hh`, prefixed with the day count past 24 hours.
pub fn format_timeticks(ticks: u32) -> String {
    let days = ticks / TICKS_PER_DAY;
    let rem = ticks % TICKS_PER_DAY;
    let hours = rem / TICKS_PER_HOUR;
    let rem = rem % TICKS_PER_HOUR;
    let minutes = rem / TICKS_PER_MINUTE;
    let rem = rem % TICKS_PER_MINUTE;
    let seconds = rem / 100;
    let hundredths = rem % 100;

    let clock = format!(
        "{:02}:{:02}:{:02}.{:02}",
        hours, minutes, seconds, hundredths
    );
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
    for byte in data {
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => f.write_str(&String::from_utf8_lossy(data)),
            Value::Null => f.write_str("Null"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => f.write_str(&format_timeticks(*v)),
            Value::Opaque(data) => write_hex(f, data),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
            Value::Unknown { data, .. } => write_hex(f, data),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn roundtrip(value: Value) -> Value {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        Value::decode(&mut decoder).unwrap()
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Integer(111).to_string(), "111");
        assert_eq!(Value::Integer(-5).to_string(), "-5");
        assert_eq!(Value::Null.to_string(), "Null");
        assert_eq!(Value::IpAddress([192, 168, 1, 11]).to_string(), "192.168.1.11");
        assert_eq!(Value::from("linkDown").to_string(), "linkDown");
        assert_eq!(
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)).to_string(),
            "1.3.6.1.6.3.1.1.5.3"
        );
        assert_eq!(Value::Counter64(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(Value::NoSuchInstance.to_string(), "noSuchInstance");
    }

    #[test]
    fn test_display_timeticks() {
        assert_eq!(Value::TimeTicks(1011).to_string(), "00:00:10.11");
        assert_eq!(Value::TimeTicks(0).to_string(), "00:00:00.00");
        assert_eq!(Value::TimeTicks(8_639_999).to_string(), "23:59:59.99");
        assert_eq!(Value::TimeTicks(8_640_000).to_string(), "1 day, 00:00:00.00");
        assert_eq!(
            Value::TimeTicks(u32::MAX).to_string(),
            "497 days, 02:27:52.95"
        );
    }

    #[test]
    fn test_display_binary() {
        let bytes = Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(Value::Opaque(bytes.clone()).to_string(), "deadbeef");
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[b'a', 0xFF])).to_string(),
            "a\u{FFFD}"
        );
    }

    #[test]
    fn test_roundtrip_kinds() {
        for value in [
            Value::Integer(i32::MIN),
            Value::Null,
            Value::IpAddress([10, 0, 0, 1]),
            Value::Counter32(u32::MAX),
            Value::Gauge32(0),
            Value::TimeTicks(1011),
            Value::Counter64(1 << 40),
            Value::EndOfMibView,
            Value::Unknown {
                tag: 0x47,
                data: Bytes::from_static(&[1, 2]),
            },
        ] {
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn test_reject_constructed_octet_string() {
        let mut decoder = Decoder::new(Bytes::from_static(&[0x24, 0x03, 0x04, 0x01, 0x41]));
        assert!(matches!(
            Value::decode(&mut decoder),
            Err(Error::Decode {
                kind: DecodeErrorKind::ConstructedOctetString,
                ..
            })
        ));
    }

    #[test]
    fn test_reject_null_with_content() {
        let mut decoder = Decoder::new(Bytes::from_static(&[0x05, 0x01, 0x00]));
        assert!(Value::decode(&mut decoder).is_err());
    }
}
