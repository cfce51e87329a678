//! BER decoding.
//!
//! [`Decoder`] walks a [`Bytes`] buffer without copying: octet strings and
//! nested TLVs are returned as cheap slices of the original datagram.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Cursor over BER-encoded data.
///
/// Offsets in errors are absolute positions within the outermost buffer,
/// including for decoders obtained through [`read_sequence`](Self::read_sequence).
#[derive(Debug, Clone)]
pub struct Decoder {
    data: Bytes,
    pos: usize,
    base: usize,
}

impl Decoder {
    /// Create a decoder over a complete buffer.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Look at the next tag without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read a single tag octet.
    pub fn read_tag(&mut self) -> Result<u8> {
        let tag = self
            .peek_tag()
            .ok_or_else(|| Error::decode(self.offset(), DecodeErrorKind::TruncatedData))?;
        self.pos += 1;
        Ok(tag)
    }

    /// Read a length and check it fits in the remaining data.
    pub fn read_length(&mut self) -> Result<usize> {
        let offset = self.offset();
        let (len, consumed) = decode_length(&self.data[self.pos..], offset)?;
        self.pos += consumed;
        if len > self.remaining() {
            return Err(Error::decode(offset, DecodeErrorKind::TlvOverflow));
        }
        Ok(len)
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len > self.remaining() {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available: self.remaining(),
                },
            ));
        }
        let bytes = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(bytes)
    }

    /// Read a tag, require it to equal `expected`, and return the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let offset = self.offset();
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(Error::decode(
                offset,
                DecodeErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        self.read_length()
    }

    /// Split off the next `len` bytes as an independent decoder.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder { data, pos: 0, base })
    }

    /// Read a constructed TLV with the given tag and return a decoder over its contents.
    pub fn read_constructed(&mut self, tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(tag)?;
        self.sub_decoder(len)
    }

    /// Read a SEQUENCE and return a decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read an INTEGER.
    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read the content octets of a signed 32-bit integer.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        let offset = self.offset();
        if len == 0 {
            return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
        }
        let bytes = self.read_bytes(len)?;
        let negative = bytes[0] & 0x80 != 0;

        // Accept redundant sign-extension octets beyond four bytes.
        let (extra, significant) = bytes.split_at(len.saturating_sub(4));
        let fill = if negative { 0xFF } else { 0x00 };
        let sign_flips = !extra.is_empty() && (significant[0] & 0x80 != 0) != negative;
        if sign_flips || extra.iter().any(|b| *b != fill) {
            return Err(Error::decode(offset, DecodeErrorKind::IntegerOverflow));
        }

        let init: i32 = if negative { -1 } else { 0 };
        Ok(significant
            .iter()
            .fold(init, |acc, b| (acc << 8) | *b as i32))
    }

    /// Read the content octets of an unsigned 32-bit value
    /// (Counter32, Gauge32, TimeTicks).
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let offset = self.offset();
        if len == 0 {
            return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
        }
        let bytes = self.read_bytes(len)?;
        let (extra, significant) = bytes.split_at(len.saturating_sub(4));
        if extra.iter().any(|b| *b != 0) {
            return Err(Error::decode(offset, DecodeErrorKind::IntegerOverflow));
        }
        Ok(significant.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
    }

    /// Read the content octets of a Counter64.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        let offset = self.offset();
        if len == 0 {
            return Err(Error::decode(offset, DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 9 {
            return Err(Error::decode(
                offset,
                DecodeErrorKind::Integer64TooLong { length: len },
            ));
        }
        let bytes = self.read_bytes(len)?;
        if len == 9 && bytes[0] != 0 {
            return Err(Error::decode(offset, DecodeErrorKind::IntegerOverflow));
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<()> {
        let offset = self.offset();
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(Error::decode(offset, DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read the content octets of an OBJECT IDENTIFIER.
    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let offset = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|e| match e {
            Error::Decode { kind, .. } => Error::decode(offset, kind),
            other => other,
        })
    }

    /// Read an IpAddress (application tag 0, exactly four octets).
    pub fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let offset = self.offset();
        let len = self.expect_tag(tag::application::IP_ADDRESS)?;
        if len != 4 {
            return Err(Error::decode(
                offset,
                DecodeErrorKind::InvalidIpAddressLength { length: len },
            ));
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}
