//! BER length encoding and decoding.
//!
//! Short form covers 0..=127 in a single octet. Long form is `0x80 | n`
//! followed by `n` big-endian length octets. Indefinite form (`0x80` alone)
//! is never valid in SNMP.

use crate::error::{DecodeErrorKind, Error, Result};

/// Maximum number of length octets accepted in long form.
pub const MAX_LENGTH_OCTETS: usize = 4;

/// Encode a length for the reverse encode buffer.
///
/// Returns a stack array and the number of valid bytes. The valid bytes are
/// at the START of the array, in reverse (prepend) order.
pub fn encode_length(len: usize) -> ([u8; 9], usize) {
    let mut out = [0u8; 9];

    if len < 0x80 {
        out[0] = len as u8;
        return (out, 1);
    }

    let mut remaining = len;
    let mut count = 0;
    while remaining > 0 {
        out[count] = (remaining & 0xFF) as u8;
        remaining >>= 8;
        count += 1;
    }
    out[count] = 0x80 | count as u8;
    (out, count + 1)
}

/// Decode a length starting at `data[0]`.
///
/// `offset` is the absolute position of `data[0]`, used for error reporting.
/// Returns the decoded length and the number of octets consumed.
pub fn decode_length(data: &[u8], offset: usize) -> Result<(usize, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| Error::decode(offset, DecodeErrorKind::TruncatedData))?;

    if first < 0x80 {
        return Ok((first as usize, 1));
    }

    if first == 0x80 {
        return Err(Error::decode(offset, DecodeErrorKind::IndefiniteLength));
    }

    let octets = (first & 0x7F) as usize;
    if octets > MAX_LENGTH_OCTETS {
        return Err(Error::decode(offset, DecodeErrorKind::LengthTooLong { octets }));
    }
    if data.len() < 1 + octets {
        return Err(Error::decode(offset, DecodeErrorKind::TruncatedData));
    }

    // Non-minimal long forms (e.g. 0x81 0x05) are accepted, as net-snmp does.
    let len = data[1..=octets]
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);

    Ok((len, 1 + octets))
}
