//! Object identifier type.
//!
//! OIDs are stored as a `SmallVec` of arcs; anything up to 16 arcs (which
//! covers nearly every trap and varbind OID seen in practice) stays inline.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Maximum number of arcs accepted when parsing or decoding.
pub const MAX_OID_LEN: usize = 128;

/// Object identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an OID from arcs.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse a dotted string such as `1.3.6.1.6.3.1.1.5.1`.
    ///
    /// A single leading dot is accepted.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs[0] > 2 {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::InvalidFirstArc(arcs[0]),
                s,
            ));
        }
        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// True for the zero-length OID.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `prefix` is a (non-strict) prefix of this OID.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// Append an arc, returning a new OID.
    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Self { arcs }
    }

    /// Decode BER content octets (tag and length already consumed).
    ///
    /// Error offsets are relative to the start of `data`.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();
        let mut pos = 0;

        while pos < data.len() {
            let start = pos;
            let mut value: u32 = 0;
            loop {
                let Some(&byte) = data.get(pos) else {
                    return Err(Error::decode(start, DecodeErrorKind::InvalidOidEncoding));
                };
                pos += 1;
                if value > (u32::MAX >> 7) {
                    return Err(Error::decode(start, DecodeErrorKind::InvalidOidEncoding));
                }
                value = (value << 7) | (byte & 0x7F) as u32;
                if byte & 0x80 == 0 {
                    break;
                }
            }

            if arcs.is_empty() {
                let (first, second) = match value {
                    0..=39 => (0, value),
                    40..=79 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(first);
                arcs.push(second);
            } else {
                arcs.push(value);
            }

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(
                    start,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                ));
            }
        }

        Ok(Self { arcs })
    }

    /// Encode to BER content octets.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut out = SmallVec::new();
        let (first, rest) = match self.arcs.as_slice() {
            [] => return out,
            [a] => (a.saturating_mul(40), &[][..]),
            [a, b, rest @ ..] => (a.saturating_mul(40).saturating_add(*b), rest),
        };

        push_subidentifier(&mut out, first);
        for arc in rest {
            push_subidentifier(&mut out, *arc);
        }
        out
    }
}

fn push_subidentifier(out: &mut SmallVec<[u8; 64]>, value: u32) {
    let mut tmp = [0u8; 5];
    let mut i = tmp.len();
    let mut v = value;
    loop {
        i -= 1;
        tmp[i] = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    let last = tmp.len() - 1;
    for (idx, byte) in tmp.iter().enumerate().skip(i) {
        if idx == last {
            out.push(*byte);
        } else {
            out.push(*byte | 0x80);
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::from_slice(&arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmptrap_input::oid;
///
/// let cold_start = oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1);
/// assert_eq!(cold_start.to_string(), "1.3.6.1.6.3.1.1.5.1");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let oid = Oid::parse("1.3.6.1.2.1.1.3.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 3, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.3.0");
        assert_eq!(Oid::parse(".1.3.6").unwrap(), oid!(1, 3, 6));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Oid::parse(""),
            Err(Error::InvalidOid {
                kind: OidErrorKind::Empty,
                ..
            })
        ));
        assert!(matches!(
            Oid::parse("1.3.x"),
            Err(Error::InvalidOid {
                kind: OidErrorKind::InvalidArc,
                ..
            })
        ));
        assert!(matches!(
            Oid::parse("1..3"),
            Err(Error::InvalidOid {
                kind: OidErrorKind::InvalidArc,
                ..
            })
        ));
        assert!(matches!(
            Oid::parse("3.1"),
            Err(Error::InvalidOid {
                kind: OidErrorKind::InvalidFirstArc(3),
                ..
            })
        ));
    }

    #[test]
    fn test_parse_too_many_arcs() {
        let long = vec!["1"; MAX_OID_LEN + 1].join(".");
        assert!(matches!(
            Oid::parse(&long),
            Err(Error::InvalidOid {
                kind: OidErrorKind::TooManyArcs { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_ber_encoding() {
        let oid = oid!(1, 3, 6, 1, 4, 1, 311);
        assert_eq!(
            oid.to_ber_smallvec().as_slice(),
            &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37]
        );
        assert_eq!(Oid::from_ber(&[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37]).unwrap(), oid);
    }

    #[test]
    fn test_ber_first_arc_two() {
        let oid = oid!(2, 100, 3);
        let ber = oid.to_ber_smallvec();
        assert_eq!(ber.as_slice(), &[0x81, 0x34, 0x03]);
        assert_eq!(Oid::from_ber(&ber).unwrap(), oid);
    }

    #[test]
    fn test_ber_truncated_subidentifier() {
        assert!(matches!(
            Oid::from_ber(&[0x2B, 0x86]),
            Err(Error::Decode {
                offset: 1,
                kind: DecodeErrorKind::InvalidOidEncoding
            })
        ));
    }

    #[test]
    fn test_ber_subidentifier_overflow() {
        assert!(Oid::from_ber(&[0x2B, 0x9F, 0xFF, 0xFF, 0xFF, 0x7F]).is_err());
        assert_eq!(
            Oid::from_ber(&[0x2B, 0x8F, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap(),
            oid!(1, 3, u32::MAX)
        );
    }

    #[test]
    fn test_starts_with_and_ordering() {
        let base = oid!(1, 3, 6, 1, 6, 3, 1, 1, 5);
        assert!(base.child(3).starts_with(&base));
        assert!(!base.starts_with(&base.child(3)));
        assert!(oid!(1, 3, 6, 1, 2) < oid!(1, 3, 6, 1, 10));
    }

    proptest! {
        #[test]
        fn prop_display_parse(first in 0u32..3, second in 0u32..40, rest in proptest::collection::vec(any::<u32>(), 0..20)) {
            let mut arcs = vec![first, second];
            arcs.extend(rest);
            let oid = Oid::new(arcs);
            prop_assert_eq!(Oid::parse(&oid.to_string()).unwrap(), oid.clone());
            prop_assert_eq!(Oid::from_ber(&oid.to_ber_smallvec()).unwrap(), oid);
        }

        #[test]
        fn prop_from_ber_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = Oid::from_ber(&data);
        }
    }
}
