use std::fmt;

use alloy_primitives::{FixedBytes, U256, U512};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use data_encoding::BASE32;
use rand::RngCore;

use crate::{IdentifierError, KEY_SIZE_BITS, KEY_SIZE_BYTES};

/// Text encodings an identifier round-trips through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum IdEncoding {
    /// Lowercase hex, no prefix.
    Hex,
    /// RFC 4648 base32, padded.
    Base32,
    /// RFC 4648 base64, padded.
    Base64,
}

/// A 160-bit overlay identifier.
///
/// Identifiers are opaque fixed-width values ordered as unsigned big-endian
/// integers. The XOR of two identifiers is the overlay's distance function;
/// see [`distance`](crate::distance) and [`closer_to_target`](crate::closer_to_target).
///
/// A `NodeId` is always exactly [`KEY_SIZE_BYTES`] bytes: fallible input
/// paths ([`from_slice`](Self::from_slice), [`from_encoded`](Self::from_encoded))
/// reject wrong-length or malformed input, so a wrong-length identifier is
/// unrepresentable and never reaches a distance comparison.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(FixedBytes<KEY_SIZE_BYTES>);

impl NodeId {
    /// The all-zero identifier.
    pub const ZERO: Self = Self(FixedBytes::ZERO);

    /// The maximum identifier, `2^KEY_SIZE_BITS - 1`.
    pub const MAX: Self = Self(FixedBytes([u8::MAX; KEY_SIZE_BYTES]));

    /// Returns a uniformly random identifier over the full space.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(FixedBytes(bytes))
    }

    /// Returns the identifier `2^power`.
    ///
    /// Fails with [`IdentifierError::PowerOutOfRange`] for
    /// `power >= KEY_SIZE_BITS`; the exponent is never clamped or wrapped.
    pub fn from_power_of_two(power: u16) -> Result<Self, IdentifierError> {
        if usize::from(power) >= KEY_SIZE_BITS {
            return Err(IdentifierError::PowerOutOfRange {
                power,
                bits: KEY_SIZE_BITS,
            });
        }
        let mut bytes = [0u8; KEY_SIZE_BYTES];
        bytes[KEY_SIZE_BYTES - 1 - usize::from(power) / 8] = 1 << (power % 8);
        Ok(Self(FixedBytes(bytes)))
    }

    /// Constructs an identifier from raw bytes, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentifierError> {
        if bytes.len() != KEY_SIZE_BYTES {
            return Err(IdentifierError::InvalidLength {
                actual: bytes.len(),
            });
        }
        Ok(Self(FixedBytes::from_slice(bytes)))
    }

    /// Decodes an identifier from encoded text.
    ///
    /// Fails on malformed text (wrong alphabet, wrong padding) or a decoded
    /// length other than [`KEY_SIZE_BYTES`]; never silently produces a zero
    /// or garbage identifier.
    pub fn from_encoded(text: &str, encoding: IdEncoding) -> Result<Self, IdentifierError> {
        let raw = match encoding {
            IdEncoding::Hex => hex::decode(text)?,
            IdEncoding::Base32 => BASE32.decode(text.as_bytes())?,
            IdEncoding::Base64 => BASE64.decode(text)?,
        };
        Self::from_slice(&raw)
    }

    /// Returns a uniformly random identifier `v` with `low <= v <= high`
    /// under the natural unsigned ordering.
    ///
    /// The bounds may be supplied in either order; they are canonicalised
    /// internally.
    pub fn random_in_range(a: &Self, b: &Self) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low = U256::from_be_slice(low.as_slice());
        let high = U256::from_be_slice(high.as_slice());
        let span = high - low;
        if span == U256::ZERO {
            return Self::from_u256(low);
        }

        // Sample 512 bits and reduce modulo the inclusive span; the bias of
        // the reduction is on the order of 2^-352, below observability.
        let modulus = U512::from(span) + U512::from(1u64);
        let mut wide = [0u8; 64];
        rand::rng().fill_bytes(&mut wide);
        let offset = U512::from_be_bytes(wide) % modulus;

        Self::from_u256(low + offset.to::<U256>())
    }

    /// XOR distance composition with another identifier.
    pub fn xor(&self, other: &Self) -> Self {
        *self ^ *other
    }

    /// Encodes the raw bytes per the requested scheme.
    pub fn to_encoded(&self, encoding: IdEncoding) -> String {
        match encoding {
            IdEncoding::Hex => hex::encode(self.0),
            IdEncoding::Base32 => BASE32.encode(self.as_slice()),
            IdEncoding::Base64 => BASE64.encode(self.as_slice()),
        }
    }

    /// The raw byte representation.
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE_BYTES] {
        &self.0 .0
    }

    /// The raw bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// The raw bytes as an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    fn from_u256(value: U256) -> Self {
        let bytes: [u8; 32] = value.to_be_bytes();
        // A value bounded by a valid identifier fits in the low 20 bytes.
        Self(FixedBytes::from_slice(&bytes[32 - KEY_SIZE_BYTES..]))
    }
}

impl From<[u8; KEY_SIZE_BYTES]> for NodeId {
    fn from(bytes: [u8; KEY_SIZE_BYTES]) -> Self {
        Self(FixedBytes(bytes))
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::ops::BitXor for NodeId {
    type Output = NodeId;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

/// Abbreviated hex prefix for logs; purely diagnostic.
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..", hex::encode(&self.as_slice()[..4]))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(self.0))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_encoded(IdEncoding::Base64))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_encoded(&text, IdEncoding::Base64).map_err(serde::de::Error::custom)
    }
}
