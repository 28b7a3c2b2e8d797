//! Error types for identifier construction and decoding.

use crate::KEY_SIZE_BYTES;

/// Errors from [`NodeId`](crate::NodeId) construction and decoding.
///
/// All of these are reported synchronously to the constructing caller; no
/// partially-valid identifier is ever produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentifierError {
    /// Decoded or supplied bytes are not exactly [`KEY_SIZE_BYTES`] long.
    #[error("invalid identifier length: expected {KEY_SIZE_BYTES} bytes, got {actual}")]
    InvalidLength {
        /// Number of bytes actually supplied.
        actual: usize,
    },

    /// `from_power_of_two` called with an exponent outside the id space.
    #[error("power {power} out of range for a {bits}-bit identifier space")]
    PowerOutOfRange {
        /// The requested exponent.
        power: u16,
        /// Bit width of the identifier space.
        bits: usize,
    },

    /// Malformed hex text.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Malformed base32 text (wrong alphabet or padding).
    #[error("invalid base32 encoding: {0}")]
    InvalidBase32(#[from] data_encoding::DecodeError),

    /// Malformed base64 text (wrong alphabet or padding).
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
