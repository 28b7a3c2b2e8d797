//! Identifier-space primitives for the meridian overlay.
//!
//! Every participant in the overlay is addressed by a [`NodeId`]: a
//! fixed-width 160-bit value ordered as an unsigned big-endian integer.
//! Distance between two identifiers is their bitwise XOR, and every routing
//! decision (bucket placement, nearest-node selection, group membership)
//! reduces to comparisons of those distances.
//!
//! - [`NodeId`] - the identifier type and its constructors/encodings
//! - [`distance()`](distance::distance) - XOR distance as a [`U256`](alloy_primitives::U256)
//! - [`closer_to_target`] - the pairwise closeness predicate
//! - [`IdentifierError`] - synchronous construction/decoding failures

mod error;
mod node_id;

pub mod distance;

pub use distance::{closer_to_target, distance, distance_cmp};
pub use error::IdentifierError;
pub use node_id::{IdEncoding, NodeId};

/// Byte width of a [`NodeId`].
pub const KEY_SIZE_BYTES: usize = 20;

/// Bit width of the identifier space.
pub const KEY_SIZE_BITS: usize = KEY_SIZE_BYTES * 8;

/// The all-zero identifier.
pub const ZERO_ID: NodeId = NodeId::ZERO;
