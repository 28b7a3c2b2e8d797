//! XOR distance over the identifier space.
//!
//! The distance between two identifiers is the big-endian integer cast of
//! their bitwise XOR. It satisfies identity-of-indiscernibles and symmetry,
//! which is all the routing logic requires (no triangle inequality).

use std::cmp::Ordering;

use alloy_primitives::U256;

use crate::{NodeId, KEY_SIZE_BYTES};

/// Returns the XOR distance between `x` and `y` as a big-endian integer.
#[inline(always)]
pub fn distance(x: &NodeId, y: &NodeId) -> U256 {
    let mut result = [0u8; KEY_SIZE_BYTES];

    for (i, (&a, &b)) in x.as_bytes().iter().zip(y.as_bytes().iter()).enumerate() {
        result[i] = a ^ b;
    }

    U256::from_be_slice(&result)
}

/// Compares `x` and `y` by XOR distance to `target`.
///
/// Returns:
///   - `Ordering::Less` if `x` is closer to `target` than `y`
///   - `Ordering::Equal` if `x` and `y` are equidistant from `target`
///     (which means `x` and `y` are the same identifier)
///   - `Ordering::Greater` if `x` is farther from `target` than `y`
#[inline(always)]
pub fn distance_cmp(target: &NodeId, x: &NodeId, y: &NodeId) -> Ordering {
    let (tb, xb, yb) = (target.as_bytes(), x.as_bytes(), y.as_bytes());

    for i in 0..KEY_SIZE_BYTES {
        let dx = xb[i] ^ tb[i];
        let dy = yb[i] ^ tb[i];

        if dx != dy {
            return dx.cmp(&dy);
        }
    }

    Ordering::Equal
}

/// Returns true iff `x` is strictly closer to `target` than `y`, i.e.
/// `(x ^ target) < (y ^ target)` under unsigned big-endian comparison.
#[inline(always)]
pub fn closer_to_target(x: &NodeId, y: &NodeId, target: &NodeId) -> bool {
    distance_cmp(target, x, y) == Ordering::Less
}
