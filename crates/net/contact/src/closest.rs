//! Closeness predicates and collection helpers over contacts.
//!
//! These free functions are the glue between the identifier algebra in
//! `meridian-primitives` and whatever routing structure holds contacts.
//! Address-only contacts (no identifier) are treated as farthest from every
//! target: any identified node is closer than an address-only contact, and
//! an address-only contact is never closer than anything.

use meridian_primitives::{distance_cmp, NodeId};
use std::cmp::Ordering;

use crate::Contact;

/// Returns true iff `node_id` is closer to `target` than `contact`.
pub fn closer_to_target(node_id: &NodeId, contact: &Contact, target: &NodeId) -> bool {
    match contact.node_id() {
        Some(contact_id) => distance_cmp(target, node_id, contact_id) == Ordering::Less,
        None => true,
    }
}

/// Returns true iff `contact1` is closer to `target` than `contact2`.
pub fn contact_closer_to_target(contact1: &Contact, contact2: &Contact, target: &NodeId) -> bool {
    match (contact1.node_id(), contact2.node_id()) {
        (Some(id1), Some(id2)) => distance_cmp(target, id1, id2) == Ordering::Less,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Returns true iff `node_id` belongs among the current closest candidates:
/// vacuously for an empty candidate set, otherwise iff it is closer to
/// `target` than the farthest candidate.
///
/// This is purely a distance comparison; enforcing the group-size limit (k)
/// on `candidates` is the caller's responsibility and happens before this
/// call.
pub fn node_within_closest(node_id: &NodeId, candidates: &[Contact], target: &NodeId) -> bool {
    let farthest = candidates
        .iter()
        .max_by(|a, b| match (a.node_id(), b.node_id()) {
            (Some(id_a), Some(id_b)) => distance_cmp(target, id_a, id_b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

    match farthest {
        Some(contact) => closer_to_target(node_id, contact, target),
        None => true,
    }
}

/// Removes every contact whose identifier equals `node_id`, preserving the
/// relative order of the remaining contacts. Returns whether any removal
/// occurred.
pub fn remove_contact(node_id: &NodeId, contacts: &mut Vec<Contact>) -> bool {
    let before = contacts.len();
    contacts.retain(|contact| contact.node_id() != Some(node_id));
    contacts.len() != before
}
