//! Contact and endpoint model for the meridian overlay.
//!
//! A [`Contact`] binds an overlay identifier to the reachability information
//! needed to dial it: an external endpoint, local endpoints, an optional
//! rendezvous (relay) endpoint, and connectivity metadata. Construction is
//! validated so that no inconsistent contact can exist; the only mutation a
//! contact supports afterwards is preferred-endpoint selection.
//!
//! - [`Endpoint`] - opaque IP + port value type
//! - [`Contact`], [`ContactBuilder`], [`ContactId`] - the contact abstraction
//! - [`closest`] - closeness predicates and collection helpers over contacts

mod contact;
mod endpoint;
mod error;

pub mod closest;

pub use closest::{
    closer_to_target, contact_closer_to_target, node_within_closest, remove_contact,
};
pub use contact::{Contact, ContactBuilder, ContactId};
pub use endpoint::Endpoint;
pub use error::ContactError;
