//! Dispatch error types.

use meridian_primitives::NodeId;

use crate::TransportError;

/// Terminal failure of a dispatched request.
///
/// Every request receives exactly one terminal notification: a
/// [`SendOutcome`](crate::SendOutcome) or one of these errors. Asynchronous
/// failures are only ever delivered through the completion channel, never
/// across it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No reply arrived within the request's time budget (single mode).
    #[error("request timed out")]
    Timeout,

    /// The request was cancelled before completion.
    #[error("request cancelled")]
    Cancelled,

    /// A group anchor resolved to no members; nothing was transmitted.
    #[error("no group members resolved for {target}")]
    NoGroupMembers {
        /// The anchor identifier that resolved to an empty group.
        target: NodeId,
    },

    /// The contact addressed has no known overlay identifier.
    #[error("contact has no overlay identifier")]
    UnidentifiedContact,

    /// The transport reported a send failure; the request stops waiting.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The dispatch service stopped before completing the request.
    #[error("dispatch service stopped")]
    ServiceStopped,
}
