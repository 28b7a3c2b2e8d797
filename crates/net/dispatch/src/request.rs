use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use meridian_net_contact::Contact;
use meridian_primitives::NodeId;

use crate::DispatchError;

/// Correlation token for an outbound request.
///
/// Monotonically increasing, allocated by the [`DispatchHandle`](crate::DispatchHandle);
/// opaque to transports beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw counter value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw counter value.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery mode of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectType {
    /// One destination, one expected reply.
    Single,
    /// The destination is a group anchor; the message is replicated to the
    /// closest group and replies are aggregated.
    Group,
}

/// Dispatch layer configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Time budget applied to requests that do not carry their own.
    pub default_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// An outbound request: destination, payload, and delivery parameters.
#[derive(Debug, Clone)]
pub struct SendRequest {
    /// Destination identifier (single mode) or group anchor (group mode).
    pub destination: NodeId,
    /// Group-context identifier carried on the wire; `None` outside groups.
    pub group_id: Option<NodeId>,
    /// Opaque payload bytes.
    pub payload: Bytes,
    /// Message-type tag, uninterpreted by the dispatch layer.
    pub message_type: u32,
    /// Per-request time budget; the config default applies when `None`.
    pub timeout: Option<Duration>,
    /// Delivery mode.
    pub connect_type: ConnectType,
}

impl SendRequest {
    /// A single-destination request.
    pub fn single(destination: NodeId, message_type: u32, payload: Bytes) -> Self {
        Self {
            destination,
            group_id: None,
            payload,
            message_type,
            timeout: None,
            connect_type: ConnectType::Single,
        }
    }

    /// A single-destination request addressed via a contact's identifier.
    ///
    /// Fails for address-only contacts, which cannot be addressed in the
    /// identifier space.
    pub fn single_to(
        contact: &Contact,
        message_type: u32,
        payload: Bytes,
    ) -> Result<Self, DispatchError> {
        let destination = contact
            .node_id()
            .copied()
            .ok_or(DispatchError::UnidentifiedContact)?;
        Ok(Self::single(destination, message_type, payload))
    }

    /// A group request anchored at `anchor`; the anchor doubles as the
    /// group-context identifier on the wire.
    pub fn group(anchor: NodeId, message_type: u32, payload: Bytes) -> Self {
        Self {
            destination: anchor,
            group_id: Some(anchor),
            payload,
            message_type,
            timeout: None,
            connect_type: ConnectType::Group,
        }
    }

    /// Overrides the time budget for this request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What the dispatch layer hands the transport for one destination.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Correlation token replies must carry.
    pub request_id: RequestId,
    /// Message-type tag.
    pub message_type: u32,
    /// Group-context identifier, if any.
    pub group_id: Option<NodeId>,
    /// Opaque payload bytes.
    pub payload: Bytes,
}

/// Successful terminal state of a request.
///
/// Payloads appear in arrival order. `Partial` is only produced by group
/// requests whose timeout elapsed first; it may carry zero replies and is
/// always distinguishable from `Complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Every expected reply arrived.
    Complete(Vec<Bytes>),
    /// The timeout elapsed with some (possibly zero) of the expected group
    /// replies collected.
    Partial {
        /// Replies collected before the deadline, in arrival order.
        received: Vec<Bytes>,
        /// Number of replies that were expected.
        expected: usize,
    },
}

impl SendOutcome {
    /// The collected payloads, in arrival order.
    pub fn payloads(&self) -> &[Bytes] {
        match self {
            Self::Complete(payloads) => payloads,
            Self::Partial { received, .. } => received,
        }
    }

    /// True iff every expected reply arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}
