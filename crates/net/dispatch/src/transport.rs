//! External collaborator seams: transport, group resolution, and the
//! inbound notification channel payload.

use bytes::Bytes;
use meridian_primitives::NodeId;

use crate::{OutboundMessage, RequestId};

/// Errors reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No route to the destination.
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    /// The send itself failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// The send capability the dispatch layer drives.
///
/// Implementations own endpoint resolution and the wire format; the dispatch
/// layer only supplies the destination identifier and the message. A
/// synchronous `Err` or a later
/// [`DispatchEvent::SendFailed`](crate::DispatchEvent::SendFailed) both
/// terminate the request with a transport error.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Transmits `message` towards `destination`.
    async fn send(&self, destination: &NodeId, message: OutboundMessage)
        -> Result<(), TransportError>;
}

/// Routing-table collaborator resolving a group anchor to its members.
pub trait GroupResolver: Send + Sync + 'static {
    /// The identifiers of the nodes closest to `target` that should jointly
    /// receive a group-addressed message. Duplicates are tolerated and
    /// removed by the dispatch layer.
    fn closest_group(&self, target: &NodeId) -> Vec<NodeId>;
}

/// Inbound notifications fed to the dispatch service by the network layer.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A reply arrived for an outstanding request.
    Reply {
        /// Correlation token carried by the reply.
        request_id: RequestId,
        /// Identifier of the replying node.
        source: NodeId,
        /// Reply payload.
        payload: Bytes,
    },
    /// The transport failed asynchronously after accepting a send.
    SendFailed {
        /// The request whose send failed.
        request_id: RequestId,
        /// The destination that could not be reached.
        peer: NodeId,
        /// The transport's failure report.
        error: TransportError,
    },
}
