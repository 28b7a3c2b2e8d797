//! Single and group message dispatch for the meridian overlay.
//!
//! The dispatch layer sends a message to one destination identifier or to
//! the replicated closest-group of an anchor identifier, correlates
//! asynchronous replies back to the originating request, and guarantees
//! exactly one terminal notification per request: success, transport
//! failure, timeout, partial group completion, or cancellation.
//!
//! # Actor pattern
//!
//! This crate implements the Handle+Service actor pattern:
//! - [`DispatchService`] runs in its own tokio task and owns the
//!   pending-request table
//! - [`DispatchHandle`] is cheap-to-clone and used to issue sends
//! - [`PendingSend`] delivers the terminal result and supports cancellation
//!
//! Use [`create_dispatcher`] to wire the pieces together; the returned event
//! sender is the notification channel the network layer feeds with
//! [`DispatchEvent`]s (replies and asynchronous send failures).
//!
//! # Collaborators
//!
//! Transport and routing stay outside this crate behind the [`Transport`]
//! and [`GroupResolver`] seams; the dispatch layer never opens sockets and
//! never owns a routing table.

mod error;
mod handle;
mod request;
mod service;
mod transport;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use error::DispatchError;
pub use handle::{DispatchHandle, PendingSend};
pub use request::{
    ConnectType, DispatchConfig, OutboundMessage, RequestId, SendOutcome, SendRequest,
};
pub use service::{DispatchCommand, DispatchService};
pub use transport::{DispatchEvent, GroupResolver, Transport, TransportError};

/// Creates a dispatch service, a handle to drive it, and the inbound event
/// sender for the network layer.
///
/// The service must be spawned by the caller:
///
/// ```ignore
/// let (service, handle, events) = create_dispatcher(config, transport, resolver);
/// tokio::spawn(service.run());
/// ```
pub fn create_dispatcher<T: Transport, R: GroupResolver>(
    config: DispatchConfig,
    transport: Arc<T>,
    resolver: Arc<R>,
) -> (
    DispatchService<T, R>,
    DispatchHandle,
    mpsc::UnboundedSender<DispatchEvent>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let service = DispatchService::new(
        config,
        transport,
        resolver,
        command_rx,
        event_rx,
        event_tx.clone(),
    );
    let handle = DispatchHandle::new(command_tx);

    (service, handle, event_tx)
}
