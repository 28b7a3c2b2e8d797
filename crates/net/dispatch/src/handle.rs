//! Cloneable handle for issuing sends to the dispatch service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::service::DispatchCommand;
use crate::{DispatchError, RequestId, SendOutcome, SendRequest};

/// Cheap-to-clone handle for dispatching requests.
///
/// Allocates correlation tokens and forwards requests to the
/// [`DispatchService`](crate::DispatchService); completion arrives through
/// the returned [`PendingSend`].
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    command_tx: mpsc::UnboundedSender<DispatchCommand>,
    next_request_id: Arc<AtomicU64>,
}

impl DispatchHandle {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<DispatchCommand>) -> Self {
        Self {
            command_tx,
            next_request_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Dispatches a request without blocking.
    ///
    /// The caller observes exactly one terminal result through the returned
    /// [`PendingSend`]; if the service is gone the result is
    /// [`DispatchError::ServiceStopped`].
    pub fn send(&self, request: SendRequest) -> PendingSend {
        let request_id = RequestId::new(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let (response_tx, response_rx) = oneshot::channel();

        // A failed send drops response_tx, which surfaces as ServiceStopped
        // when the caller awaits the outcome.
        let _ = self.command_tx.send(DispatchCommand::Send {
            request_id,
            request,
            response_tx,
        });

        PendingSend {
            request_id,
            response_rx,
            command_tx: self.command_tx.clone(),
        }
    }
}

/// Handle on one in-flight request.
///
/// Await [`outcome`](Self::outcome) for the terminal result, or
/// [`cancel`](Self::cancel) to force early completion with
/// [`DispatchError::Cancelled`].
#[derive(Debug)]
pub struct PendingSend {
    request_id: RequestId,
    response_rx: oneshot::Receiver<Result<SendOutcome, DispatchError>>,
    command_tx: mpsc::UnboundedSender<DispatchCommand>,
}

impl PendingSend {
    /// The correlation token assigned to this request.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Requests early completion with [`DispatchError::Cancelled`].
    ///
    /// A no-op if the request has already reached a terminal state; the
    /// exactly-once completion contract holds either way.
    pub fn cancel(&self) {
        let _ = self.command_tx.send(DispatchCommand::Cancel {
            request_id: self.request_id,
        });
    }

    /// Awaits the terminal result of the request.
    pub async fn outcome(self) -> Result<SendOutcome, DispatchError> {
        self.response_rx
            .await
            .map_err(|_| DispatchError::ServiceStopped)?
    }
}
