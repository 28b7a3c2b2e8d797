//! Dispatch service actor (runs in its own tokio task).
//!
//! The service owns the pending-request table outright: registration, reply
//! correlation, timeout expiry, and cancellation all happen on this single
//! task, so no lock is needed and unrelated requests never serialize on each
//! other beyond the command channel.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use bytes::Bytes;
use meridian_primitives::NodeId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{
    ConnectType, DispatchConfig, DispatchError, DispatchEvent, GroupResolver, OutboundMessage,
    RequestId, SendOutcome, SendRequest, Transport,
};

/// Commands from handles to the service.
#[derive(Debug)]
pub enum DispatchCommand {
    /// Register and transmit a request.
    Send {
        /// Correlation token allocated by the handle.
        request_id: RequestId,
        /// The request to dispatch.
        request: SendRequest,
        /// Channel carrying the single terminal result.
        response_tx: oneshot::Sender<Result<SendOutcome, DispatchError>>,
    },
    /// Complete a request early with `Cancelled`.
    Cancel {
        /// The request to cancel.
        request_id: RequestId,
    },
}

/// One outstanding request in the pending table.
struct PendingRequest {
    connect_type: ConnectType,
    /// The identifiers allowed to reply (the destination in single mode).
    members: Vec<NodeId>,
    /// Members whose reply has been counted, for de-duplication.
    replied: HashSet<NodeId>,
    /// Collected payloads, in arrival order.
    payloads: Vec<Bytes>,
    expected: usize,
    response_tx: oneshot::Sender<Result<SendOutcome, DispatchError>>,
}

/// Processes send commands from handles and reply/failure notifications from
/// the network layer, guaranteeing exactly one terminal notification per
/// request.
pub struct DispatchService<T, R> {
    config: DispatchConfig,
    transport: Arc<T>,
    resolver: Arc<R>,
    /// Receive commands from handles.
    command_rx: mpsc::UnboundedReceiver<DispatchCommand>,
    /// Receive replies and send failures routed from the network layer.
    event_rx: mpsc::UnboundedReceiver<DispatchEvent>,
    /// Sender handed to spawned transmit tasks for failure reports.
    event_tx: mpsc::UnboundedSender<DispatchEvent>,
    /// The pending-request table; owned by this task alone.
    pending: HashMap<RequestId, PendingRequest>,
    /// Request deadlines, earliest first. Entries for requests that already
    /// completed are skipped lazily when they pop.
    deadlines: BinaryHeap<Reverse<(Instant, RequestId)>>,
}

impl<T: Transport, R: GroupResolver> DispatchService<T, R> {
    pub(crate) fn new(
        config: DispatchConfig,
        transport: Arc<T>,
        resolver: Arc<R>,
        command_rx: mpsc::UnboundedReceiver<DispatchCommand>,
        event_rx: mpsc::UnboundedReceiver<DispatchEvent>,
        event_tx: mpsc::UnboundedSender<DispatchEvent>,
    ) -> Self {
        Self {
            config,
            transport,
            resolver,
            command_rx,
            event_rx,
            event_tx,
            pending: HashMap::new(),
            deadlines: BinaryHeap::new(),
        }
    }

    /// Runs the service event loop.
    ///
    /// Returns when every command sender (handles and their pending sends)
    /// has been dropped. Outstanding requests are dropped with it, which
    /// callers observe as `ServiceStopped`.
    pub async fn run(mut self) {
        loop {
            let next_deadline = self.next_deadline();
            tokio::select! {
                maybe_cmd = self.command_rx.recv() => match maybe_cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        debug!("dispatch service shutting down");
                        break;
                    }
                },
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                _ = sleep_until_opt(next_deadline), if next_deadline.is_some() => {
                    self.expire_due(Instant::now());
                }
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.peek().map(|Reverse((at, _))| *at)
    }

    fn handle_command(&mut self, cmd: DispatchCommand) {
        match cmd {
            DispatchCommand::Send {
                request_id,
                request,
                response_tx,
            } => self.register(request_id, request, response_tx),
            DispatchCommand::Cancel { request_id } => {
                if let Some(pending) = self.pending.remove(&request_id) {
                    debug!(%request_id, "request cancelled");
                    let _ = pending.response_tx.send(Err(DispatchError::Cancelled));
                }
            }
        }
    }

    fn register(
        &mut self,
        request_id: RequestId,
        request: SendRequest,
        response_tx: oneshot::Sender<Result<SendOutcome, DispatchError>>,
    ) {
        let members = match request.connect_type {
            ConnectType::Single => vec![request.destination],
            ConnectType::Group => {
                let mut members = self.resolver.closest_group(&request.destination);
                let mut seen = HashSet::with_capacity(members.len());
                members.retain(|member| seen.insert(*member));
                if members.is_empty() {
                    warn!(target = %request.destination, "group anchor resolved to no members");
                    let _ = response_tx.send(Err(DispatchError::NoGroupMembers {
                        target: request.destination,
                    }));
                    return;
                }
                members
            }
        };

        let timeout = request.timeout.unwrap_or(self.config.default_timeout);
        let deadline = Instant::now() + timeout;

        for &peer in &members {
            let message = OutboundMessage {
                request_id,
                message_type: request.message_type,
                group_id: request.group_id,
                payload: request.payload.clone(),
            };
            let transport = Arc::clone(&self.transport);
            let events = self.event_tx.clone();
            tokio::spawn(async move {
                if let Err(error) = transport.send(&peer, message).await {
                    let _ = events.send(DispatchEvent::SendFailed {
                        request_id,
                        peer,
                        error,
                    });
                }
            });
        }

        debug!(
            %request_id,
            destination = %request.destination,
            expected = members.len(),
            ?timeout,
            "request registered"
        );

        self.pending.insert(
            request_id,
            PendingRequest {
                connect_type: request.connect_type,
                expected: members.len(),
                members,
                replied: HashSet::new(),
                payloads: Vec::new(),
                response_tx,
            },
        );
        self.deadlines.push(Reverse((deadline, request_id)));
    }

    fn handle_event(&mut self, event: DispatchEvent) {
        match event {
            DispatchEvent::Reply {
                request_id,
                source,
                payload,
            } => self.handle_reply(request_id, source, payload),
            DispatchEvent::SendFailed {
                request_id,
                peer,
                error,
            } => {
                // Any member failing to send terminates the whole request.
                if let Some(pending) = self.pending.remove(&request_id) {
                    warn!(%request_id, %peer, %error, "transport failure");
                    let _ = pending
                        .response_tx
                        .send(Err(DispatchError::Transport(error)));
                }
            }
        }
    }

    fn handle_reply(&mut self, request_id: RequestId, source: NodeId, payload: Bytes) {
        let Some(pending) = self.pending.get_mut(&request_id) else {
            debug!(%request_id, %source, "reply for unknown or completed request");
            return;
        };
        if !pending.members.contains(&source) {
            debug!(%request_id, %source, "reply from non-member ignored");
            return;
        }
        if !pending.replied.insert(source) {
            debug!(%request_id, %source, "duplicate reply ignored");
            return;
        }
        pending.payloads.push(payload);

        if pending.payloads.len() == pending.expected {
            if let Some(pending) = self.pending.remove(&request_id) {
                debug!(%request_id, replies = pending.expected, "request complete");
                let _ = pending
                    .response_tx
                    .send(Ok(SendOutcome::Complete(pending.payloads)));
            }
        }
    }

    fn expire_due(&mut self, now: Instant) {
        while let Some(&Reverse((at, request_id))) = self.deadlines.peek() {
            if at > now {
                break;
            }
            self.deadlines.pop();

            // Completed or cancelled requests leave stale heap entries.
            let Some(pending) = self.pending.remove(&request_id) else {
                continue;
            };
            match pending.connect_type {
                ConnectType::Single => {
                    debug!(%request_id, "request timed out");
                    let _ = pending.response_tx.send(Err(DispatchError::Timeout));
                }
                ConnectType::Group => {
                    debug!(
                        %request_id,
                        received = pending.payloads.len(),
                        expected = pending.expected,
                        "group request timed out"
                    );
                    let _ = pending.response_tx.send(Ok(SendOutcome::Partial {
                        received: pending.payloads,
                        expected: pending.expected,
                    }));
                }
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        // Guarded out by the select arm condition; never completes.
        None => futures::future::pending().await,
    }
}
