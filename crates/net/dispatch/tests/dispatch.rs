//! End-to-end dispatch tests against a mock transport.
//!
//! All tests run under tokio's paused clock, so timeout assertions are
//! deterministic: the runtime advances virtual time only when every task is
//! idle.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use bytes::Bytes;
use meridian_net_dispatch::{
    create_dispatcher, DispatchConfig, DispatchError, DispatchEvent, DispatchHandle, GroupResolver,
    OutboundMessage, RequestId, SendOutcome, SendRequest, Transport, TransportError,
};
use meridian_primitives::NodeId;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Transport double: records every send, optionally failing chosen peers.
struct MockTransport {
    sent: Mutex<Vec<(NodeId, OutboundMessage)>>,
    fail: HashSet<NodeId>,
}

impl MockTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: HashSet::new(),
        })
    }

    fn failing(peers: impl IntoIterator<Item = NodeId>) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: peers.into_iter().collect(),
        })
    }

    fn sent(&self) -> Vec<(NodeId, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        destination: &NodeId,
        message: OutboundMessage,
    ) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((*destination, message));
        if self.fail.contains(destination) {
            return Err(TransportError::Unreachable(destination.to_string()));
        }
        Ok(())
    }
}

/// Routing-table double with fixed anchor-to-members mappings.
struct StaticResolver(HashMap<NodeId, Vec<NodeId>>);

impl StaticResolver {
    fn empty() -> Self {
        Self(HashMap::new())
    }

    fn with_group(anchor: NodeId, members: Vec<NodeId>) -> Self {
        Self(HashMap::from([(anchor, members)]))
    }
}

impl GroupResolver for StaticResolver {
    fn closest_group(&self, target: &NodeId) -> Vec<NodeId> {
        self.0.get(target).cloned().unwrap_or_default()
    }
}

fn spawn_dispatcher(
    transport: Arc<MockTransport>,
    resolver: StaticResolver,
) -> (DispatchHandle, mpsc::UnboundedSender<DispatchEvent>) {
    let (service, handle, events) =
        create_dispatcher(DispatchConfig::default(), transport, Arc::new(resolver));
    tokio::spawn(service.run());
    (handle, events)
}

/// Let the service task drain its channels before injecting replies.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn reply(request_id: RequestId, source: NodeId, payload: &[u8]) -> DispatchEvent {
    DispatchEvent::Reply {
        request_id,
        source,
        payload: Bytes::copy_from_slice(payload),
    }
}

#[tokio::test(start_paused = true)]
async fn single_send_completes_on_matching_reply() {
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(Arc::clone(&transport), StaticResolver::empty());

    let destination = NodeId::random();
    let pending = handle.send(SendRequest::single(
        destination,
        101,
        Bytes::from_static(b"hello"),
    ));
    settle().await;

    // the message went out exactly once, untagged by any group context
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, destination);
    assert_eq!(sent[0].1.message_type, 101);
    assert_eq!(sent[0].1.group_id, None);

    events
        .send(reply(pending.request_id(), destination, b"world"))
        .unwrap();

    let outcome = pending.outcome().await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Complete(vec![Bytes::from_static(b"world")])
    );
}

#[tokio::test(start_paused = true)]
async fn single_send_times_out_with_empty_payloads() {
    let transport = MockTransport::new();
    let (handle, _events) = spawn_dispatcher(transport, StaticResolver::empty());

    let start = Instant::now();
    let pending = handle.send(
        SendRequest::single(NodeId::random(), 101, Bytes::new())
            .with_timeout(Duration::from_secs(5)),
    );

    let result = pending.outcome().await;
    assert_matches!(result, Err(DispatchError::Timeout));

    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(5) && elapsed < Duration::from_millis(5100),
        "timeout fired at {elapsed:?}, expected ~5s"
    );
}

#[tokio::test(start_paused = true)]
async fn group_send_collects_all_replies_in_arrival_order() {
    let anchor = NodeId::random();
    let members: Vec<NodeId> = (0..4).map(|_| NodeId::random()).collect();
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(
        Arc::clone(&transport),
        StaticResolver::with_group(anchor, members.clone()),
    );

    let start = Instant::now();
    let pending = handle.send(
        SendRequest::group(anchor, 202, Bytes::from_static(b"q"))
            .with_timeout(Duration::from_secs(10)),
    );
    settle().await;

    // one transmit per member, each carrying the group context
    let sent = transport.sent();
    assert_eq!(sent.len(), 4);
    for (_, message) in &sent {
        assert_eq!(message.group_id, Some(anchor));
    }

    // replies arrive out of member order
    for index in [2usize, 0, 3, 1] {
        events
            .send(reply(
                pending.request_id(),
                members[index],
                index.to_string().as_bytes(),
            ))
            .unwrap();
    }

    let outcome = pending.outcome().await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Complete(vec![
            Bytes::from_static(b"2"),
            Bytes::from_static(b"0"),
            Bytes::from_static(b"3"),
            Bytes::from_static(b"1"),
        ])
    );
    assert!(start.elapsed() < Duration::from_secs(1), "completion was not prompt");
}

#[tokio::test(start_paused = true)]
async fn group_send_times_out_with_partial_replies() {
    let anchor = NodeId::random();
    let members: Vec<NodeId> = (0..4).map(|_| NodeId::random()).collect();
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(
        transport,
        StaticResolver::with_group(anchor, members.clone()),
    );

    let start = Instant::now();
    let pending = handle.send(
        SendRequest::group(anchor, 202, Bytes::new()).with_timeout(Duration::from_secs(2)),
    );
    settle().await;

    events.send(reply(pending.request_id(), members[0], b"a")).unwrap();
    events.send(reply(pending.request_id(), members[1], b"b")).unwrap();

    let outcome = pending.outcome().await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Partial {
            received: vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
            expected: 4,
        }
    );
    assert!(!outcome.is_complete());

    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_secs(2) && elapsed < Duration::from_millis(2100),
        "partial completion at {elapsed:?}, expected ~2s"
    );
}

#[tokio::test(start_paused = true)]
async fn duplicate_and_foreign_replies_are_ignored() {
    let anchor = NodeId::random();
    let members: Vec<NodeId> = (0..2).map(|_| NodeId::random()).collect();
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(
        transport,
        StaticResolver::with_group(anchor, members.clone()),
    );

    let pending = handle.send(SendRequest::group(anchor, 1, Bytes::new()));
    settle().await;

    let id = pending.request_id();
    events.send(reply(id, members[0], b"first")).unwrap();
    // duplicate from the same member
    events.send(reply(id, members[0], b"again")).unwrap();
    // reply from a node outside the group
    events.send(reply(id, NodeId::random(), b"stranger")).unwrap();
    events.send(reply(id, members[1], b"second")).unwrap();

    let outcome = pending.outcome().await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Complete(vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")])
    );
}

#[tokio::test(start_paused = true)]
async fn transport_failure_terminates_the_request() {
    let destination = NodeId::random();
    let transport = MockTransport::failing([destination]);
    let (handle, _events) = spawn_dispatcher(transport, StaticResolver::empty());

    let start = Instant::now();
    let pending = handle.send(
        SendRequest::single(destination, 1, Bytes::new()).with_timeout(Duration::from_secs(5)),
    );

    let result = pending.outcome().await;
    assert_matches!(
        result,
        Err(DispatchError::Transport(TransportError::Unreachable(_)))
    );
    // no waiting out the timeout
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn empty_group_fails_before_transmitting() {
    let transport = MockTransport::new();
    let (handle, _events) = spawn_dispatcher(Arc::clone(&transport), StaticResolver::empty());

    let anchor = NodeId::random();
    let pending = handle.send(SendRequest::group(anchor, 1, Bytes::new()));

    let result = pending.outcome().await;
    assert_matches!(
        result,
        Err(DispatchError::NoGroupMembers { target }) if target == anchor
    );
    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_completes_exactly_once_with_cancelled() {
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(transport, StaticResolver::empty());

    let destination = NodeId::random();
    let pending = handle.send(
        SendRequest::single(destination, 1, Bytes::new()).with_timeout(Duration::from_secs(5)),
    );
    settle().await;

    pending.cancel();
    let id = pending.request_id();
    let result = pending.outcome().await;
    assert_matches!(result, Err(DispatchError::Cancelled));

    // a late reply for the cancelled request is ignored, not redelivered
    events.send(reply(id, destination, b"late")).unwrap();
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_do_not_cross_deliver() {
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(transport, StaticResolver::empty());

    let (dest_a, dest_b) = (NodeId::random(), NodeId::random());
    let pending_a = handle.send(
        SendRequest::single(dest_a, 1, Bytes::new()).with_timeout(Duration::from_secs(3)),
    );
    let pending_b = handle.send(
        SendRequest::single(dest_b, 1, Bytes::new()).with_timeout(Duration::from_secs(3)),
    );
    settle().await;

    // b's reply id with a's source: correlation must reject it
    events.send(reply(pending_b.request_id(), dest_a, b"wrong")).unwrap();
    // the genuine reply for b
    events.send(reply(pending_b.request_id(), dest_b, b"for-b")).unwrap();

    let outcome_b = pending_b.outcome().await.unwrap();
    assert_eq!(
        outcome_b,
        SendOutcome::Complete(vec![Bytes::from_static(b"for-b")])
    );

    // a never got a reply and times out independently
    assert_matches!(pending_a.outcome().await, Err(DispatchError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn duplicate_group_members_are_counted_once() {
    let anchor = NodeId::random();
    let member = NodeId::random();
    let transport = MockTransport::new();
    let (handle, events) = spawn_dispatcher(
        Arc::clone(&transport),
        StaticResolver::with_group(anchor, vec![member, member]),
    );

    let pending = handle.send(SendRequest::group(anchor, 1, Bytes::new()));
    settle().await;

    // de-duplicated: one transmit, one expected reply
    assert_eq!(transport.sent().len(), 1);

    events.send(reply(pending.request_id(), member, b"only")).unwrap();
    let outcome = pending.outcome().await.unwrap();
    assert_eq!(outcome, SendOutcome::Complete(vec![Bytes::from_static(b"only")]));
}

#[tokio::test(start_paused = true)]
async fn dropped_service_reports_service_stopped() {
    let transport = MockTransport::new();
    let (service, handle, _events) = create_dispatcher(
        DispatchConfig::default(),
        transport,
        Arc::new(StaticResolver::empty()),
    );
    drop(service);

    let pending = handle.send(SendRequest::single(NodeId::random(), 1, Bytes::new()));
    assert_matches!(pending.outcome().await, Err(DispatchError::ServiceStopped));
}
