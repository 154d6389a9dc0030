//! Poll-guarded send/receive: timeout bounds, readiness, and message
//! integrity across a loopback pair.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hawser::{Context, HawserError, Message, PollEvents, Socket, SocketKind};
use hawser_core::loopback::LoopbackTransport;

fn fresh_ctx() -> Context {
    Context::with_transport(Arc::new(LoopbackTransport::new())).unwrap()
}

fn pair(ctx: &Context, endpoint: &str) -> (Socket, Socket) {
    let server = Socket::bound(ctx, SocketKind::Pair, None, Some(endpoint)).unwrap();
    let client = Socket::connected(ctx, SocketKind::Pair, None, Some(endpoint)).unwrap();
    (server, client)
}

#[test]
fn poll_times_out_after_the_requested_wait() {
    let ctx = fresh_ctx();
    let (mut server, _client) = pair(&ctx, "inproc://idle");

    let start = Instant::now();
    let err = server.poll(PollEvents::IN, 50, "recv").unwrap_err();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(50), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "overslept: {elapsed:?}");
    assert!(err.is_timeout());
    assert_eq!(
        err.to_string(),
        "timeout waiting 50 ms in recv() for data on the socket"
    );
}

#[test]
fn recv_timeout_uses_the_configured_bound() {
    let ctx = fresh_ctx();
    let (mut server, _client) = pair(&ctx, "inproc://recv-timeout");
    server.set_recv_timeout(50).unwrap();

    let start = Instant::now();
    let err = server.recv().unwrap_err();
    assert!(start.elapsed() >= Duration::from_millis(50));
    match err {
        HawserError::Timeout { caller, timeout_ms, outbound } => {
            assert_eq!(caller, "recv");
            assert_eq!(timeout_ms, 50);
            assert!(!outbound);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[test]
fn send_timeout_reports_outbound_wait() {
    let ctx = fresh_ctx();
    // bound but never connected to: nothing can accept a message
    let mut lonely = Socket::bound(&ctx, SocketKind::Push, None, Some("@inproc://lonely")).unwrap();
    lonely.set_send_timeout(50).unwrap();

    let mut msg = Message::new();
    msg.append_frames(&["undeliverable".into()]).unwrap();
    let err = lonely.send(msg).unwrap_err();

    assert_eq!(
        err.to_string(),
        "timeout waiting 50 ms in send() for data to be sent on the socket"
    );
}

#[test]
fn round_trip_preserves_frame_order_and_bytes() {
    let ctx = fresh_ctx();
    let (mut server, mut client) = pair(&ctx, "inproc://round-trip");

    let mut msg = Message::new();
    msg.append_frames(&[
        "envelope".into(),
        hawser::FrameValue::Data(bytes::Bytes::new()),
        hawser::FrameValue::from(&[0xde, 0xad, 0xbe, 0xef][..]),
    ])
    .unwrap();
    client.send(msg).unwrap();

    let received = server.recv().unwrap();
    assert_eq!(received.frame_count(), 3);
    assert_eq!(received.frames()[0].data(), b"envelope");
    assert!(received.frames()[1].is_empty());
    assert_eq!(received.frames()[2].data(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn several_messages_arrive_in_send_order() {
    let ctx = fresh_ctx();
    let (mut server, mut client) = pair(&ctx, "inproc://fifo");

    for text in ["one", "two", "three"] {
        let mut msg = Message::new();
        msg.append_frames(&[text.into()]).unwrap();
        client.send(msg).unwrap();
    }

    for expected in ["one", "two", "three"] {
        let msg = server.recv().unwrap();
        assert_eq!(msg.frames()[0].data(), expected.as_bytes());
    }
}

#[test]
fn poll_out_becomes_ready_when_a_peer_arrives() {
    let ctx = fresh_ctx();
    let mut feeder = Socket::bound(&ctx, SocketKind::Push, None, Some("@inproc://late-peer")).unwrap();

    let err = feeder.poll(PollEvents::OUT, 0, "send").unwrap_err();
    assert!(err.is_timeout());

    let _sink = Socket::connected(&ctx, SocketKind::Pull, None, Some("inproc://late-peer")).unwrap();
    feeder.poll(PollEvents::OUT, 100, "send").unwrap();
}

#[test]
fn publisher_fans_out_to_every_subscriber() {
    let ctx = fresh_ctx();
    let mut publisher = Socket::publisher(&ctx, Some("inproc://updates")).unwrap();
    let mut sub_a = Socket::subscriber(&ctx, Some("inproc://updates"), None).unwrap();
    let mut sub_b = Socket::subscriber(&ctx, Some("inproc://updates"), None).unwrap();

    let mut msg = Message::new();
    msg.append_frames(&["tick".into()]).unwrap();
    publisher.send(msg).unwrap();

    sub_a.set_recv_timeout(500).unwrap();
    sub_b.set_recv_timeout(500).unwrap();
    assert_eq!(sub_a.recv().unwrap().frames()[0].data(), b"tick");
    assert_eq!(sub_b.recv().unwrap().frames()[0].data(), b"tick");
}
