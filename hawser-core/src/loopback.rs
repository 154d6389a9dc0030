//! In-process reference transport.
//!
//! `LoopbackTransport` implements the full [`RawTransport`] capability with
//! plain in-memory mailboxes: an exact-string endpoint registry, per-socket
//! message queues guarded by a mutex/condvar pair, and a monotonic ephemeral
//! counter standing in for dynamic TCP port assignment.
//!
//! It exists so the binding layer (and its tests) can run without any
//! external messaging library. Delivery semantics are deliberately minimal:
//! broadcast kinds (PUB/XPUB/RADIO) fan out to every live peer and drop
//! silently with none, every other kind round-robins a single live peer.
//! There is no subscription filtering and no request-reply correlation.
//!
//! Connect resolves the endpoint synchronously: connecting to a string
//! nobody has bound fails with `ECONNREFUSED` instead of waiting for a
//! listener to appear.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::endpoint::tcp_port_token;
use crate::errno;
use crate::options;
use crate::raw::{PollEvents, RawContext, RawError, RawResult, RawSocket, RawTransport};
use crate::socket_type::SocketKind;

/// First port handed out for `tcp://…:0` / `tcp://…:*` binds.
const EPHEMERAL_PORT_BASE: u16 = 49152;

static GLOBAL: Lazy<Arc<LoopbackTransport>> = Lazy::new(|| Arc::new(LoopbackTransport::new()));

/// Mailbox shared between a socket and its peers.
///
/// The `closed` and `terminated` flags live outside the mutex so that peers
/// and pollers can check liveness without taking another socket's lock.
struct Pipes {
    closed: AtomicBool,
    terminated: AtomicBool,
    state: Mutex<PipeState>,
    cond: Condvar,
}

struct PipeState {
    inbox: VecDeque<Vec<Bytes>>,
    peers: Vec<Arc<Pipes>>,
    next_peer: usize,
}

impl Pipes {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            closed: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            state: Mutex::new(PipeState {
                inbox: VecDeque::new(),
                peers: Vec::new(),
                next_peer: 0,
            }),
            cond: Condvar::new(),
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn deliver(&self, frames: Vec<Bytes>) {
        let mut st = self.state.lock();
        st.inbox.push_back(frames);
        self.cond.notify_all();
    }
}

struct CtxEntry {
    terminated: bool,
}

struct SocketEntry {
    ctx: u64,
    kind: SocketKind,
    options: HashMap<i32, Vec<u8>>,
    bound: Vec<String>,
    last_endpoint: Option<String>,
    pipes: Arc<Pipes>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    next_port: u16,
    contexts: HashMap<u64, CtxEntry>,
    sockets: HashMap<u64, SocketEntry>,
    endpoints: HashMap<String, u64>,
}

/// In-memory implementation of the raw transport capability.
pub struct LoopbackTransport {
    state: Mutex<State>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_port: EPHEMERAL_PORT_BASE,
                ..State::default()
            }),
        }
    }

    /// The process-wide shared instance.
    pub fn global() -> Arc<LoopbackTransport> {
        GLOBAL.clone()
    }

    fn alloc_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    /// Look up a socket and its context, enforcing handle and context
    /// liveness.
    fn socket_parts(&self, sock: RawSocket) -> RawResult<(Arc<Pipes>, SocketKind)> {
        let state = self.state.lock();
        let entry = state
            .sockets
            .get(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        let ctx = state
            .contexts
            .get(&entry.ctx)
            .ok_or(RawError::new(errno::EFAULT))?;
        if ctx.terminated {
            return Err(RawError::new(errno::ETERM));
        }
        Ok((entry.pipes.clone(), entry.kind))
    }

    fn check_scheme(endpoint: &str) -> RawResult<()> {
        let scheme = endpoint
            .split_once("://")
            .map(|(s, _)| s)
            .ok_or(RawError::new(errno::EINVAL))?;
        match scheme {
            "tcp" | "ipc" | "inproc" => Ok(()),
            _ => Err(RawError::new(errno::EPROTONOSUPPORT)),
        }
    }
}

impl RawTransport for LoopbackTransport {
    fn ctx_new(&self) -> RawResult<RawContext> {
        let mut state = self.state.lock();
        let id = Self::alloc_id(&mut state);
        state.contexts.insert(id, CtxEntry { terminated: false });
        Ok(RawContext(id))
    }

    fn ctx_term(&self, ctx: RawContext) -> RawResult<()> {
        let mut state = self.state.lock();
        let entry = state
            .contexts
            .get_mut(&ctx.0)
            .ok_or(RawError::new(errno::EFAULT))?;
        entry.terminated = true;

        // wake pollers on this context's sockets so they observe ETERM
        let pipes: Vec<Arc<Pipes>> = state
            .sockets
            .values()
            .filter(|s| s.ctx == ctx.0)
            .map(|s| s.pipes.clone())
            .collect();
        drop(state);
        for p in pipes {
            p.terminated.store(true, Ordering::Release);
            let _st = p.state.lock();
            p.cond.notify_all();
        }
        Ok(())
    }

    fn socket_new(&self, ctx: RawContext, kind: SocketKind) -> RawResult<RawSocket> {
        let mut state = self.state.lock();
        let entry = state
            .contexts
            .get(&ctx.0)
            .ok_or(RawError::new(errno::EFAULT))?;
        if entry.terminated {
            return Err(RawError::new(errno::ETERM));
        }
        let id = Self::alloc_id(&mut state);
        state.sockets.insert(
            id,
            SocketEntry {
                ctx: ctx.0,
                kind,
                options: HashMap::new(),
                bound: Vec::new(),
                last_endpoint: None,
                pipes: Pipes::new(),
            },
        );
        Ok(RawSocket(id))
    }

    fn socket_close(&self, sock: RawSocket) -> RawResult<()> {
        let mut state = self.state.lock();
        let entry = state
            .sockets
            .remove(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        for ep in &entry.bound {
            state.endpoints.remove(ep);
        }
        drop(state);

        entry.pipes.closed.store(true, Ordering::Release);
        let _st = entry.pipes.state.lock();
        entry.pipes.cond.notify_all();
        Ok(())
    }

    fn set_option(&self, sock: RawSocket, option: i32, value: &[u8]) -> RawResult<()> {
        let mut state = self.state.lock();
        let entry = state
            .sockets
            .get_mut(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        entry.options.insert(option, value.to_vec());
        Ok(())
    }

    fn get_option(&self, sock: RawSocket, option: i32) -> RawResult<Vec<u8>> {
        let state = self.state.lock();
        let entry = state
            .sockets
            .get(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        match option {
            options::LAST_ENDPOINT => entry
                .last_endpoint
                .as_ref()
                .map(|ep| ep.as_bytes().to_vec())
                .ok_or(RawError::new(errno::EINVAL)),
            options::TYPE => Ok(options::encode_int(entry.kind.code()).to_vec()),
            _ => entry
                .options
                .get(&option)
                .cloned()
                .ok_or(RawError::new(errno::EINVAL)),
        }
    }

    fn bind(&self, sock: RawSocket, endpoint: &str) -> RawResult<()> {
        Self::check_scheme(endpoint)?;
        let mut state = self.state.lock();
        if !state.sockets.contains_key(&sock.0) {
            return Err(RawError::new(errno::ENOTSOCK));
        }

        // dynamic port request: rewrite the endpoint before registering it
        let resolved = match tcp_port_token(endpoint) {
            Some(token) if token == "*" || token == "0" => {
                let port = state.next_port;
                state.next_port += 1;
                format!("{}{}", &endpoint[..endpoint.len() - token.len()], port)
            }
            _ => endpoint.to_string(),
        };

        if state.endpoints.contains_key(&resolved) {
            return Err(RawError::new(errno::EADDRINUSE));
        }
        state.endpoints.insert(resolved.clone(), sock.0);
        debug!("loopback: socket {} bound to {}", sock.0, resolved);

        let entry = state
            .sockets
            .get_mut(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        entry.bound.push(resolved.clone());
        entry.last_endpoint = Some(resolved);
        Ok(())
    }

    fn connect(&self, sock: RawSocket, endpoint: &str) -> RawResult<()> {
        Self::check_scheme(endpoint)?;
        let state = self.state.lock();
        let entry = state
            .sockets
            .get(&sock.0)
            .ok_or(RawError::new(errno::ENOTSOCK))?;
        let local = entry.pipes.clone();

        let target_id = *state
            .endpoints
            .get(endpoint)
            .ok_or(RawError::new(errno::ECONNREFUSED))?;
        let remote = state
            .sockets
            .get(&target_id)
            .ok_or(RawError::new(errno::ECONNREFUSED))?
            .pipes
            .clone();
        drop(state);

        {
            let mut st = local.state.lock();
            st.peers.push(remote.clone());
            local.cond.notify_all();
        }
        {
            let mut st = remote.state.lock();
            st.peers.push(local);
            remote.cond.notify_all();
        }
        debug!("loopback: socket {} connected to {}", sock.0, endpoint);
        Ok(())
    }

    fn poll(&self, sock: RawSocket, events: PollEvents, timeout_ms: i64) -> RawResult<PollEvents> {
        let (pipes, kind) = self.socket_parts(sock)?;
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(timeout_ms as u64))
        };

        let mut st = pipes.state.lock();
        loop {
            if pipes.is_closed() {
                return Err(RawError::new(errno::ENOTSOCK));
            }
            if pipes.terminated.load(Ordering::Acquire) {
                return Err(RawError::new(errno::ETERM));
            }

            let ready = ready_events(&st, kind, events);
            if !ready.is_empty() {
                return Ok(ready);
            }

            match deadline {
                None => pipes.cond.wait(&mut st),
                Some(d) => {
                    if pipes.cond.wait_until(&mut st, d).timed_out() {
                        return Ok(ready_events(&st, kind, events));
                    }
                }
            }
        }
    }

    fn send(&self, sock: RawSocket, frames: Vec<Bytes>) -> RawResult<()> {
        let (pipes, kind) = self.socket_parts(sock)?;

        let mut st = pipes.state.lock();
        st.peers.retain(|p| !p.is_closed());

        if kind.broadcasts() {
            // fan out; with no subscribers the message is dropped
            let targets = st.peers.clone();
            drop(st);
            for t in targets {
                t.deliver(frames.clone());
            }
            return Ok(());
        }

        if st.peers.is_empty() {
            return Err(RawError::new(errno::EAGAIN));
        }
        let idx = st.next_peer % st.peers.len();
        st.next_peer = st.next_peer.wrapping_add(1);
        let target = st.peers[idx].clone();
        drop(st);

        target.deliver(frames);
        Ok(())
    }

    fn recv(&self, sock: RawSocket) -> RawResult<Vec<Bytes>> {
        let (pipes, _) = self.socket_parts(sock)?;
        let mut st = pipes.state.lock();
        st.inbox.pop_front().ok_or(RawError::new(errno::EAGAIN))
    }
}

fn ready_events(st: &PipeState, kind: SocketKind, wanted: PollEvents) -> PollEvents {
    let mut ready = PollEvents::NONE;
    if wanted.contains(PollEvents::IN) && !st.inbox.is_empty() {
        ready = ready | PollEvents::IN;
    }
    if wanted.contains(PollEvents::OUT)
        && (kind.broadcasts() || st.peers.iter().any(|p| !p.is_closed()))
    {
        ready = ready | PollEvents::OUT;
    }
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(transport: &LoopbackTransport, endpoint: &str) -> (RawSocket, RawSocket) {
        let ctx = transport.ctx_new().unwrap();
        let server = transport.socket_new(ctx, SocketKind::Pair).unwrap();
        let client = transport.socket_new(ctx, SocketKind::Pair).unwrap();
        transport.bind(server, endpoint).unwrap();
        transport.connect(client, endpoint).unwrap();
        (server, client)
    }

    #[test]
    fn test_bind_duplicate_endpoint() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let a = t.socket_new(ctx, SocketKind::Rep).unwrap();
        let b = t.socket_new(ctx, SocketKind::Rep).unwrap();

        t.bind(a, "tcp://127.0.0.1:7001").unwrap();
        let err = t.bind(b, "tcp://127.0.0.1:7001").unwrap_err();
        assert_eq!(err.code(), errno::EADDRINUSE);
    }

    #[test]
    fn test_close_releases_endpoint() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let a = t.socket_new(ctx, SocketKind::Rep).unwrap();
        t.bind(a, "inproc://release-me").unwrap();
        t.socket_close(a).unwrap();

        let b = t.socket_new(ctx, SocketKind::Rep).unwrap();
        t.bind(b, "inproc://release-me").unwrap();
    }

    #[test]
    fn test_dynamic_port_assignment() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let a = t.socket_new(ctx, SocketKind::Rep).unwrap();
        let b = t.socket_new(ctx, SocketKind::Rep).unwrap();

        t.bind(a, "tcp://127.0.0.1:0").unwrap();
        t.bind(b, "tcp://127.0.0.1:0").unwrap();

        let ep_a = String::from_utf8(t.get_option(a, options::LAST_ENDPOINT).unwrap()).unwrap();
        let ep_b = String::from_utf8(t.get_option(b, options::LAST_ENDPOINT).unwrap()).unwrap();
        assert_ne!(ep_a, ep_b);
        assert!(ep_a.starts_with("tcp://127.0.0.1:"));

        let port = crate::endpoint::trailing_port(&ep_a).unwrap();
        assert!(port >= EPHEMERAL_PORT_BASE);
    }

    #[test]
    fn test_wildcard_port_assignment() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let a = t.socket_new(ctx, SocketKind::Pub).unwrap();
        t.bind(a, "tcp://*:*").unwrap();
        let ep = String::from_utf8(t.get_option(a, options::LAST_ENDPOINT).unwrap()).unwrap();
        assert!(crate::endpoint::trailing_port(&ep).unwrap() >= EPHEMERAL_PORT_BASE);
    }

    #[test]
    fn test_connect_refused_without_listener() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Dealer).unwrap();
        let err = t.connect(s, "tcp://127.0.0.1:9").unwrap_err();
        assert_eq!(err.code(), errno::ECONNREFUSED);
    }

    #[test]
    fn test_unsupported_scheme() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Dealer).unwrap();
        assert_eq!(
            t.bind(s, "udp://127.0.0.1:9").unwrap_err().code(),
            errno::EPROTONOSUPPORT
        );
        assert_eq!(t.bind(s, "garbage").unwrap_err().code(), errno::EINVAL);
    }

    #[test]
    fn test_send_recv_round_trip() {
        let t = LoopbackTransport::new();
        let (server, client) = pair(&t, "inproc://round-trip");

        let msg = vec![Bytes::from_static(b"hello"), Bytes::from_static(b"world")];
        t.send(client, msg.clone()).unwrap();

        let ready = t.poll(server, PollEvents::IN, 100).unwrap();
        assert!(ready.contains(PollEvents::IN));
        assert_eq!(t.recv(server).unwrap(), msg);
    }

    #[test]
    fn test_recv_empty_would_block() {
        let t = LoopbackTransport::new();
        let (server, _client) = pair(&t, "inproc://empty");
        assert!(t.recv(server).unwrap_err().would_block());
    }

    #[test]
    fn test_poll_times_out_without_activity() {
        let t = LoopbackTransport::new();
        let (server, _client) = pair(&t, "inproc://quiet");

        let start = Instant::now();
        let ready = t.poll(server, PollEvents::IN, 50).unwrap();
        assert!(ready.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_poll_out_waits_for_peer() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Push).unwrap();
        t.bind(s, "inproc://no-peer-yet").unwrap();

        assert!(t.poll(s, PollEvents::OUT, 0).unwrap().is_empty());
        assert!(t.send(s, vec![Bytes::new()]).unwrap_err().would_block());

        let c = t.socket_new(ctx, SocketKind::Pull).unwrap();
        t.connect(c, "inproc://no-peer-yet").unwrap();
        assert!(t.poll(s, PollEvents::OUT, 100).unwrap().contains(PollEvents::OUT));
    }

    #[test]
    fn test_broadcast_fans_out_and_drops_without_peers() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let publisher = t.socket_new(ctx, SocketKind::Pub).unwrap();
        t.bind(publisher, "inproc://fan-out").unwrap();

        // no subscribers: silently dropped, and the socket reports writable
        t.send(publisher, vec![Bytes::from_static(b"lost")]).unwrap();
        assert!(t.poll(publisher, PollEvents::OUT, 0).unwrap().contains(PollEvents::OUT));

        let sub1 = t.socket_new(ctx, SocketKind::Sub).unwrap();
        let sub2 = t.socket_new(ctx, SocketKind::Sub).unwrap();
        t.connect(sub1, "inproc://fan-out").unwrap();
        t.connect(sub2, "inproc://fan-out").unwrap();

        t.send(publisher, vec![Bytes::from_static(b"tick")]).unwrap();
        assert_eq!(t.recv(sub1).unwrap()[0], Bytes::from_static(b"tick"));
        assert_eq!(t.recv(sub2).unwrap()[0], Bytes::from_static(b"tick"));
    }

    #[test]
    fn test_round_robin_distribution() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let push = t.socket_new(ctx, SocketKind::Push).unwrap();
        t.bind(push, "inproc://rr").unwrap();

        let w1 = t.socket_new(ctx, SocketKind::Pull).unwrap();
        let w2 = t.socket_new(ctx, SocketKind::Pull).unwrap();
        t.connect(w1, "inproc://rr").unwrap();
        t.connect(w2, "inproc://rr").unwrap();

        t.send(push, vec![Bytes::from_static(b"a")]).unwrap();
        t.send(push, vec![Bytes::from_static(b"b")]).unwrap();
        assert_eq!(t.recv(w1).unwrap()[0], Bytes::from_static(b"a"));
        assert_eq!(t.recv(w2).unwrap()[0], Bytes::from_static(b"b"));
    }

    #[test]
    fn test_terminated_context_rejects_operations() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Pair).unwrap();
        t.ctx_term(ctx).unwrap();

        assert_eq!(t.socket_new(ctx, SocketKind::Pair).unwrap_err().code(), errno::ETERM);
        assert_eq!(t.poll(s, PollEvents::IN, 0).unwrap_err().code(), errno::ETERM);
    }

    #[test]
    fn test_closed_socket_handle_is_dead() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Pair).unwrap();
        t.socket_close(s).unwrap();
        assert_eq!(t.recv(s).unwrap_err().code(), errno::ENOTSOCK);
        assert_eq!(t.socket_close(s).unwrap_err().code(), errno::ENOTSOCK);
    }

    #[test]
    fn test_get_option_unset_is_invalid() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Pair).unwrap();
        assert_eq!(
            t.get_option(s, options::LAST_ENDPOINT).unwrap_err().code(),
            errno::EINVAL
        );
        assert_eq!(t.get_option(s, options::RCVTIMEO).unwrap_err().code(), errno::EINVAL);

        t.set_option(s, options::RCVTIMEO, &options::encode_int(5000)).unwrap();
        let raw = t.get_option(s, options::RCVTIMEO).unwrap();
        assert_eq!(options::decode_int(&raw), Some(5000));
    }

    #[test]
    fn test_type_option_reports_kind() {
        let t = LoopbackTransport::new();
        let ctx = t.ctx_new().unwrap();
        let s = t.socket_new(ctx, SocketKind::Router).unwrap();
        let raw = t.get_option(s, options::TYPE).unwrap();
        assert_eq!(options::decode_int(&raw), Some(SocketKind::Router.code()));
    }

    #[test]
    fn test_cross_thread_delivery_wakes_poller() {
        let t = Arc::new(LoopbackTransport::new());
        let (server, client) = pair(&t, "inproc://wake");

        let t2 = t.clone();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            t2.send(client, vec![Bytes::from_static(b"ping")]).unwrap();
        });

        let ready = t.poll(server, PollEvents::IN, 1000).unwrap();
        assert!(ready.contains(PollEvents::IN));
        assert_eq!(t.recv(server).unwrap()[0], Bytes::from_static(b"ping"));
        sender.join().unwrap();
    }
}
