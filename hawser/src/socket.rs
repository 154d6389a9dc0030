//! Socket lifecycle, endpoint attachment, and poll-guarded I/O.
//!
//! A `Socket` owns one transport socket handle bound to a [`Context`]. Its
//! kind is fixed at construction and determines the default attachment
//! direction; send, receive, and connect timeouts default to two minutes
//! and are mutable through option calls. Every blocking send or receive is
//! preceded by a readiness poll bounded by the corresponding timeout.
//!
//! Sockets are confined to their creating thread unless promoted with
//! [`Socket::mark_thread_safe`].

use std::sync::Arc;

use hawser_core::endpoint::{classify, split_spec, tcp_port_token, trailing_port, Direction};
use hawser_core::options;
use hawser_core::raw::{PollEvents, RawError, RawSocket, RawTransport};
use hawser_core::socket_type::SocketKind;
use tracing::{debug, trace};

use crate::affinity::ThreadAffinity;
use crate::context::Context;
use crate::error::{HawserError, Result};
use crate::message::Message;

const RESOURCE: &str = "Socket";

/// One communication endpoint of a fixed kind.
///
/// # Example
///
/// ```
/// use hawser::{Context, Socket, SocketKind};
///
/// # fn main() -> hawser::Result<()> {
/// let ctx = Context::new()?;
/// let mut server = Socket::bound(&ctx, SocketKind::Pair, None, Some("inproc://doc-pair"))?;
/// let mut client = Socket::connected(&ctx, SocketKind::Pair, None, Some("inproc://doc-pair"))?;
///
/// let mut msg = hawser::Message::new();
/// msg.append_frames(&["hello".into()])?;
/// client.send(msg)?;
///
/// let reply = server.recv()?;
/// assert_eq!(reply.frames()[0].data(), b"hello");
/// # Ok(())
/// # }
/// ```
pub struct Socket {
    transport: Arc<dyn RawTransport>,
    handle: RawSocket,
    kind: SocketKind,
    affinity: ThreadAffinity,
    send_timeout_ms: i32,
    recv_timeout_ms: i32,
    connect_timeout_ms: i32,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("affinity", &self.affinity)
            .field("send_timeout_ms", &self.send_timeout_ms)
            .field("recv_timeout_ms", &self.recv_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl Socket {
    /// Create a socket with no identity and no attachment.
    pub fn new(ctx: &Context, kind: SocketKind) -> Result<Self> {
        Self::create(ctx, kind, None, None, kind.default_direction())
    }

    /// Create a socket and attach it with bind as the default direction.
    ///
    /// `identity`, when supplied and non-empty, is set before attachment;
    /// an identity failure skips attachment entirely. `endpoints`, when
    /// supplied and non-empty, is attached as part of construction.
    pub fn bound(
        ctx: &Context,
        kind: SocketKind,
        identity: Option<&str>,
        endpoints: Option<&str>,
    ) -> Result<Self> {
        Self::create(ctx, kind, identity, endpoints, Direction::Bind)
    }

    /// Create a socket and attach it with connect as the default direction.
    pub fn connected(
        ctx: &Context,
        kind: SocketKind,
        identity: Option<&str>,
        endpoints: Option<&str>,
    ) -> Result<Self> {
        Self::create(ctx, kind, identity, endpoints, Direction::Connect)
    }

    fn create(
        ctx: &Context,
        kind: SocketKind,
        identity: Option<&str>,
        endpoints: Option<&str>,
        direction: Direction,
    ) -> Result<Self> {
        let transport = ctx.transport();
        let handle = transport
            .socket_new(ctx.raw(), kind)
            .map_err(|source| HawserError::SocketConstruction { kind, source })?;

        let mut sock = Self {
            transport,
            handle,
            kind,
            affinity: ThreadAffinity::new(),
            send_timeout_ms: options::DEFAULT_TIMEOUT_MS,
            recv_timeout_ms: options::DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: options::DEFAULT_TIMEOUT_MS,
        };
        sock.apply_default_timeouts();
        debug!("created {} socket", kind);

        if let Some(id) = identity {
            if !id.is_empty() {
                sock.set_identity(id)?;
            }
        }
        if let Some(spec) = endpoints {
            if !spec.is_empty() {
                sock.attach(spec, direction == Direction::Bind)?;
            }
        }
        Ok(sock)
    }

    // best-effort: the defaults are re-settable through the public option
    // calls, which do surface failures
    fn apply_default_timeouts(&self) {
        let v = options::encode_int(options::DEFAULT_TIMEOUT_MS);
        let _ = self.set_option_raw(options::SNDTIMEO, &v);
        let _ = self.set_option_raw(options::RCVTIMEO, &v);
        let _ = self.set_option_raw(options::CONNECT_TIMEOUT, &v);
    }

    /// Attach to a comma-separated endpoint specification.
    ///
    /// Endpoints are processed left to right: a `@` prefix forces a bind, a
    /// `>` prefix forces a connect, anything else follows `do_bind`.
    /// Processing stops at the first failing endpoint; endpoints attached
    /// earlier in the same call stay attached.
    pub fn attach(&mut self, endpoints: &str, do_bind: bool) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        let default = if do_bind {
            Direction::Bind
        } else {
            Direction::Connect
        };
        for segment in split_spec(endpoints) {
            match classify(segment, default) {
                (Direction::Bind, ep) => {
                    self.bind_endpoint(ep)?;
                }
                (Direction::Connect, ep) => self.connect_endpoint(ep)?,
            }
        }
        Ok(())
    }

    /// Bind to one endpoint, resolving the actual port where possible.
    ///
    /// For a TCP endpoint ending in a port number or `*`: a concrete
    /// nonzero port is returned as given; a `0` or `*` request is resolved
    /// by querying the transport's last bound endpoint, degrading to 0 if
    /// that probe fails. Other endpoints bind plainly and return 0.
    pub fn bind(&mut self, endpoint: &str) -> Result<u16> {
        self.affinity.check(RESOURCE)?;
        self.bind_endpoint(endpoint)
    }

    fn bind_endpoint(&mut self, endpoint: &str) -> Result<u16> {
        // bind is not subject to interrupt retries
        self.transport.bind(self.handle, endpoint).map_err(|source| HawserError::Bind {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let port = match tcp_port_token(endpoint) {
            Some(token) => {
                let requested: u16 = token.parse().unwrap_or(0);
                if requested != 0 {
                    requested
                } else {
                    self.get_option_raw(options::LAST_ENDPOINT)
                        .ok()
                        .and_then(|raw| String::from_utf8(raw).ok())
                        .and_then(|ep| trailing_port(&ep))
                        .unwrap_or(0)
                }
            }
            None => 0,
        };
        debug!("socket bound to {endpoint} (port {port})");
        Ok(port)
    }

    /// Connect to one endpoint.
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.connect_endpoint(endpoint)
    }

    fn connect_endpoint(&mut self, endpoint: &str) -> Result<()> {
        // connect is not subject to interrupt retries
        self.transport
            .connect(self.handle, endpoint)
            .map_err(|source| HawserError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;
        debug!("socket connected to {endpoint}");
        Ok(())
    }

    /// Wait for readiness, bounded by `timeout_ms`.
    ///
    /// `caller` names the waiting operation in any timeout or poll error.
    pub fn poll(&mut self, events: PollEvents, timeout_ms: i64, caller: &'static str) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.poll_ready(events, timeout_ms, caller)
    }

    fn poll_ready(&self, events: PollEvents, timeout_ms: i64, caller: &'static str) -> Result<()> {
        loop {
            match self.transport.poll(self.handle, events, timeout_ms) {
                Ok(ready) if !ready.is_empty() => return Ok(()),
                Ok(_) => {
                    return Err(HawserError::Timeout {
                        caller,
                        timeout_ms,
                        outbound: events.contains(PollEvents::OUT),
                    })
                }
                Err(e) if e.is_interrupted() => {
                    // retried with the original timeout: an interrupt does
                    // not shrink the remaining wait
                    trace!("poll interrupted in {caller}(), retrying");
                }
                Err(source) => return Err(HawserError::Poll { caller, source }),
            }
        }
    }

    /// Send one message, waiting up to the send timeout for the socket to
    /// accept it.
    pub fn send(&mut self, msg: Message) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.poll_ready(PollEvents::OUT, i64::from(self.send_timeout_ms), "send")?;
        self.transport
            .send(self.handle, msg.into_wire_frames())
            .map_err(|source| HawserError::Send { source })
    }

    /// Receive one message, waiting up to the receive timeout for one to
    /// arrive. The returned message belongs to the calling thread.
    pub fn recv(&mut self) -> Result<Message> {
        self.affinity.check(RESOURCE)?;
        self.poll_ready(PollEvents::IN, i64::from(self.recv_timeout_ms), "recv")?;
        let frames = self
            .transport
            .recv(self.handle)
            .map_err(|source| HawserError::Recv { source })?;
        Ok(Message::from_wire_frames(frames))
    }

    /// Set a socket option from an opaque value buffer.
    pub fn set_option(&mut self, option: i32, value: &[u8]) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(option, value)
            .map_err(|source| HawserError::OptionSet { option, source })
    }

    /// Read a socket option as an opaque value buffer.
    pub fn get_option(&self, option: i32) -> Result<Vec<u8>> {
        self.affinity.check(RESOURCE)?;
        self.get_option_raw(option)
            .map_err(|source| HawserError::OptionGet { option, source })
    }

    fn set_option_raw(&self, option: i32, value: &[u8]) -> std::result::Result<(), RawError> {
        loop {
            match self.transport.set_option(self.handle, option, value) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_interrupted() => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn get_option_raw(&self, option: i32) -> std::result::Result<Vec<u8>, RawError> {
        loop {
            match self.transport.get_option(self.handle, option) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_interrupted() => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Set the socket identity (UTF-8 text).
    pub fn set_identity(&mut self, identity: &str) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::ROUTING_ID, identity.as_bytes())
            .map_err(|source| HawserError::IdentitySet {
                identity: identity.to_string(),
                source,
            })
    }

    /// Add a subscription prefix (SUB/XSUB sockets).
    pub fn subscribe(&mut self, prefix: &str) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::SUBSCRIBE, prefix.as_bytes())
            .map_err(|source| HawserError::Subscribe {
                topic: prefix.to_string(),
                source,
            })
    }

    /// Remove a subscription prefix (SUB/XSUB sockets).
    pub fn unsubscribe(&mut self, prefix: &str) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::UNSUBSCRIBE, prefix.as_bytes())
            .map_err(|source| HawserError::Subscribe {
                topic: prefix.to_string(),
                source,
            })
    }

    /// Update the send timeout, in milliseconds.
    pub fn set_send_timeout(&mut self, timeout_ms: i32) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::SNDTIMEO, &options::encode_int(timeout_ms))
            .map_err(|source| HawserError::OptionSet {
                option: options::SNDTIMEO,
                source,
            })?;
        self.send_timeout_ms = timeout_ms;
        Ok(())
    }

    /// Update the receive timeout, in milliseconds.
    pub fn set_recv_timeout(&mut self, timeout_ms: i32) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::RCVTIMEO, &options::encode_int(timeout_ms))
            .map_err(|source| HawserError::OptionSet {
                option: options::RCVTIMEO,
                source,
            })?;
        self.recv_timeout_ms = timeout_ms;
        Ok(())
    }

    /// Update the connect timeout, in milliseconds.
    pub fn set_connect_timeout(&mut self, timeout_ms: i32) -> Result<()> {
        self.affinity.check(RESOURCE)?;
        self.set_option_raw(options::CONNECT_TIMEOUT, &options::encode_int(timeout_ms))
            .map_err(|source| HawserError::OptionSet {
                option: options::CONNECT_TIMEOUT,
                source,
            })?;
        self.connect_timeout_ms = timeout_ms;
        Ok(())
    }

    #[must_use]
    pub fn send_timeout_ms(&self) -> i32 {
        self.send_timeout_ms
    }

    #[must_use]
    pub fn recv_timeout_ms(&self) -> i32 {
        self.recv_timeout_ms
    }

    #[must_use]
    pub fn connect_timeout_ms(&self) -> i32 {
        self.connect_timeout_ms
    }

    /// The socket's kind.
    #[must_use]
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// The kind's numeric type code.
    #[must_use]
    pub fn type_code(&self) -> i32 {
        self.kind.code()
    }

    /// The kind's name ("DEALER", "ROUTER", ...).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Promote for deliberate cross-thread sharing. One-way; panics if
    /// called twice. Mutual exclusion for the shared value remains the
    /// caller's responsibility.
    pub fn mark_thread_safe(&mut self) {
        self.affinity.mark_thread_safe();
    }

}

impl Drop for Socket {
    fn drop(&mut self) {
        // the handle is closed exactly once; a socket that failed to
        // construct never produced a value to drop
        let _ = self.transport.socket_close(self.handle);
    }
}
