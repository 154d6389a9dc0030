//! The raw transport capability boundary.
//!
//! Everything the binding layer needs from an underlying messaging transport
//! is collected in the [`RawTransport`] trait: context and socket lifecycle,
//! option access, endpoint attachment, readiness polling, and whole-message
//! send/receive. Implementations report failures as [`RawError`] values
//! carrying an errno-style code; interrupted-by-signal outcomes are reported
//! as `EINTR` and retried (or not) by the caller according to each
//! operation's contract.

use std::fmt;
use std::ops::BitOr;

use bytes::Bytes;

use crate::errno;
use crate::socket_type::SocketKind;

/// Opaque handle for a transport I/O context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawContext(pub u64);

/// Opaque handle for a transport socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSocket(pub u64);

/// A transport-level failure: an errno-style code plus its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawError {
    code: i32,
}

impl RawError {
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// The numeric error code.
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// True when the operation was interrupted by a signal and may be
    /// retried where the operation's contract allows it.
    pub const fn is_interrupted(&self) -> bool {
        self.code == errno::EINTR
    }

    /// True when the operation could not proceed right now (no message,
    /// no peer) rather than failing outright.
    pub const fn would_block(&self) -> bool {
        self.code == errno::EAGAIN
    }

    /// Text description of the code.
    pub fn message(&self) -> &'static str {
        errno::strerror(self.code)
    }
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code)
    }
}

impl std::error::Error for RawError {}

/// Result alias for raw transport calls.
pub type RawResult<T> = std::result::Result<T, RawError>;

/// Readiness event mask for [`RawTransport::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollEvents(u8);

impl PollEvents {
    /// No events.
    pub const NONE: PollEvents = PollEvents(0);
    /// A message can be received without blocking.
    pub const IN: PollEvents = PollEvents(1);
    /// A message can be sent without blocking.
    pub const OUT: PollEvents = PollEvents(2);

    pub const fn contains(self, other: PollEvents) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PollEvents {
    type Output = PollEvents;

    fn bitor(self, rhs: PollEvents) -> PollEvents {
        PollEvents(self.0 | rhs.0)
    }
}

/// The capability an underlying messaging transport must provide.
///
/// Handles are opaque; the transport owns all resource state behind them.
/// A multipart message crosses this boundary as an ordered `Vec<Bytes>` and
/// is sent or received atomically as one unit.
///
/// Contract notes, per operation:
///
/// - `ctx_term` may report `EINTR`; callers retry until it does not.
/// - `bind` and `connect` are never subject to `EINTR` and are not retried.
/// - `set_option`/`get_option` may report `EINTR`; callers retry
///   transparently.
/// - `poll` returns the ready subset of the requested events; an empty set
///   means the timeout elapsed. `EINTR` means the wait was interrupted and
///   the caller decides whether to wait again.
/// - `recv` reports `EAGAIN` when no message is queued; `send` reports
///   `EAGAIN` when no peer can accept one.
pub trait RawTransport: Send + Sync + 'static {
    /// Allocate a new I/O context.
    fn ctx_new(&self) -> RawResult<RawContext>;

    /// Terminate a context. Safe to call once per context.
    fn ctx_term(&self, ctx: RawContext) -> RawResult<()>;

    /// Create a socket of the given kind inside a context.
    fn socket_new(&self, ctx: RawContext, kind: SocketKind) -> RawResult<RawSocket>;

    /// Close a socket, releasing its endpoints and waking any pollers.
    fn socket_close(&self, sock: RawSocket) -> RawResult<()>;

    /// Set a socket option from an opaque value buffer.
    fn set_option(&self, sock: RawSocket, option: i32, value: &[u8]) -> RawResult<()>;

    /// Read a socket option as an opaque value buffer.
    fn get_option(&self, sock: RawSocket, option: i32) -> RawResult<Vec<u8>>;

    /// Bind the socket to a local endpoint.
    fn bind(&self, sock: RawSocket, endpoint: &str) -> RawResult<()>;

    /// Connect the socket to a remote endpoint.
    fn connect(&self, sock: RawSocket, endpoint: &str) -> RawResult<()>;

    /// Wait up to `timeout_ms` milliseconds for any of the requested events.
    /// A negative timeout waits without bound.
    fn poll(&self, sock: RawSocket, events: PollEvents, timeout_ms: i64) -> RawResult<PollEvents>;

    /// Send one multipart message.
    fn send(&self, sock: RawSocket, frames: Vec<Bytes>) -> RawResult<()>;

    /// Receive one multipart message.
    fn recv(&self, sock: RawSocket) -> RawResult<Vec<Bytes>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_events_combine() {
        let both = PollEvents::IN | PollEvents::OUT;
        assert!(both.contains(PollEvents::IN));
        assert!(both.contains(PollEvents::OUT));
        assert!(!PollEvents::IN.contains(PollEvents::OUT));
        assert!(PollEvents::NONE.is_empty());
        assert!(!both.is_empty());
    }

    #[test]
    fn test_none_is_never_contained() {
        assert!(!PollEvents::IN.contains(PollEvents::NONE));
    }

    #[test]
    fn test_raw_error_predicates() {
        assert!(RawError::new(errno::EINTR).is_interrupted());
        assert!(RawError::new(errno::EAGAIN).would_block());
        assert!(!RawError::new(errno::EINVAL).is_interrupted());
    }

    #[test]
    fn test_raw_error_display() {
        let err = RawError::new(errno::EADDRINUSE);
        assert_eq!(err.to_string(), format!("address already in use ({})", errno::EADDRINUSE));
    }
}
