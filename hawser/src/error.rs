//! Error types for the binding layer.
//!
//! Every failure carries enough context to be diagnosed without stack
//! inspection: the operation's caller label for polls, the literal endpoint
//! for bind/connect, the option code for option calls, the element index for
//! frame conversion. Transport-born variants chain the raw errno-style code
//! as their source.

use std::thread::ThreadId;

use hawser_core::raw::RawError;
use hawser_core::socket_type::SocketKind;
use thiserror::Error;

/// Main error type for hawser operations.
#[derive(Debug, Error)]
pub enum HawserError {
    /// The transport could not allocate an I/O context. Treated as a fatal
    /// resource-exhaustion condition, not a recoverable error.
    #[error("error creating context: {source}")]
    ContextConstruction { source: RawError },

    /// The transport could not allocate a socket; no socket value exists
    /// after this error.
    #[error("error creating {kind} socket: {source}")]
    SocketConstruction { kind: SocketKind, source: RawError },

    /// A non-promoted resource was touched from a thread other than its
    /// creator.
    #[error(
        "this {resource} was created on thread {owner:?}; it is an error to \
         access it from any other thread (accessed from {current:?})"
    )]
    ThreadAffinity {
        resource: &'static str,
        owner: ThreadId,
        current: ThreadId,
    },

    /// Setting the socket identity failed; attachment was skipped.
    #[error("error setting identity \"{identity}\": {source}")]
    IdentitySet { identity: String, source: RawError },

    #[error("failed to bind to \"{endpoint}\": {source}")]
    Bind { endpoint: String, source: RawError },

    #[error("failed to connect to \"{endpoint}\": {source}")]
    Connect { endpoint: String, source: RawError },

    /// A bounded wait elapsed with no readiness.
    #[error(
        "timeout waiting {timeout_ms} ms in {caller}() for data{} on the socket",
        direction_suffix(.outbound)
    )]
    Timeout {
        caller: &'static str,
        timeout_ms: i64,
        outbound: bool,
    },

    /// The readiness wait itself failed.
    #[error("error polling in {caller}(): {source}")]
    Poll { caller: &'static str, source: RawError },

    #[error("error sending message: {source}")]
    Send { source: RawError },

    #[error("error receiving message: {source}")]
    Recv { source: RawError },

    #[error("error setting socket option {option}: {source}")]
    OptionSet { option: i32, source: RawError },

    #[error("error getting socket option {option}: {source}")]
    OptionGet { option: i32, source: RawError },

    #[error("error updating subscription \"{topic}\": {source}")]
    Subscribe { topic: String, source: RawError },

    /// An element of a structured frame sequence could not become a frame.
    #[error(
        "cannot convert element {index} of {len} to a frame: nested sequences \
         are not supported"
    )]
    UnsupportedFrameValue { index: usize, len: usize },
}

fn direction_suffix(outbound: &bool) -> &'static str {
    if *outbound {
        " to be sent"
    } else {
        ""
    }
}

impl HawserError {
    /// The transport's numeric error code, when this failure came from the
    /// transport.
    #[must_use]
    pub fn transport_code(&self) -> Option<i32> {
        match self {
            Self::ContextConstruction { source }
            | Self::SocketConstruction { source, .. }
            | Self::IdentitySet { source, .. }
            | Self::Bind { source, .. }
            | Self::Connect { source, .. }
            | Self::Poll { source, .. }
            | Self::Send { source }
            | Self::Recv { source }
            | Self::OptionSet { source, .. }
            | Self::OptionGet { source, .. }
            | Self::Subscribe { source, .. } => Some(source.code()),
            Self::ThreadAffinity { .. } | Self::Timeout { .. } | Self::UnsupportedFrameValue { .. } => {
                None
            }
        }
    }

    /// True for a wait that elapsed rather than failed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for hawser operations.
pub type Result<T> = std::result::Result<T, HawserError>;
