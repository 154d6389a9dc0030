//! Hawser
//!
//! Socket, frame, and message bindings over a ZeroMQ-style transport,
//! adding lifecycle safety, endpoint-attachment parsing, and
//! timeout-bounded I/O on top of the raw transport capability:
//!
//! - [`Context`] owns the transport's I/O context; terminated exactly once.
//! - [`Socket`] wraps one socket handle: kind, endpoint attachment with the
//!   `@`/`>` grammar and dynamic port resolution, poll-guarded send and
//!   receive, option access, teardown.
//! - [`Frame`] and [`Message`] own the payload: one buffer, and an ordered
//!   sequence of buffers, with deep copies.
//! - [`ThreadAffinity`] confines sockets and messages to their creating
//!   thread unless deliberately promoted.
//!
//! The transport itself is pluggable via `hawser_core::raw::RawTransport`;
//! an in-process loopback implementation ships in `hawser-core` and backs
//! [`Context::new`].
//!
//! # Example
//!
//! ```
//! use hawser::{Context, Socket};
//!
//! # fn main() -> hawser::Result<()> {
//! let ctx = Context::new()?;
//!
//! // bind with a dynamic port and recover the one actually assigned
//! let mut sink = Socket::pull(&ctx, None)?;
//! let port = sink.bind("tcp://127.0.0.1:0")?;
//! assert!(port > 0);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]

pub mod affinity;
pub mod context;
pub mod dev_tracing;
pub mod error;
pub mod frame;
pub mod message;
pub mod profiles;
pub mod socket;

pub use affinity::ThreadAffinity;
pub use context::Context;
pub use error::{HawserError, Result};
pub use frame::Frame;
pub use message::{FrameValue, Message};
pub use socket::Socket;

// Re-export the transport-facing vocabulary used in this crate's public API.
pub use hawser_core::endpoint::Direction;
pub use hawser_core::raw::PollEvents;
pub use hawser_core::socket_type::SocketKind;
