//! Socket option codes and value encoding.
//!
//! Options cross the transport boundary as an integer code plus an opaque
//! value buffer. The codes here match the conventional transport numbering;
//! integer-valued options are encoded in native byte order, four bytes wide.

/// Socket identity / routing id (opaque bytes, UTF-8 text at the binding
/// surface).
pub const ROUTING_ID: i32 = 5;

/// Subscription prefix to add (SUB/XSUB).
pub const SUBSCRIBE: i32 = 6;

/// Subscription prefix to remove (SUB/XSUB).
pub const UNSUBSCRIBE: i32 = 7;

/// The socket's kind code (read-only, i32).
pub const TYPE: i32 = 16;

/// Linger period on close, milliseconds (i32).
pub const LINGER: i32 = 17;

/// Receive timeout, milliseconds (i32).
pub const RCVTIMEO: i32 = 27;

/// Send timeout, milliseconds (i32).
pub const SNDTIMEO: i32 = 28;

/// The last endpoint this socket bound or connected to (string, read-only).
pub const LAST_ENDPOINT: i32 = 32;

/// Connect timeout, milliseconds (i32).
pub const CONNECT_TIMEOUT: i32 = 79;

/// Default send/receive/connect timeout applied to every socket at
/// construction: 2 minutes.
pub const DEFAULT_TIMEOUT_MS: i32 = 120_000;

/// Encode an integer option value the way the transport expects it.
pub fn encode_int(value: i32) -> [u8; 4] {
    value.to_ne_bytes()
}

/// Decode an integer option value; `None` when the buffer has the wrong
/// width.
pub fn decode_int(buf: &[u8]) -> Option<i32> {
    buf.try_into().ok().map(i32::from_ne_bytes)
}
