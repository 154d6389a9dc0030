//! Errno-style error codes reported by transport implementations.
//!
//! The transport boundary reports failures as numeric codes plus a text
//! description, the way libzmq does. Codes below `HAUSNUMERO` match the
//! classic POSIX values; codes at or above it are transport-defined
//! conditions that have no portable POSIX equivalent.

/// Operation interrupted by a signal before completion.
pub const EINTR: i32 = 4;

/// Resource temporarily unavailable (no message ready, no peer able to
/// accept one).
pub const EAGAIN: i32 = 11;

/// Bad address supplied to the transport.
pub const EFAULT: i32 = 14;

/// Invalid argument (malformed endpoint, unknown option code).
pub const EINVAL: i32 = 22;

/// Too many open sockets.
pub const EMFILE: i32 = 24;

/// The operand is not a live socket handle.
pub const ENOTSOCK: i32 = 88;

/// The requested endpoint is already bound.
pub const EADDRINUSE: i32 = 98;

/// The requested endpoint is not local.
pub const EADDRNOTAVAIL: i32 = 99;

/// No peer is listening on the requested endpoint.
pub const ECONNREFUSED: i32 = 111;

/// Base for transport-defined codes, kept clear of any errno range.
pub const HAUSNUMERO: i32 = 156_384_712;

/// The operation is not supported by this socket kind.
pub const ENOTSUP: i32 = HAUSNUMERO + 1;

/// The endpoint's transport scheme is not supported.
pub const EPROTONOSUPPORT: i32 = HAUSNUMERO + 2;

/// The owning context was terminated.
pub const ETERM: i32 = HAUSNUMERO + 53;

/// Text description for a transport error code.
///
/// Unknown codes map to a generic description rather than panicking; the
/// numeric code is still carried alongside wherever errors are surfaced.
pub fn strerror(code: i32) -> &'static str {
    match code {
        EINTR => "interrupted system call",
        EAGAIN => "resource temporarily unavailable",
        EFAULT => "bad address",
        EINVAL => "invalid argument",
        EMFILE => "too many open sockets",
        ENOTSOCK => "the provided handle is not a live socket",
        EADDRINUSE => "address already in use",
        EADDRNOTAVAIL => "address not available",
        ECONNREFUSED => "connection refused",
        ENOTSUP => "operation not supported by socket kind",
        EPROTONOSUPPORT => "transport scheme not supported",
        ETERM => "context was terminated",
        _ => "unknown transport error",
    }
}
