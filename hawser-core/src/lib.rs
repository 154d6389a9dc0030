//! Hawser Core
//!
//! Transport-facing building blocks for the hawser binding layer:
//! - Errno-style error codes (`errno`)
//! - The raw transport capability trait and handle types (`raw`)
//! - Socket kind enumeration (`socket_type`)
//! - Socket option codes and value encoding (`options`)
//! - Endpoint-specification grammar (`endpoint`)
//! - In-process reference transport (`loopback`)
//! - Fault-injecting transport decorator (`interrupt`)

#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod endpoint;
pub mod errno;
pub mod interrupt;
pub mod loopback;
pub mod options;
pub mod raw;
pub mod socket_type;

// Small prelude for downstream crates; kept minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::endpoint::Direction;
    pub use crate::interrupt::{InterruptingTransport, Op};
    pub use crate::loopback::LoopbackTransport;
    pub use crate::raw::{PollEvents, RawContext, RawError, RawSocket, RawTransport};
    pub use crate::socket_type::SocketKind;
}
