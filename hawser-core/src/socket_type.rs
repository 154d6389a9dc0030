//! Socket kind enumeration.
//!
//! Each socket carries one immutable kind chosen at construction. The kind
//! fixes the numeric type code reported to the transport, the human-readable
//! type name, and the default attachment direction used when an endpoint
//! specification does not force one.

use std::fmt;

use crate::endpoint::Direction;

/// Messaging socket kinds, numbered as the transport expects them
/// (draft kinds RADIO/DISH included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketKind {
    /// Exclusive bidirectional communication between two peers
    Pair = 0,

    /// Publish messages to all subscribers
    Pub = 1,

    /// Subscribe to published messages
    Sub = 2,

    /// Synchronous request-reply client
    Req = 3,

    /// Synchronous request-reply server
    Rep = 4,

    /// Asynchronous request-reply client
    Dealer = 5,

    /// Route messages by peer identity
    Router = 6,

    /// Receive messages from pushers
    Pull = 7,

    /// Send messages to pullers
    Push = 8,

    /// Extended publisher with subscription visibility
    XPub = 9,

    /// Extended subscriber with explicit subscription control
    XSub = 10,

    /// Raw byte-stream connections
    Stream = 11,

    /// Group-addressed publisher (draft)
    Radio = 14,

    /// Group-addressed subscriber (draft)
    Dish = 15,
}

impl SocketKind {
    /// The numeric type code reported to the transport.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// The socket kind as a string name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Stream => "STREAM",
            Self::Radio => "RADIO",
            Self::Dish => "DISH",
        }
    }

    /// Default attachment direction when an endpoint does not force one.
    ///
    /// Server-ish kinds bind, client-ish kinds connect, following the
    /// conventional fixed-role constructors.
    pub const fn default_direction(self) -> Direction {
        match self {
            Self::Pub | Self::Rep | Self::Router | Self::Pull | Self::XPub | Self::Dish => {
                Direction::Bind
            }
            Self::Pair
            | Self::Sub
            | Self::Req
            | Self::Dealer
            | Self::Push
            | Self::XSub
            | Self::Stream
            | Self::Radio => Direction::Connect,
        }
    }

    /// True for kinds that fan a sent message out to every connected peer
    /// rather than to a single one.
    pub const fn broadcasts(self) -> bool {
        matches!(self, Self::Pub | Self::XPub | Self::Radio)
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
