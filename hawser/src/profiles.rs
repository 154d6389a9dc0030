//! Fixed-role convenience constructors.
//!
//! One constructor per socket kind, fixing the kind and its conventional
//! attachment direction. Kinds that address peers by identity (REQ, REP,
//! DEALER, ROUTER) accept one; the subscriber constructor applies an
//! optional subscription prefix after attachment.

use crate::context::Context;
use crate::error::Result;
use crate::socket::Socket;
use hawser_core::socket_type::SocketKind;

impl Socket {
    /// PUB socket; binds by default.
    pub fn publisher(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::Pub, None, endpoints)
    }

    /// SUB socket; connects by default, then subscribes to `subscription`
    /// when one is given.
    pub fn subscriber(
        ctx: &Context,
        endpoints: Option<&str>,
        subscription: Option<&str>,
    ) -> Result<Self> {
        let mut sock = Self::connected(ctx, SocketKind::Sub, None, endpoints)?;
        if let Some(prefix) = subscription {
            sock.subscribe(prefix)?;
        }
        Ok(sock)
    }

    /// REQ socket; connects by default.
    pub fn request(ctx: &Context, identity: Option<&str>, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Req, identity, endpoints)
    }

    /// REP socket; binds by default.
    pub fn reply(ctx: &Context, identity: Option<&str>, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::Rep, identity, endpoints)
    }

    /// DEALER socket; connects by default.
    pub fn dealer(ctx: &Context, identity: Option<&str>, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Dealer, identity, endpoints)
    }

    /// ROUTER socket; binds by default.
    pub fn router(ctx: &Context, identity: Option<&str>, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::Router, identity, endpoints)
    }

    /// PUSH socket; connects by default.
    pub fn push_socket(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Push, None, endpoints)
    }

    /// PULL socket; binds by default.
    pub fn pull(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::Pull, None, endpoints)
    }

    /// XPUB socket; binds by default.
    pub fn xpub(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::XPub, None, endpoints)
    }

    /// XSUB socket; connects by default.
    pub fn xsub(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::XSub, None, endpoints)
    }

    /// PAIR socket; connects by default.
    pub fn pair(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Pair, None, endpoints)
    }

    /// STREAM socket; connects by default.
    pub fn stream(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Stream, None, endpoints)
    }

    /// RADIO socket; connects by default.
    pub fn radio(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::connected(ctx, SocketKind::Radio, None, endpoints)
    }

    /// DISH socket; binds by default.
    pub fn dish(ctx: &Context, endpoints: Option<&str>) -> Result<Self> {
        Self::bound(ctx, SocketKind::Dish, None, endpoints)
    }
}
