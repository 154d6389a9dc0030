//! Fault-injecting transport decorator.
//!
//! Wraps any [`RawTransport`] and makes selected operations fail a configured
//! number of times before delegating to the inner transport. The default
//! injected code is `EINTR`, which is how the binding layer's retry contracts
//! are exercised: poll/option/terminate loops must absorb the injections,
//! while bind and connect must surface them unretried.

use std::sync::Arc;

use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::errno;
use crate::raw::{PollEvents, RawContext, RawError, RawResult, RawSocket, RawTransport};
use crate::socket_type::SocketKind;

/// Operations that can have failures injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CtxTerm,
    Poll,
    SetOption,
    GetOption,
    Bind,
    Connect,
    Send,
    Recv,
}

#[derive(Clone, Copy)]
struct Injection {
    code: i32,
    remaining: usize,
}

/// A [`RawTransport`] wrapper that injects failures on demand.
pub struct InterruptingTransport<T> {
    inner: Arc<T>,
    injections: Mutex<HashMap<Op, Injection>>,
}

impl<T: RawTransport> InterruptingTransport<T> {
    pub fn new(inner: Arc<T>) -> Self {
        Self {
            inner,
            injections: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next `count` calls of `op` fail with `EINTR`.
    pub fn interrupt(&self, op: Op, count: usize) {
        self.fail_with(op, errno::EINTR, count);
    }

    /// Make the next `count` calls of `op` fail with an arbitrary code.
    /// `usize::MAX` keeps the op failing for the life of the wrapper.
    pub fn fail_with(&self, op: Op, code: i32, count: usize) {
        self.injections
            .lock()
            .insert(op, Injection { code, remaining: count });
    }

    /// Injections left for `op`.
    pub fn pending(&self, op: Op) -> usize {
        self.injections.lock().get(&op).map_or(0, |i| i.remaining)
    }

    fn intercept(&self, op: Op) -> RawResult<()> {
        let mut injections = self.injections.lock();
        if let Some(inj) = injections.get_mut(&op) {
            if inj.remaining > 0 {
                if inj.remaining != usize::MAX {
                    inj.remaining -= 1;
                }
                return Err(RawError::new(inj.code));
            }
        }
        Ok(())
    }
}

impl<T: RawTransport> RawTransport for InterruptingTransport<T> {
    fn ctx_new(&self) -> RawResult<RawContext> {
        self.inner.ctx_new()
    }

    fn ctx_term(&self, ctx: RawContext) -> RawResult<()> {
        self.intercept(Op::CtxTerm)?;
        self.inner.ctx_term(ctx)
    }

    fn socket_new(&self, ctx: RawContext, kind: SocketKind) -> RawResult<RawSocket> {
        self.inner.socket_new(ctx, kind)
    }

    fn socket_close(&self, sock: RawSocket) -> RawResult<()> {
        self.inner.socket_close(sock)
    }

    fn set_option(&self, sock: RawSocket, option: i32, value: &[u8]) -> RawResult<()> {
        self.intercept(Op::SetOption)?;
        self.inner.set_option(sock, option, value)
    }

    fn get_option(&self, sock: RawSocket, option: i32) -> RawResult<Vec<u8>> {
        self.intercept(Op::GetOption)?;
        self.inner.get_option(sock, option)
    }

    fn bind(&self, sock: RawSocket, endpoint: &str) -> RawResult<()> {
        self.intercept(Op::Bind)?;
        self.inner.bind(sock, endpoint)
    }

    fn connect(&self, sock: RawSocket, endpoint: &str) -> RawResult<()> {
        self.intercept(Op::Connect)?;
        self.inner.connect(sock, endpoint)
    }

    fn poll(&self, sock: RawSocket, events: PollEvents, timeout_ms: i64) -> RawResult<PollEvents> {
        self.intercept(Op::Poll)?;
        self.inner.poll(sock, events, timeout_ms)
    }

    fn send(&self, sock: RawSocket, frames: Vec<Bytes>) -> RawResult<()> {
        self.intercept(Op::Send)?;
        self.inner.send(sock, frames)
    }

    fn recv(&self, sock: RawSocket) -> RawResult<Vec<Bytes>> {
        self.intercept(Op::Recv)?;
        self.inner.recv(sock)
    }
}
