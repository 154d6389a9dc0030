//! Transport I/O context lifecycle.
//!
//! A `Context` owns exactly one transport context handle. Termination
//! retries while the transport reports an interrupted-by-signal condition
//! and is idempotent: calling it again after success is a no-op, and drop
//! terminates only if the caller never did.

use std::sync::Arc;

use hawser_core::loopback::LoopbackTransport;
use hawser_core::raw::{RawContext, RawTransport};
use tracing::debug;

use crate::error::{HawserError, Result};

/// Owns one transport I/O context. May be shared by any number of sockets;
/// it must outlive every socket created from it (operations on sockets of a
/// terminated context fail with the transport's terminated-context code).
pub struct Context {
    transport: Arc<dyn RawTransport>,
    handle: RawContext,
    terminated: bool,
}

impl Context {
    /// Create a context on the process-wide loopback transport.
    pub fn new() -> Result<Self> {
        Self::with_transport(LoopbackTransport::global())
    }

    /// Create a context on an explicit transport.
    pub fn with_transport(transport: Arc<dyn RawTransport>) -> Result<Self> {
        let handle = transport
            .ctx_new()
            .map_err(|source| HawserError::ContextConstruction { source })?;
        Ok(Self {
            transport,
            handle,
            terminated: false,
        })
    }

    /// Terminate the context.
    ///
    /// Retries while the transport reports an interrupt; any other outcome
    /// means termination has run its course and the context moves to final
    /// release. Calling this again after it returns is a no-op.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        while let Err(e) = self.transport.ctx_term(self.handle) {
            if !e.is_interrupted() {
                break;
            }
        }
        self.terminated = true;
        debug!("context {} terminated", self.handle.0);
    }

    pub(crate) fn transport(&self) -> Arc<dyn RawTransport> {
        self.transport.clone()
    }

    pub(crate) fn raw(&self) -> RawContext {
        self.handle
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.terminate();
    }
}
