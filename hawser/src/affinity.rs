//! Thread-affinity guard.
//!
//! Sockets and messages are confined to the thread that created them unless
//! explicitly promoted. The guard captures the creator's thread id and is
//! consulted at the top of every mutating or blocking operation; read-only
//! accessors skip it. Promotion is a one-way transition used when a handle
//! is deliberately going to be shared; it lifts the check, nothing more.
//! Mutual exclusion for a shared handle is the caller's job (wrap the value
//! in a `Mutex`); `&mut` receivers make unsynchronized aliasing impossible
//! either way.

use std::thread::{self, ThreadId};

use crate::error::{HawserError, Result};

/// Captured creator-thread identity plus the promotion flag.
#[derive(Debug)]
pub struct ThreadAffinity {
    owner: ThreadId,
    thread_safe: bool,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadAffinity {
    /// Capture the calling thread as the owner.
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
            thread_safe: false,
        }
    }

    /// Fail unless the calling thread may touch the resource.
    ///
    /// `resource` names the guarded type in the error ("Socket", "Message").
    pub fn check(&self, resource: &'static str) -> Result<()> {
        if !self.thread_safe {
            let current = thread::current().id();
            if current != self.owner {
                return Err(HawserError::ThreadAffinity {
                    resource,
                    owner: self.owner,
                    current,
                });
            }
        }
        Ok(())
    }

    /// Promote the resource for deliberate cross-thread sharing.
    ///
    /// One-way; calling this twice is a programming error and panics.
    pub fn mark_thread_safe(&mut self) {
        assert!(
            !self.thread_safe,
            "mark_thread_safe() called twice on the same resource"
        );
        self.thread_safe = true;
    }

    /// The thread that created the resource.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether the resource has been promoted.
    pub fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }
}
