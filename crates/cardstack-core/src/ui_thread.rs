#![forbid(unsafe_code)]

//! UI-coordination thread affinity.
//!
//! Presentations are single-threaded: every mutating entry point must run on
//! the thread that created the presentation. Most presentation types hold
//! `Rc` handles and are therefore `!Send` already; [`UiThread`] adds the
//! runtime check for the entry points where a host could still smuggle a call
//! across threads through its own synchronization.

use std::thread::{self, ThreadId};

/// The thread a presentation was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiThread {
    id: ThreadId,
}

impl UiThread {
    /// Capture the calling thread as the UI thread.
    #[must_use]
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    /// Whether the calling thread is the captured UI thread.
    #[inline]
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Trap if called off the UI thread.
    ///
    /// # Panics
    ///
    /// Panics when the calling thread is not the captured UI thread.
    #[track_caller]
    pub fn assert_current(&self, operation: &str) {
        assert!(
            self.is_current(),
            "`{operation}` must only be called on the UI thread that owns the presentation"
        );
    }
}
