#![forbid(unsafe_code)]

//! Back-reference from an item to the presentation that displays it.
//!
//! A [`Navigator`] is what the navigation stack hands to an item when the
//! item becomes owned by a presentation. It does not borrow the presentation:
//! requests are queued in the presentation's [`RequestQueue`] and applied when
//! the presentation drains it. This keeps item callbacks from re-entering a
//! presentation that is in the middle of a transition.
//!
//! # Failure Modes
//!
//! - Sending through a navigator whose presentation was dropped returns
//!   `false`; the request is discarded.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::item::ItemRef;

/// Global counter for unique presentation IDs.
static PRESENTATION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of one presentation (one coordinator instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationId(u64);

impl PresentationId {
    /// Allocate a fresh presentation ID.
    #[must_use]
    pub fn next() -> Self {
        Self(PRESENTATION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A navigation request queued by an item.
#[derive(Debug, Clone)]
pub enum NavRequest {
    Push(ItemRef),
    Pop,
    PopToRoot,
    DisplayNext,
    Dismiss { animated: bool },
    ShowBusyIndicator,
    HideBusyIndicator,
}

/// FIFO of pending [`NavRequest`]s owned by a presentation.
pub struct RequestQueue {
    id: PresentationId,
    pending: Rc<RefCell<VecDeque<NavRequest>>>,
}

impl RequestQueue {
    /// Create an empty queue for the given presentation.
    #[must_use]
    pub fn new(id: PresentationId) -> Self {
        Self {
            id,
            pending: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// The presentation this queue belongs to.
    #[must_use]
    pub fn presentation(&self) -> PresentationId {
        self.id
    }

    /// A navigator that feeds this queue.
    #[must_use]
    pub fn navigator(&self) -> Navigator {
        Navigator {
            id: self.id,
            pending: Rc::downgrade(&self.pending),
        }
    }

    /// Take the oldest pending request.
    pub fn pop_front(&self) -> Option<NavRequest> {
        self.pending.borrow_mut().pop_front()
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether no request is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Drop every pending request.
    pub fn clear(&self) {
        self.pending.borrow_mut().clear();
    }
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestQueue")
            .field("id", &self.id)
            .field("pending", &self.len())
            .finish()
    }
}

/// Cloneable handle an item uses to ask its presentation to navigate.
#[derive(Clone)]
pub struct Navigator {
    id: PresentationId,
    pending: Weak<RefCell<VecDeque<NavRequest>>>,
}

impl Navigator {
    /// The presentation this navigator talks to.
    #[must_use]
    pub fn presentation(&self) -> PresentationId {
        self.id
    }

    /// Whether the presentation is still alive.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.pending.strong_count() > 0
    }

    /// Queue a request. Returns `false` if the presentation is gone.
    pub fn send(&self, request: NavRequest) -> bool {
        match self.pending.upgrade() {
            Some(pending) => {
                pending.borrow_mut().push_back(request);
                true
            }
            None => false,
        }
    }

    pub fn push(&self, item: ItemRef) -> bool {
        self.send(NavRequest::Push(item))
    }

    pub fn pop(&self) -> bool {
        self.send(NavRequest::Pop)
    }

    pub fn pop_to_root(&self) -> bool {
        self.send(NavRequest::PopToRoot)
    }

    pub fn display_next(&self) -> bool {
        self.send(NavRequest::DisplayNext)
    }

    pub fn dismiss(&self, animated: bool) -> bool {
        self.send(NavRequest::Dismiss { animated })
    }

    pub fn show_busy_indicator(&self) -> bool {
        self.send(NavRequest::ShowBusyIndicator)
    }

    pub fn hide_busy_indicator(&self) -> bool {
        self.send(NavRequest::HideBusyIndicator)
    }
}

impl PartialEq for Navigator {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
