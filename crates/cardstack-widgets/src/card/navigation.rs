#![forbid(unsafe_code)]

//! Navigation state machine for the items of one presentation.
//!
//! `NavigationStack` tracks the root item, the pushed items, the current
//! item and a transient `previous` slot. Every mutator that changes the
//! current item returns the resulting [`Transition`] and forwards it to the
//! optional delegate.
//!
//! # Invariants
//!
//! 1. `current` is the last pushed item, or `root` when nothing is pushed.
//! 2. The root item is never removed.
//! 3. Deferred teardown: assigning `previous` tears down the item it held
//!    *before* the assignment, never the one being assigned. An item that is
//!    current again (re-pushed or popped back to) is not torn down.
//! 4. While teardown is held (an exit animation is running), stale items
//!    are parked instead of torn down and released together afterwards.
//! 5. Dropping the stack tears down every pending item exactly once (root,
//!    pushed items, the pending `previous`, parked items, and their `next`
//!    chains) and clears the `next` links it visited.
//! 6. After `reset()` the root is current and attached.
//!
//! # Failure Modes
//!
//! | Call | Result |
//! |------|--------|
//! | `pop()` with nothing pushed | same as `pop_to_root()` |
//! | `pop_to_root()` at root | `None`, no notify, no teardown |
//! | `display_next()` without `next` | panic |
//! | pushing an item already in the stack | panic |
//! | pushing an item owned by another presentation | panic |
//! | any mutator off the UI thread | panic |

use std::fmt;

use ahash::AHashSet;
use cardstack_core::{ItemRef, Navigator, UiThread};
use tracing::debug;

/// Result of a navigation step: the new current item and the one it displaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub current: ItemRef,
    pub previous: ItemRef,
}

/// Callback invoked synchronously after every transition.
pub type TransitionDelegate = Box<dyn FnMut(&Transition)>;

/// Navigation state of one presentation.
pub struct NavigationStack {
    ui: UiThread,
    navigator: Navigator,
    root: ItemRef,
    pushed: Vec<ItemRef>,
    current: ItemRef,
    previous: Option<ItemRef>,
    held: bool,
    parked: Vec<ItemRef>,
    delegate: Option<TransitionDelegate>,
}

impl NavigationStack {
    /// Create a stack displaying `root`.
    ///
    /// The root receives `navigator` as its back-reference. The calling
    /// thread becomes the stack's UI thread.
    pub fn new(root: ItemRef, navigator: Navigator) -> Self {
        root.attach(navigator.clone());
        Self {
            ui: UiThread::current(),
            navigator,
            current: root.clone(),
            root,
            pushed: Vec::new(),
            previous: None,
            held: false,
            parked: Vec::new(),
            delegate: None,
        }
    }

    /// Register the callback notified after every transition.
    pub fn set_delegate(&mut self, delegate: impl FnMut(&Transition) + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    /// Remove the transition callback.
    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    // --- Accessors ---

    #[inline]
    #[must_use]
    pub fn root(&self) -> &ItemRef {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &ItemRef {
        &self.current
    }

    /// The item displaced by the latest transition, until the next one.
    #[inline]
    #[must_use]
    pub fn previous(&self) -> Option<&ItemRef> {
        self.previous.as_ref()
    }

    /// Pushed items in push order (the root is not included).
    #[inline]
    #[must_use]
    pub fn pushed(&self) -> &[ItemRef] {
        &self.pushed
    }

    /// Number of pushed items.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.pushed.len()
    }

    #[inline]
    #[must_use]
    pub fn is_at_root(&self) -> bool {
        self.current.ptr_eq(&self.root)
    }

    /// Stale items waiting for [`release_teardowns`](Self::release_teardowns).
    #[must_use]
    pub fn parked(&self) -> &[ItemRef] {
        &self.parked
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Whether `item` is the root or one of the pushed items.
    #[must_use]
    pub fn contains(&self, item: &ItemRef) -> bool {
        item.ptr_eq(&self.root) || self.pushed.iter().any(|p| p.ptr_eq(item))
    }

    // --- Mutators ---

    /// Display `item` after the current one.
    ///
    /// # Panics
    ///
    /// Panics if `item` is already in the stack, if it is still owned by
    /// another presentation, or if called off the UI thread.
    #[track_caller]
    pub fn push(&mut self, item: ItemRef) -> Transition {
        self.ui.assert_current("NavigationStack::push");
        assert!(
            !self.contains(&item),
            "{} is already in the navigation stack",
            item.id()
        );
        if let Some(owner) = item.navigator() {
            assert!(
                owner.presentation() == self.navigator.presentation(),
                "{} is still owned by another presentation",
                item.id()
            );
        }

        let displaced = self.current.clone();
        self.pushed.push(item.clone());
        self.current = item;
        self.assign_previous(Some(displaced));
        self.notify("push")
    }

    /// Remove the last pushed item and display the one before it.
    ///
    /// With nothing pushed this is [`pop_to_root`](Self::pop_to_root).
    ///
    /// # Panics
    ///
    /// Panics if called off the UI thread.
    #[track_caller]
    pub fn pop(&mut self) -> Option<Transition> {
        self.ui.assert_current("NavigationStack::pop");
        let Some(popped) = self.pushed.pop() else {
            return self.pop_to_root();
        };
        self.current = self.pushed.last().unwrap_or(&self.root).clone();
        self.assign_previous(Some(popped));
        Some(self.notify("pop"))
    }

    /// Drop every pushed item and display the root.
    ///
    /// Returns `None` (no notify, no teardown) when already at the root.
    ///
    /// # Panics
    ///
    /// Panics if called off the UI thread.
    #[track_caller]
    pub fn pop_to_root(&mut self) -> Option<Transition> {
        self.ui.assert_current("NavigationStack::pop_to_root");
        if self.is_at_root() {
            return None;
        }
        let displaced = std::mem::replace(&mut self.current, self.root.clone());
        self.pushed.clear();
        self.assign_previous(Some(displaced));
        Some(self.notify("pop_to_root"))
    }

    /// Push the current item's `next` item.
    ///
    /// # Panics
    ///
    /// Panics if the current item has no `next` item, or under the
    /// conditions of [`push`](Self::push).
    #[track_caller]
    pub fn display_next(&mut self) -> Transition {
        self.ui.assert_current("NavigationStack::display_next");
        let Some(next) = self.current.next() else {
            panic!(
                "display_next called but the current item ({}) has no next item",
                self.current.id()
            );
        };
        self.push(next)
    }

    // --- Teardown hold ---

    /// Park stale items instead of tearing them down, until
    /// [`release_teardowns`](Self::release_teardowns).
    ///
    /// Used while an exit animation still shows the outgoing item.
    pub fn hold_teardowns(&mut self) {
        self.held = true;
    }

    /// Stop holding and tear down the parked items that are no longer in use.
    ///
    /// Items that became current or `previous` again are dropped from the
    /// parking list untouched. `still_shown` stays parked: its content is
    /// about to be animated out by the next transition.
    pub fn release_teardowns(&mut self, still_shown: Option<&ItemRef>) {
        self.held = false;
        let parked = std::mem::take(&mut self.parked);
        let mut released = 0usize;
        for item in parked {
            if still_shown.is_some_and(|shown| shown.ptr_eq(&item)) {
                self.parked.push(item);
            } else if !self.is_live(&item) && item.tear_down() {
                released += 1;
            }
        }
        if released > 0 || !self.parked.is_empty() {
            debug!(released, kept = self.parked.len(), "parked items released");
        }
    }

    /// Return to the root without transition or notification.
    ///
    /// Calls `on_dismiss` on the current item, then tears down every
    /// displaced item except the root so that they can be reused. The root
    /// is re-attached if it was torn down earlier.
    ///
    /// # Panics
    ///
    /// Panics if called off the UI thread.
    #[track_caller]
    pub fn reset(&mut self) {
        self.ui.assert_current("NavigationStack::reset");
        self.current.on_dismiss();
        self.current = self.root.clone();
        self.held = false;
        let displaced: Vec<ItemRef> = self
            .pushed
            .drain(..)
            .chain(self.previous.take())
            .chain(self.parked.drain(..))
            .collect();
        for item in displaced {
            if !item.ptr_eq(&self.root) {
                item.tear_down();
            }
        }
        if !self.root.is_attached() {
            self.root.attach(self.navigator.clone());
        }
        debug!(root = %self.root.id(), "navigation stack reset");
    }

    // --- Internals ---

    fn assign_previous(&mut self, previous: Option<ItemRef>) {
        let stale = std::mem::replace(&mut self.previous, previous);
        if let Some(stale) = stale {
            let reassigned = self.previous.as_ref().is_some_and(|p| p.ptr_eq(&stale));
            if reassigned || stale.ptr_eq(&self.current) {
                return;
            }
            if self.held {
                if !self.parked.iter().any(|p| p.ptr_eq(&stale)) {
                    self.parked.push(stale);
                }
            } else {
                stale.tear_down();
            }
        }
    }

    fn is_live(&self, item: &ItemRef) -> bool {
        item.ptr_eq(&self.current) || self.previous.as_ref().is_some_and(|p| p.ptr_eq(item))
    }

    fn notify(&mut self, operation: &'static str) -> Transition {
        if !self.current.is_attached() {
            self.current.attach(self.navigator.clone());
        }
        let transition = Transition {
            current: self.current.clone(),
            previous: self
                .previous
                .clone()
                .unwrap_or_else(|| self.current.clone()),
        };
        debug!(
            operation,
            current = %transition.current.id(),
            previous = %transition.previous.id(),
            depth = self.pushed.len(),
            "navigation transition"
        );
        if let Some(delegate) = self.delegate.as_mut() {
            delegate(&transition);
        }
        transition
    }
}

impl Drop for NavigationStack {
    fn drop(&mut self) {
        let mut seen = AHashSet::new();
        let mut pending = Vec::new();
        let starts = std::iter::once(self.root.clone())
            .chain(self.pushed.iter().cloned())
            .chain(self.previous.clone())
            .chain(self.parked.iter().cloned());
        for start in starts {
            for item in start.chain() {
                if seen.insert(item.id()) {
                    pending.push(item);
                }
            }
        }
        let swept = pending.len();
        for item in pending {
            if !item.is_torn_down() {
                item.tear_down();
            }
            item.set_next(None);
        }
        debug!(swept, "navigation stack dropped");
    }
}

impl fmt::Debug for NavigationStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationStack")
            .field("root", &self.root.id())
            .field("current", &self.current.id())
            .field("previous", &self.previous.as_ref().map(ItemRef::id))
            .field("depth", &self.pushed.len())
            .field("parked", &self.parked.len())
            .field("has_delegate", &self.delegate.is_some())
            .finish()
    }
}
