#![forbid(unsafe_code)]

//! The item contract: one navigable page displayed on the card.
//!
//! Items are created by the host application and handed to a presentation
//! as [`ItemRef`]s. The presentation never owns item *behavior*; it only
//! drives the lifecycle hooks of the [`Item`] trait and tracks the owner
//! back-reference.
//!
//! # Ownership
//!
//! - Items never own each other. The only item-to-item link is the forward
//!   `next` chain, a singly-linked list of shared handles.
//! - The owner back-reference ([`Navigator`]) is set by the navigation stack
//!   when an item enters it and cleared by [`ItemRef::tear_down`]. An item
//!   attached to one presentation cannot be pushed onto another.
//!
//! # Invariants
//!
//! 1. [`ItemRef::tear_down`] runs the `tear_down` hook at most once per
//!    attachment; a second call returns `false` without re-running it.
//! 2. [`ItemRef::attach`] re-arms teardown, so a cleared item can be reused.
//! 3. [`ItemRef::chain`] terminates on cyclic `next` links and yields each
//!    item once.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;

use crate::navigator::Navigator;

/// Global counter for unique item IDs.
static ITEM_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an item handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        Self(ITEM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Capability interface of a page displayed on the card.
///
/// Every method has a default, so a concrete page implements only what it
/// needs. Hooks are called on the UI thread, in this order over an item's
/// life on screen:
///
/// `attach_navigator(Some)` → `set_up` → `will_display` → `on_display` →
/// `will_dismiss` → `on_dismiss` → `tear_down` → `attach_navigator(None)`
pub trait Item {
    /// Whether the card may be dismissed (tap outside, swipe, close control)
    /// while this item is displayed.
    fn is_dismissable(&self) -> bool {
        true
    }

    /// Whether the close control is shown for this item (only honored when
    /// the item is also dismissable).
    fn requires_close_control(&self) -> bool {
        true
    }

    /// Whether the busy indicator replaces the content when this item is
    /// first displayed.
    fn starts_with_busy_indicator(&self) -> bool {
        false
    }

    /// Whether viewport inset changes (on-screen keyboard) move the card
    /// while this item is displayed.
    fn responds_to_viewport_inset_changes(&self) -> bool {
        true
    }

    /// Receive or lose the back-reference to the owning presentation.
    ///
    /// Store the navigator to push, pop or dismiss from the item's own UI
    /// callbacks.
    fn attach_navigator(&mut self, _navigator: Option<Navigator>) {}

    /// The item's visual content was created; allocate resources.
    fn set_up(&mut self) {}

    /// The item left the presentation; release resources.
    fn tear_down(&mut self) {}

    /// The item's content is about to be revealed.
    fn will_display(&mut self) {}

    /// The item's content is fully revealed.
    fn on_display(&mut self) {}

    /// The item's content is about to be hidden or the card is about to be
    /// dismissed.
    fn will_dismiss(&mut self) {}

    /// The item's content is gone from the card.
    fn on_dismiss(&mut self) {}
}

struct ItemCell {
    id: ItemId,
    item: RefCell<Box<dyn Item>>,
    next: RefCell<Option<ItemRef>>,
    navigator: RefCell<Option<Navigator>>,
    torn_down: Cell<bool>,
}

/// Shared handle to a host-created [`Item`].
///
/// Cloning the handle shares the same item; identity comparisons use
/// [`ItemRef::ptr_eq`] (or `==`).
#[derive(Clone)]
pub struct ItemRef {
    cell: Rc<ItemCell>,
}

impl ItemRef {
    /// Wrap a host item.
    pub fn new(item: impl Item + 'static) -> Self {
        Self::from_box(Box::new(item))
    }

    /// Wrap an already boxed host item.
    pub fn from_box(item: Box<dyn Item>) -> Self {
        Self {
            cell: Rc::new(ItemCell {
                id: ItemId::next(),
                item: RefCell::new(item),
                next: RefCell::new(None),
                navigator: RefCell::new(None),
                torn_down: Cell::new(false),
            }),
        }
    }

    /// Builder: set the item displayed after this one.
    #[must_use]
    pub fn with_next(self, next: ItemRef) -> Self {
        self.set_next(Some(next));
        self
    }

    /// Unique identifier of this handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.cell.id
    }

    /// Whether both handles point at the same item.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &ItemRef) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    // --- Properties ---

    #[must_use]
    pub fn is_dismissable(&self) -> bool {
        self.cell.item.borrow().is_dismissable()
    }

    #[must_use]
    pub fn requires_close_control(&self) -> bool {
        self.cell.item.borrow().requires_close_control()
    }

    #[must_use]
    pub fn starts_with_busy_indicator(&self) -> bool {
        self.cell.item.borrow().starts_with_busy_indicator()
    }

    #[must_use]
    pub fn responds_to_viewport_inset_changes(&self) -> bool {
        self.cell.item.borrow().responds_to_viewport_inset_changes()
    }

    /// The item displayed after this one, if any.
    #[must_use]
    pub fn next(&self) -> Option<ItemRef> {
        self.cell.next.borrow().clone()
    }

    /// Replace the forward link.
    pub fn set_next(&self, next: Option<ItemRef>) {
        *self.cell.next.borrow_mut() = next;
    }

    // --- Owner back-reference ---

    /// The navigator of the owning presentation, if attached.
    #[must_use]
    pub fn navigator(&self) -> Option<Navigator> {
        self.cell.navigator.borrow().clone()
    }

    /// Whether a presentation currently owns this item.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.cell.navigator.borrow().is_some()
    }

    /// Whether the item was torn down since it was last attached.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.cell.torn_down.get()
    }

    /// Set the owner back-reference and re-arm teardown.
    ///
    /// Called by the navigation stack when the item enters it.
    pub fn attach(&self, navigator: Navigator) {
        *self.cell.navigator.borrow_mut() = Some(navigator.clone());
        self.cell.torn_down.set(false);
        self.cell.item.borrow_mut().attach_navigator(Some(navigator));
    }

    /// Run the `tear_down` hook and clear the back-reference.
    ///
    /// Returns `false` (and does nothing) if the item was already torn down.
    pub fn tear_down(&self) -> bool {
        if self.cell.torn_down.replace(true) {
            return false;
        }
        let mut item = self.cell.item.borrow_mut();
        item.tear_down();
        self.cell.navigator.borrow_mut().take();
        item.attach_navigator(None);
        true
    }

    // --- Lifecycle passthroughs ---

    pub fn set_up(&self) {
        self.cell.item.borrow_mut().set_up();
    }

    pub fn will_display(&self) {
        self.cell.item.borrow_mut().will_display();
    }

    pub fn on_display(&self) {
        self.cell.item.borrow_mut().on_display();
    }

    pub fn will_dismiss(&self) {
        self.cell.item.borrow_mut().will_dismiss();
    }

    pub fn on_dismiss(&self) {
        self.cell.item.borrow_mut().on_dismiss();
    }

    // --- Chain traversal ---

    /// This item followed by every item reachable through `next` links.
    ///
    /// Each item appears once; traversal stops at the first repeated item,
    /// so cyclic chains terminate.
    #[must_use]
    pub fn chain(&self) -> Vec<ItemRef> {
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        let mut cursor = Some(self.clone());
        while let Some(item) = cursor {
            if !seen.insert(item.id()) {
                break;
            }
            cursor = item.next();
            out.push(item);
        }
        out
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ItemRef {}

impl fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemRef")
            .field("id", &self.cell.id)
            .field("attached", &self.is_attached())
            .field("torn_down", &self.cell.torn_down.get())
            .finish()
    }
}
