#![forbid(unsafe_code)]

//! Recording test doubles for cardstack presentations.
//!
//! Every double writes to a shared [`Journal`], so a test can assert the
//! exact interleaving of item hooks and host calls:
//!
//! ```ignore
//! let journal = Journal::new();
//! let host = RecordingHost::shared(&journal);
//! let root = RecordingItem::new("welcome", &journal).into_ref();
//! let presenter = CardPresenter::new(root, host.clone(), Rc::new(Timeline::new()), PresentationConfig::default());
//! presenter.prepare();
//! assert!(journal.contains("welcome.on_display"));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use cardstack_core::{Item, ItemRef, Navigator, SizeClass, Transform};
use cardstack_widgets::{CardSurface, NodeId, TransitionDriver};

pub mod strategy;

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Ordered, shared record of everything the doubles observed.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::trace!(%entry, "journal");
        self.entries.borrow_mut().push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.borrow().iter().any(|e| e == entry)
    }

    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == entry).count()
    }

    /// Index of the first occurrence of `entry`.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == entry)
    }

    /// Whether `first` was recorded before `second` (first occurrences).
    #[must_use]
    pub fn before(&self, first: &str, second: &str) -> bool {
        matches!(
            (self.position(first), self.position(second)),
            (Some(a), Some(b)) if a < b
        )
    }

    /// Entries starting with `prefix`, in order.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// RecordingItem
// ---------------------------------------------------------------------------

/// An [`Item`] that journals every hook as `"<name>.<hook>"`.
pub struct RecordingItem {
    name: String,
    journal: Journal,
    dismissable: bool,
    close_control: bool,
    busy: bool,
    responds_to_insets: bool,
    navigator: Rc<RefCell<Option<Navigator>>>,
    tear_downs: Rc<Cell<u32>>,
}

impl RecordingItem {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            dismissable: true,
            close_control: true,
            busy: false,
            responds_to_insets: true,
            navigator: Rc::default(),
            tear_downs: Rc::default(),
        }
    }

    #[must_use]
    pub fn dismissable(mut self, dismissable: bool) -> Self {
        self.dismissable = dismissable;
        self
    }

    #[must_use]
    pub fn close_control(mut self, required: bool) -> Self {
        self.close_control = required;
        self
    }

    #[must_use]
    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    #[must_use]
    pub fn responds_to_insets(mut self, responds: bool) -> Self {
        self.responds_to_insets = responds;
        self
    }

    /// Slot that mirrors the navigator handed to the item.
    #[must_use]
    pub fn navigator_slot(&self) -> Rc<RefCell<Option<Navigator>>> {
        Rc::clone(&self.navigator)
    }

    /// Counter of `tear_down` calls.
    #[must_use]
    pub fn tear_down_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.tear_downs)
    }

    #[must_use]
    pub fn into_ref(self) -> ItemRef {
        ItemRef::new(self)
    }

    fn note(&self, hook: &str) {
        self.journal.record(format!("{}.{hook}", self.name));
    }
}

impl Item for RecordingItem {
    fn is_dismissable(&self) -> bool {
        self.dismissable
    }

    fn requires_close_control(&self) -> bool {
        self.close_control
    }

    fn starts_with_busy_indicator(&self) -> bool {
        self.busy
    }

    fn responds_to_viewport_inset_changes(&self) -> bool {
        self.responds_to_insets
    }

    fn attach_navigator(&mut self, navigator: Option<Navigator>) {
        self.note(if navigator.is_some() { "attach" } else { "detach" });
        *self.navigator.borrow_mut() = navigator;
    }

    fn set_up(&mut self) {
        self.note("set_up");
    }

    fn tear_down(&mut self) {
        self.tear_downs.set(self.tear_downs.get() + 1);
        self.note("tear_down");
    }

    fn will_display(&mut self) {
        self.note("will_display");
    }

    fn on_display(&mut self) {
        self.note("on_display");
    }

    fn will_dismiss(&mut self) {
        self.note("will_dismiss");
    }

    fn on_dismiss(&mut self) {
        self.note("on_dismiss");
    }
}

// ---------------------------------------------------------------------------
// RecordingHost
// ---------------------------------------------------------------------------

/// A headless card host that tracks visual state and journals host calls.
///
/// Host entries are prefixed with `host.`; driver entries with `driver.`.
#[derive(Debug)]
pub struct RecordingHost {
    journal: Journal,
    next_node: u64,
    nodes_per_item: usize,
    attached: Vec<NodeId>,
    alpha: BTreeMap<NodeId, f64>,
    hidden: BTreeSet<NodeId>,
    pub content_alpha: f64,
    pub busy_alpha: f64,
    pub busy_animating: bool,
    pub close_visible: bool,
    pub transform: Transform,
    pub bottom_inset: f64,
    pub content_height: f64,
    pub size_class: SizeClass,
    pub progress: Vec<f64>,
}

impl RecordingHost {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            next_node: 0,
            nodes_per_item: 2,
            attached: Vec::new(),
            alpha: BTreeMap::new(),
            hidden: BTreeSet::new(),
            content_alpha: 1.0,
            busy_alpha: 0.0,
            busy_animating: false,
            close_visible: false,
            transform: Transform::IDENTITY,
            bottom_inset: 0.0,
            content_height: 600.0,
            size_class: SizeClass::Compact,
            progress: Vec::new(),
        }
    }

    /// A host ready to hand to `CardPresenter::new`.
    pub fn shared(journal: &Journal) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(journal)))
    }

    #[must_use]
    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = height;
        self
    }

    #[must_use]
    pub fn with_size_class(mut self, size_class: SizeClass) -> Self {
        self.size_class = size_class;
        self
    }

    #[must_use]
    pub fn attached(&self) -> &[NodeId] {
        &self.attached
    }

    /// Attached nodes that are neither hidden nor transparent.
    #[must_use]
    pub fn visible(&self) -> Vec<NodeId> {
        self.attached
            .iter()
            .copied()
            .filter(|n| !self.hidden.contains(n) && self.alpha(*n) > 0.0)
            .collect()
    }

    #[must_use]
    pub fn alpha(&self, node: NodeId) -> f64 {
        self.alpha.get(&node).copied().unwrap_or(1.0)
    }

    #[must_use]
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.hidden.contains(&node)
    }
}

impl CardSurface for RecordingHost {
    fn make_nodes(&mut self, _item: &ItemRef) -> Vec<NodeId> {
        (0..self.nodes_per_item)
            .map(|_| {
                self.next_node += 1;
                NodeId(self.next_node)
            })
            .collect()
    }

    fn attach_nodes(&mut self, nodes: &[NodeId]) {
        self.journal.record(format!("host.attach {}", nodes.len()));
        self.attached.extend_from_slice(nodes);
    }

    fn detach_nodes(&mut self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        self.journal.record(format!("host.detach {}", nodes.len()));
        self.attached.retain(|n| !nodes.contains(n));
        for node in nodes {
            self.alpha.remove(node);
            self.hidden.remove(node);
        }
    }

    fn set_node_alpha(&mut self, node: NodeId, alpha: f64) {
        self.alpha.insert(node, alpha);
    }

    fn set_node_hidden(&mut self, node: NodeId, hidden: bool) {
        if hidden {
            self.hidden.insert(node);
        } else {
            self.hidden.remove(&node);
        }
    }

    fn set_content_alpha(&mut self, alpha: f64) {
        self.content_alpha = alpha;
    }

    fn set_busy_indicator_alpha(&mut self, alpha: f64) {
        self.busy_alpha = alpha;
    }

    fn set_busy_indicator_animating(&mut self, animating: bool) {
        self.busy_animating = animating;
    }

    fn set_close_control_visible(&mut self, visible: bool) {
        self.close_visible = visible;
    }

    fn set_card_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn set_bottom_inset(&mut self, inset: f64) {
        self.journal.record(format!("host.bottom_inset {inset}"));
        self.bottom_inset = inset;
    }

    fn content_height(&self) -> f64 {
        self.content_height
    }

    fn size_class(&self) -> SizeClass {
        self.size_class
    }

    fn dismiss_card(&mut self, animated: bool) {
        self.journal.record(format!("host.dismiss_card animated={animated}"));
    }
}

impl TransitionDriver for RecordingHost {
    fn start(&mut self) {
        self.progress.clear();
        self.journal.record("driver.start");
    }

    fn update(&mut self, percent: f64) {
        self.progress.push(percent);
    }

    fn finish(&mut self) {
        self.journal.record("driver.finish");
    }

    fn cancel(&mut self) {
        self.journal.record("driver.cancel");
    }
}
