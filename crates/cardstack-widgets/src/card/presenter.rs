#![forbid(unsafe_code)]

//! The presentation coordinator.
//!
//! A `CardPresenter` ties one [`NavigationStack`] to a host card: every
//! transition reported by the stack becomes a three-phase content refresh
//! run through an [`AnimationChain`], and a fresh [`DismissController`] is
//! wired for each displayed item.
//!
//! Items talk back through their [`Navigator`]; queued requests are applied
//! by [`CardPresenter::process_requests`].
//!
//! # Invariants
//!
//! 1. Only one content refresh runs at a time. Transitions requested while a
//!    refresh runs coalesce into a single refresh to the stack's current
//!    item once the running chain completes.
//! 2. The card is dismissable only between refreshes, and never while the
//!    busy indicator is shown.
//! 3. Any non-gesture dismissal aborts a mid-flight drag first, so at most
//!    one transition driver runs at a time.
//! 4. Items displaced while a refresh runs are torn down only after that
//!    refresh completes, and never while their content is still on the card.
//! 5. `reset()` starts a new generation: callbacks of chains started before
//!    it touch neither the items, the host nor the presenter state.
//!
//! # Failure Modes
//!
//! | Misuse | Result |
//! |--------|--------|
//! | navigation before `prepare()` | panic |
//! | `prepare()` twice | panic |
//! | any mutator off the UI thread | panic |
//! | queued request on an unprepared presenter | logged and discarded |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use bitflags::bitflags;
use cardstack_core::{
    Insets, ItemRef, NavRequest, Navigator, PanEvent, PanPhase, PresentationId, RequestQueue,
    Transform, UiThread,
};
use cardstack_runtime::{
    AnimationChain, AnimationPhase, AnimationRequest, Animator, Curve, PresentationConfig,
};
use tracing::{debug, debug_span, warn};

use super::dismiss::{DismissContext, DismissController, DismissEffect, DismissPhase, DismissTarget};
use super::navigation::{NavigationStack, Transition};
use super::surface::{CardHost, NodeId};

bitflags! {
    /// Presenter status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PresenterFlags: u8 {
        const PREPARED = 1 << 0;
        const DISMISSABLE = 1 << 1;
        const BUSY = 1 << 2;
        const TRANSITIONING = 1 << 3;
        const REFRESH_PENDING = 1 << 4;
        const DISMISSING = 1 << 5;
    }
}

/// Host shared between the presenter and its running animations.
pub type SharedHost = Rc<RefCell<dyn CardHost>>;

/// Relative duration of each content refresh phase.
const REFRESH_PHASE: f64 = 1.0 / 3.0;

/// Coordinates navigation, content refresh and dismissal of one card.
pub struct CardPresenter {
    inner: Rc<Inner>,
}

struct Inner {
    ui: UiThread,
    config: PresentationConfig,
    animator: Rc<dyn Animator>,
    host: SharedHost,
    requests: RequestQueue,
    generation: Cell<u64>,
    state: RefCell<State>,
}

struct State {
    flags: PresenterFlags,
    stack: NavigationStack,
    displayed: Option<ItemRef>,
    nodes: Vec<NodeId>,
    /// Nodes of the outgoing item while a refresh fades them out.
    outgoing: Vec<NodeId>,
    dismiss: Option<DismissController>,
}

impl CardPresenter {
    /// Create an unprepared presenter whose stack starts at `root`.
    ///
    /// The calling thread becomes the presenter's UI thread.
    pub fn new(
        root: ItemRef,
        host: SharedHost,
        animator: Rc<dyn Animator>,
        config: PresentationConfig,
    ) -> Self {
        let requests = RequestQueue::new(PresentationId::next());
        let stack = NavigationStack::new(root, requests.navigator());
        Self {
            inner: Rc::new(Inner {
                ui: UiThread::current(),
                config,
                animator,
                host,
                requests,
                generation: Cell::new(0),
                state: RefCell::new(State {
                    flags: PresenterFlags::empty(),
                    stack,
                    displayed: None,
                    nodes: Vec::new(),
                    outgoing: Vec::new(),
                    dismiss: None,
                }),
            }),
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn presentation(&self) -> PresentationId {
        self.inner.requests.presentation()
    }

    /// A back-reference handle for this presentation.
    #[must_use]
    pub fn navigator(&self) -> Navigator {
        self.inner.requests.navigator()
    }

    #[must_use]
    pub fn config(&self) -> &PresentationConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn flags(&self) -> PresenterFlags {
        self.inner.state.borrow().flags
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.flags().contains(PresenterFlags::PREPARED)
    }

    /// Whether tap and swipe dismissal are currently allowed.
    #[must_use]
    pub fn is_dismissable(&self) -> bool {
        self.flags().contains(PresenterFlags::DISMISSABLE)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.flags().contains(PresenterFlags::BUSY)
    }

    /// Whether a content refresh chain is running.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.flags().contains(PresenterFlags::TRANSITIONING)
    }

    #[must_use]
    pub fn current_item(&self) -> ItemRef {
        self.inner.state.borrow().stack.current().clone()
    }

    #[must_use]
    pub fn previous_item(&self) -> Option<ItemRef> {
        self.inner.state.borrow().stack.previous().cloned()
    }

    /// The item whose nodes are on the card.
    #[must_use]
    pub fn displayed_item(&self) -> Option<ItemRef> {
        self.inner.state.borrow().displayed.clone()
    }

    /// Nodes of the displayed item.
    #[must_use]
    pub fn displayed_nodes(&self) -> Vec<NodeId> {
        self.inner.state.borrow().nodes.clone()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.state.borrow().stack.depth()
    }

    /// Phase of the wired dismiss controller, if any.
    #[must_use]
    pub fn dismiss_phase(&self) -> Option<DismissPhase> {
        self.inner.state.borrow().dismiss.as_ref().map(DismissController::phase)
    }

    // --- Lifecycle ---

    /// Render the current item without animation.
    ///
    /// # Panics
    ///
    /// Panics if already prepared or if called off the UI thread.
    #[track_caller]
    pub fn prepare(&self) {
        self.inner.ui.assert_current("CardPresenter::prepare");
        let current = {
            let mut state = self.inner.state.borrow_mut();
            assert!(
                !state.flags.contains(PresenterFlags::PREPARED),
                "presentation is already prepared"
            );
            state.flags = PresenterFlags::PREPARED;
            state.stack.current().clone()
        };
        debug!(presentation = self.presentation().get(), "presentation prepared");
        Inner::refresh(&self.inner, current, None);
    }

    // --- Navigation ---

    /// Display `item` after the current one.
    ///
    /// # Panics
    ///
    /// Panics before [`prepare`](Self::prepare) and under the conditions of
    /// [`NavigationStack::push`].
    #[track_caller]
    pub fn push(&self, item: ItemRef) -> Transition {
        let transition = self.navigate("CardPresenter::push", |stack| stack.push(item));
        self.show(&transition);
        transition
    }

    /// Go back one item; at the root this is a no-op.
    ///
    /// # Panics
    ///
    /// Panics before [`prepare`](Self::prepare).
    #[track_caller]
    pub fn pop(&self) -> Option<Transition> {
        let transition = self.navigate("CardPresenter::pop", NavigationStack::pop);
        if let Some(transition) = &transition {
            self.show(transition);
        }
        transition
    }

    /// Go back to the root item.
    ///
    /// # Panics
    ///
    /// Panics before [`prepare`](Self::prepare).
    #[track_caller]
    pub fn pop_to_root(&self) -> Option<Transition> {
        let transition = self.navigate("CardPresenter::pop_to_root", NavigationStack::pop_to_root);
        if let Some(transition) = &transition {
            self.show(transition);
        }
        transition
    }

    /// Display the current item's `next` item.
    ///
    /// # Panics
    ///
    /// Panics before [`prepare`](Self::prepare) or if the current item has
    /// no `next` item.
    #[track_caller]
    pub fn display_next(&self) -> Transition {
        let transition = self.navigate("CardPresenter::display_next", NavigationStack::display_next);
        self.show(&transition);
        transition
    }

    /// Return to the unprepared state at the root, without animation.
    ///
    /// The current item receives `on_dismiss`; nodes are removed from the card
    /// and pending requests are dropped. A refresh still running is abandoned.
    ///
    /// # Panics
    ///
    /// Panics if called off the UI thread.
    #[track_caller]
    pub fn reset(&self) {
        self.inner.ui.assert_current("CardPresenter::reset");
        self.inner.generation.set(self.inner.generation.get() + 1);
        let nodes = {
            let mut state = self.inner.state.borrow_mut();
            state.stack.reset();
            state.flags = PresenterFlags::empty();
            state.displayed = None;
            state.dismiss = None;
            let mut nodes = std::mem::take(&mut state.outgoing);
            nodes.append(&mut state.nodes);
            nodes
        };
        {
            let mut host = self.inner.host.borrow_mut();
            host.detach_nodes(&nodes);
            host.set_card_transform(Transform::IDENTITY);
            host.set_close_control_visible(false);
        }
        self.inner.requests.clear();
        debug!(presentation = self.presentation().get(), "presentation reset");
    }

    /// Apply every request queued by items through their [`Navigator`].
    ///
    /// Returns the number of requests applied.
    pub fn process_requests(&self) -> usize {
        self.inner.ui.assert_current("CardPresenter::process_requests");
        let mut applied = 0;
        while let Some(request) = self.inner.requests.pop_front() {
            if !self.is_prepared() {
                warn!(
                    ?request,
                    discarded = self.inner.requests.len() + 1,
                    "navigation requests for an unprepared presentation discarded"
                );
                self.inner.requests.clear();
                break;
            }
            applied += 1;
            match request {
                NavRequest::Push(item) => {
                    self.push(item);
                }
                NavRequest::Pop => {
                    self.pop();
                }
                NavRequest::PopToRoot => {
                    self.pop_to_root();
                }
                NavRequest::DisplayNext => {
                    self.display_next();
                }
                NavRequest::Dismiss { animated } => self.dismiss(animated),
                NavRequest::ShowBusyIndicator => self.show_busy_indicator(),
                NavRequest::HideBusyIndicator => self.hide_busy_indicator(),
            }
        }
        applied
    }

    // --- Busy indicator ---

    /// Fade the content out and the busy indicator in.
    ///
    /// Dismissal is disabled until [`hide_busy_indicator`](Self::hide_busy_indicator).
    #[track_caller]
    pub fn show_busy_indicator(&self) {
        self.inner.ui.assert_current("CardPresenter::show_busy_indicator");
        self.assert_prepared("CardPresenter::show_busy_indicator");
        Inner::show_busy(&self.inner);
    }

    /// Fade the busy indicator out and the content back in.
    #[track_caller]
    pub fn hide_busy_indicator(&self) {
        self.inner.ui.assert_current("CardPresenter::hide_busy_indicator");
        self.assert_prepared("CardPresenter::hide_busy_indicator");
        Inner::hide_busy(&self.inner);
    }

    // --- Dismissal ---

    /// Dismiss the card.
    ///
    /// Aborts a mid-flight drag, calls `will_dismiss` on the current item and
    /// asks the host to remove the card. The host reports completion through
    /// [`complete_dismissal`](Self::complete_dismissal).
    #[track_caller]
    pub fn dismiss(&self, animated: bool) {
        self.inner.ui.assert_current("CardPresenter::dismiss");
        self.assert_prepared("CardPresenter::dismiss");
        Inner::cancel_drag(&self.inner);
        let current = {
            let mut state = self.inner.state.borrow_mut();
            state.flags.insert(PresenterFlags::DISMISSING);
            state.flags.remove(PresenterFlags::DISMISSABLE);
            state.stack.current().clone()
        };
        current.will_dismiss();
        self.inner.host.borrow_mut().dismiss_card(animated);
        debug!(item = %current.id(), animated, "card dismissal requested");
    }

    /// Dismiss the card if it is currently dismissable.
    ///
    /// Used for taps outside the card, the close control and escape.
    pub fn dismiss_if_possible(&self) -> bool {
        if !self.is_prepared() || !self.is_dismissable() {
            return false;
        }
        self.dismiss(true);
        true
    }

    /// The host finished removing the card.
    #[track_caller]
    pub fn complete_dismissal(&self) {
        self.reset();
    }

    /// Feed one drag event to the wired dismiss controller.
    pub fn handle_pan(&self, event: &PanEvent) -> DismissEffect {
        self.inner.ui.assert_current("CardPresenter::handle_pan");
        let controller = {
            let mut state = self.inner.state.borrow_mut();
            if !state.flags.contains(PresenterFlags::PREPARED) {
                return DismissEffect::Noop;
            }
            state.dismiss.take()
        };
        let Some(mut controller) = controller else {
            return DismissEffect::Noop;
        };
        if event.phase == PanPhase::Began {
            controller.wire(self.inner.dismiss_context());
        }
        let effect = controller.handle_pan(event, &mut PresenterTarget(&self.inner));
        self.inner.restore_controller(controller);
        effect
    }

    /// Forward a viewport inset change (e.g. a keyboard) to the host.
    ///
    /// Returns `false` if the current item does not respond to inset changes.
    pub fn viewport_insets_changed(&self, insets: Insets) -> bool {
        self.inner.ui.assert_current("CardPresenter::viewport_insets_changed");
        if !self.is_prepared() || !self.current_item().responds_to_viewport_inset_changes() {
            return false;
        }
        self.inner.host.borrow_mut().set_bottom_inset(insets.bottom);
        true
    }

    // --- Internals ---

    #[track_caller]
    fn assert_prepared(&self, operation: &str) {
        assert!(
            self.is_prepared(),
            "`{operation}` called before the presentation was prepared"
        );
    }

    #[track_caller]
    fn navigate<T>(&self, operation: &str, step: impl FnOnce(&mut NavigationStack) -> T) -> T {
        self.inner.ui.assert_current(operation);
        self.assert_prepared(operation);
        let mut state = self.inner.state.borrow_mut();
        step(&mut state.stack)
    }

    fn show(&self, transition: &Transition) {
        Inner::refresh(
            &self.inner,
            transition.current.clone(),
            Some(transition.previous.clone()),
        );
    }
}

impl Inner {
    /// The presenter behind `weak`, unless it is gone or was reset since
    /// `generation`.
    fn live(weak: &Weak<Inner>, generation: u64) -> Option<Rc<Inner>> {
        weak.upgrade().filter(|inner| inner.generation.get() == generation)
    }

    fn flag(&self, flag: PresenterFlags) -> bool {
        self.state.borrow().flags.contains(flag)
    }

    fn dismiss_context(&self) -> DismissContext {
        let host = self.host.borrow();
        DismissContext::new(host.content_height(), host.size_class())
    }

    fn restore_controller(&self, controller: DismissController) {
        let mut state = self.state.borrow_mut();
        if state.dismiss.is_none() && state.flags.contains(PresenterFlags::PREPARED) {
            state.dismiss = Some(controller);
        }
    }

    fn animate(&self, duration: Duration, body: impl FnOnce() + 'static) {
        self.animator.animate(
            AnimationRequest::new(duration, Curve::EaseInOut),
            Box::new(body),
            Box::new(|| {}),
        );
    }

    fn cancel_drag(this: &Rc<Inner>) {
        let controller = this.state.borrow_mut().dismiss.take();
        if let Some(mut controller) = controller {
            controller.cancel_if_needed(&mut PresenterTarget(this));
            this.restore_controller(controller);
        }
    }

    fn show_busy(this: &Rc<Inner>) {
        {
            let mut state = this.state.borrow_mut();
            state.flags.insert(PresenterFlags::BUSY);
            state.flags.remove(PresenterFlags::DISMISSABLE);
        }
        this.host.borrow_mut().set_busy_indicator_animating(true);
        let host = Rc::clone(&this.host);
        this.animate(this.config.effective_busy_indicator_fade(), move || {
            let mut host = host.borrow_mut();
            host.set_content_alpha(0.0);
            host.set_busy_indicator_alpha(1.0);
        });
        debug!("busy indicator shown");
    }

    fn hide_busy(this: &Rc<Inner>) {
        {
            let mut state = this.state.borrow_mut();
            state.flags.remove(PresenterFlags::BUSY);
            let settled = state.flags.contains(PresenterFlags::PREPARED)
                && !state
                    .flags
                    .intersects(PresenterFlags::TRANSITIONING | PresenterFlags::DISMISSING);
            if settled && state.displayed.as_ref().is_some_and(ItemRef::is_dismissable) {
                state.flags.insert(PresenterFlags::DISMISSABLE);
            }
        }
        this.host.borrow_mut().set_busy_indicator_animating(false);
        let host = Rc::clone(&this.host);
        this.animate(this.config.effective_busy_indicator_fade(), move || {
            let mut host = host.borrow_mut();
            host.set_busy_indicator_alpha(0.0);
            host.set_content_alpha(1.0);
        });
        debug!("busy indicator hidden");
    }

    /// Swap the card content to `current` through the three-phase chain.
    fn refresh(this: &Rc<Inner>, current: ItemRef, previous: Option<ItemRef>) {
        let span = debug_span!("card_refresh", item = %current.id());
        let _guard = span.enter();

        let (old_nodes, initial) = {
            let mut state = this.state.borrow_mut();
            if state.flags.contains(PresenterFlags::TRANSITIONING) {
                state.flags.insert(PresenterFlags::REFRESH_PENDING);
                debug!("refresh deferred until the running transition completes");
                return;
            }
            state.flags.remove(PresenterFlags::DISMISSABLE);
            state.flags.insert(PresenterFlags::TRANSITIONING);
            state.stack.hold_teardowns();
            let old_nodes = std::mem::take(&mut state.nodes);
            state.outgoing.clone_from(&old_nodes);
            (old_nodes, state.displayed.is_none())
        };
        let generation = this.generation.get();

        this.host.borrow_mut().set_close_control_visible(false);
        Inner::cancel_drag(this);
        if this.config.allows_swipe_interaction {
            let mut controller = DismissController::new();
            controller.wire(this.dismiss_context());
            this.state.borrow_mut().dismiss = Some(controller);
        }

        let show_busy = current.starts_with_busy_indicator();
        let needs_close = current.is_dismissable() && current.requires_close_control();
        let new_nodes = this.host.borrow_mut().make_nodes(&current);
        current.set_up();
        {
            let mut host = this.host.borrow_mut();
            for &node in &new_nodes {
                host.set_node_hidden(node, !initial);
            }
            host.attach_nodes(&new_nodes);
        }
        {
            let mut state = this.state.borrow_mut();
            state.nodes = new_nodes.clone();
            state.displayed = Some(current.clone());
        }

        let duration = if initial {
            Duration::ZERO
        } else {
            this.config.effective_transition_duration()
        };
        debug!(
            initial,
            duration_ms = duration.as_millis() as u64,
            old_nodes = old_nodes.len(),
            new_nodes = new_nodes.len(),
            "content refresh started"
        );

        let weak = Rc::downgrade(this);
        let old_nodes = Rc::new(old_nodes);
        let new_nodes = Rc::new(new_nodes);
        let chain = AnimationChain::new(duration, Rc::clone(&this.animator));

        // 1) Fade everything out.
        let fade_out = {
            let host = Rc::clone(&this.host);
            let old_nodes = Rc::clone(&old_nodes);
            let new_nodes = Rc::clone(&new_nodes);
            let body_weak = weak.clone();
            let weak = weak.clone();
            AnimationPhase::new(REFRESH_PHASE, Curve::Linear)
                .body(move || {
                    if Inner::live(&body_weak, generation).is_none() {
                        return;
                    }
                    let mut host = host.borrow_mut();
                    for &node in old_nodes.iter().chain(new_nodes.iter()) {
                        host.set_node_alpha(node, 0.0);
                    }
                })
                .on_complete(move || {
                    if let Some(inner) = Inner::live(&weak, generation) {
                        if !show_busy && inner.flag(PresenterFlags::BUSY) {
                            Inner::hide_busy(&inner);
                        }
                    }
                })
        };

        // 2) Swap which nodes are laid out.
        let swap = {
            let host = Rc::clone(&this.host);
            let old_nodes = Rc::clone(&old_nodes);
            let new_nodes = Rc::clone(&new_nodes);
            let current = current.clone();
            let previous = previous.clone();
            let body_weak = weak.clone();
            let weak = weak.clone();
            AnimationPhase::new(REFRESH_PHASE, Curve::Linear)
                .body(move || {
                    if Inner::live(&body_weak, generation).is_none() {
                        return;
                    }
                    let mut host = host.borrow_mut();
                    for &node in old_nodes.iter() {
                        host.set_node_hidden(node, true);
                    }
                    for &node in new_nodes.iter() {
                        host.set_node_hidden(node, false);
                    }
                })
                .on_complete(move || {
                    if Inner::live(&weak, generation).is_none() {
                        return;
                    }
                    current.will_display();
                    if let Some(previous) = &previous {
                        previous.will_dismiss();
                    }
                })
        };

        // 3) Reveal the new content.
        let reveal = {
            let host = Rc::clone(&this.host);
            let body_host = Rc::clone(&this.host);
            let new_nodes = Rc::clone(&new_nodes);
            let body_weak = weak.clone();
            let weak = weak.clone();
            AnimationPhase::new(REFRESH_PHASE, Curve::Linear)
                .body(move || {
                    let Some(inner) = Inner::live(&body_weak, generation) else {
                        return;
                    };
                    {
                        let mut host = body_host.borrow_mut();
                        host.set_content_alpha(if show_busy { 0.0 } else { 1.0 });
                        host.set_close_control_visible(needs_close);
                        for &node in new_nodes.iter() {
                            host.set_node_alpha(node, 1.0);
                        }
                    }
                    if show_busy {
                        Inner::show_busy(&inner);
                    }
                })
                .on_complete(move || {
                    let Some(inner) = Inner::live(&weak, generation) else {
                        return;
                    };
                    {
                        let mut state = inner.state.borrow_mut();
                        let settled = state.flags.contains(PresenterFlags::PREPARED)
                            && !state
                                .flags
                                .intersects(PresenterFlags::BUSY | PresenterFlags::DISMISSING);
                        if settled && current.is_dismissable() {
                            state.flags.insert(PresenterFlags::DISMISSABLE);
                        }
                        state.outgoing.clear();
                    }
                    current.on_display();
                    if let Some(previous) = &previous {
                        previous.on_dismiss();
                    }
                    host.borrow_mut().detach_nodes(&old_nodes);
                })
        };

        chain.add(fade_out);
        chain.add(swap);
        chain.add(reveal);
        chain.set_completion(move || {
            if let Some(inner) = Inner::live(&weak, generation) {
                Inner::finish_refresh(&inner);
            }
        });
        chain.start();
    }

    fn finish_refresh(this: &Rc<Inner>) {
        let pending = {
            let mut state = this.state.borrow_mut();
            state.flags.remove(PresenterFlags::TRANSITIONING);
            let requested = state.flags.contains(PresenterFlags::REFRESH_PENDING);
            state.flags.remove(PresenterFlags::REFRESH_PENDING);
            let current = state.stack.current().clone();
            let stale = state.displayed.as_ref().is_some_and(|shown| !shown.ptr_eq(&current));
            let pending = (requested && stale && state.flags.contains(PresenterFlags::PREPARED))
                .then(|| (current, state.displayed.clone()));
            // The displayed item stays parked while the next refresh fades it out.
            let still_shown = pending.as_ref().and_then(|(_, shown)| shown.clone());
            state.stack.release_teardowns(still_shown.as_ref());
            pending
        };
        debug!(coalesced = pending.is_some(), "content refresh finished");
        if let Some((current, previous)) = pending {
            Inner::refresh(this, current, previous);
        }
    }
}

/// Adapter exposing the presenter to its dismiss controller.
struct PresenterTarget<'a>(&'a Rc<Inner>);

impl DismissTarget for PresenterTarget<'_> {
    fn is_dismissable(&self) -> bool {
        self.0.flag(PresenterFlags::DISMISSABLE)
    }

    fn set_card_transform(&mut self, transform: Transform) {
        self.0.host.borrow_mut().set_card_transform(transform);
    }

    fn restore_card(&mut self) {
        let host = Rc::clone(&self.0.host);
        self.0
            .animate(self.0.config.effective_restore_duration(), move || {
                host.borrow_mut().set_card_transform(Transform::IDENTITY);
            });
    }

    fn begin_interactive_dismissal(&mut self) {
        self.0.host.borrow_mut().start();
    }

    fn update_dismissal(&mut self, percent: f64) {
        self.0.host.borrow_mut().update(percent);
    }

    fn finish_dismissal(&mut self) {
        self.0.host.borrow_mut().finish();
        let current = {
            let mut state = self.0.state.borrow_mut();
            state.flags.insert(PresenterFlags::DISMISSING);
            state.flags.remove(PresenterFlags::DISMISSABLE);
            state.stack.current().clone()
        };
        current.will_dismiss();
    }

    fn cancel_dismissal(&mut self) {
        self.0.host.borrow_mut().cancel();
    }
}

impl fmt::Debug for CardPresenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("CardPresenter")
            .field("presentation", &self.inner.requests.presentation())
            .field("flags", &state.flags)
            .field("stack", &state.stack)
            .field("nodes", &state.nodes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::surface::{CardSurface, TransitionDriver};
    use cardstack_core::{Item, SizeClass, TouchTarget};
    use cardstack_runtime::{ImmediateAnimator, Timeline};

    #[derive(Default)]
    struct Host {
        next_node: u64,
        attached: Vec<NodeId>,
        log: Vec<String>,
        close_visible: bool,
        bottom_inset: f64,
    }

    impl CardSurface for Host {
        fn make_nodes(&mut self, _item: &ItemRef) -> Vec<NodeId> {
            self.next_node += 2;
            vec![NodeId(self.next_node - 1), NodeId(self.next_node)]
        }
        fn attach_nodes(&mut self, nodes: &[NodeId]) {
            self.attached.extend_from_slice(nodes);
        }
        fn detach_nodes(&mut self, nodes: &[NodeId]) {
            self.attached.retain(|n| !nodes.contains(n));
        }
        fn set_node_alpha(&mut self, _node: NodeId, _alpha: f64) {}
        fn set_node_hidden(&mut self, _node: NodeId, _hidden: bool) {}
        fn set_content_alpha(&mut self, alpha: f64) {
            self.log.push(format!("content_alpha {alpha}"));
        }
        fn set_busy_indicator_alpha(&mut self, alpha: f64) {
            self.log.push(format!("busy_alpha {alpha}"));
        }
        fn set_busy_indicator_animating(&mut self, _animating: bool) {}
        fn set_close_control_visible(&mut self, visible: bool) {
            self.close_visible = visible;
        }
        fn set_card_transform(&mut self, _transform: Transform) {}
        fn set_bottom_inset(&mut self, inset: f64) {
            self.bottom_inset = inset;
        }
        fn content_height(&self) -> f64 {
            600.0
        }
        fn size_class(&self) -> SizeClass {
            SizeClass::Compact
        }
        fn dismiss_card(&mut self, animated: bool) {
            self.log.push(format!("dismiss_card {animated}"));
        }
    }

    impl TransitionDriver for Host {
        fn start(&mut self) {
            self.log.push("driver start".into());
        }
        fn update(&mut self, _percent: f64) {}
        fn finish(&mut self) {
            self.log.push("driver finish".into());
        }
        fn cancel(&mut self) {
            self.log.push("driver cancel".into());
        }
    }

    #[derive(Default)]
    struct Page {
        dismissable: bool,
        busy: bool,
        displayed: Rc<Cell<u32>>,
        navigator: Rc<RefCell<Option<Navigator>>>,
    }

    impl Item for Page {
        fn is_dismissable(&self) -> bool {
            self.dismissable
        }
        fn starts_with_busy_indicator(&self) -> bool {
            self.busy
        }
        fn attach_navigator(&mut self, navigator: Option<Navigator>) {
            *self.navigator.borrow_mut() = navigator;
        }
        fn on_display(&mut self) {
            self.displayed.set(self.displayed.get() + 1);
        }
    }

    fn page() -> ItemRef {
        ItemRef::new(Page {
            dismissable: true,
            ..Page::default()
        })
    }

    fn presenter(animator: Rc<dyn Animator>) -> (CardPresenter, Rc<RefCell<Host>>) {
        let host = Rc::new(RefCell::new(Host::default()));
        let presenter = CardPresenter::new(
            page(),
            host.clone(),
            animator,
            PresentationConfig::default(),
        );
        (presenter, host)
    }

    #[test]
    fn prepare_renders_root_instantly() {
        let timeline = Rc::new(Timeline::new());
        let (presenter, host) = presenter(timeline.clone());
        presenter.prepare();
        assert!(presenter.is_prepared());
        assert!(!presenter.is_transitioning());
        assert!(presenter.is_dismissable());
        assert!(host.borrow().close_visible);
        assert_eq!(host.borrow().attached, presenter.displayed_nodes());
        assert!(timeline.is_idle());
    }

    #[test]
    #[should_panic(expected = "before the presentation was prepared")]
    fn navigation_before_prepare_traps() {
        let (presenter, _host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.push(page());
    }

    #[test]
    #[should_panic(expected = "already prepared")]
    fn prepare_twice_traps() {
        let (presenter, _host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.prepare();
        presenter.prepare();
    }

    #[test]
    fn push_swaps_nodes_after_chain() {
        let timeline = Rc::new(Timeline::new());
        let (presenter, host) = presenter(timeline.clone());
        presenter.prepare();
        let root_nodes = presenter.displayed_nodes();

        presenter.push(page());
        assert!(presenter.is_transitioning());
        assert!(!presenter.is_dismissable());
        assert_eq!(host.borrow().attached.len(), 4);

        timeline.advance(Duration::from_millis(760));
        assert!(!presenter.is_transitioning());
        assert!(presenter.is_dismissable());
        let attached = host.borrow().attached.clone();
        assert_eq!(attached, presenter.displayed_nodes());
        assert!(root_nodes.iter().all(|n| !attached.contains(n)));
    }

    #[test]
    fn overlapping_transitions_coalesce() {
        let timeline = Rc::new(Timeline::new());
        let (presenter, _host) = presenter(timeline.clone());
        presenter.prepare();
        let b = page();
        let c = page();
        presenter.push(b);
        presenter.push(c.clone());
        assert_eq!(presenter.current_item(), c);

        timeline.advance(Duration::from_millis(760));
        // The deferred refresh to `c` is now running.
        assert!(presenter.is_transitioning());
        assert_eq!(presenter.displayed_item(), Some(c.clone()));
        timeline.advance(Duration::from_millis(760));
        assert!(!presenter.is_transitioning());
        assert!(timeline.is_idle());
    }

    #[test]
    fn reset_abandons_running_refresh() {
        let timeline = Rc::new(Timeline::new());
        let (presenter, host) = presenter(timeline.clone());
        presenter.prepare();
        let shown = Rc::new(Cell::new(0));
        presenter.push(ItemRef::new(Page {
            dismissable: true,
            displayed: Rc::clone(&shown),
            ..Page::default()
        }));
        timeline.advance(Duration::from_millis(100));

        presenter.reset();
        assert!(host.borrow().attached.is_empty());
        presenter.prepare();
        timeline.run_to_idle();

        assert_eq!(shown.get(), 0);
        assert!(presenter.is_dismissable());
        assert_eq!(presenter.displayed_item(), Some(presenter.current_item()));
        assert_eq!(host.borrow().attached, presenter.displayed_nodes());
    }

    #[test]
    fn busy_indicator_blocks_dismissal() {
        let (presenter, host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.prepare();
        presenter.show_busy_indicator();
        assert!(presenter.is_busy());
        assert!(!presenter.dismiss_if_possible());
        assert_eq!(
            presenter.handle_pan(&PanEvent::began(TouchTarget::Content)),
            DismissEffect::ElasticBegan
        );
        presenter.handle_pan(&PanEvent::ended(0.0, 0.0));

        presenter.hide_busy_indicator();
        assert!(presenter.is_dismissable());
        assert!(host.borrow().log.contains(&"busy_alpha 0".to_string()));
        assert!(presenter.dismiss_if_possible());
        assert!(host.borrow().log.contains(&"dismiss_card true".to_string()));
    }

    #[test]
    fn items_navigate_through_their_navigator() {
        let navigator = Rc::new(RefCell::new(None));
        let root = ItemRef::new(Page {
            dismissable: true,
            navigator: Rc::clone(&navigator),
            ..Page::default()
        });
        let host = Rc::new(RefCell::new(Host::default()));
        let presenter = CardPresenter::new(
            root,
            host,
            Rc::new(ImmediateAnimator::new()),
            PresentationConfig::default(),
        );
        presenter.prepare();

        let handle = navigator.borrow().clone().unwrap();
        let second = page();
        assert!(handle.push(second.clone()));
        assert!(handle.show_busy_indicator());
        assert_eq!(presenter.process_requests(), 2);
        assert_eq!(presenter.current_item(), second);
        assert!(presenter.is_busy());
    }

    #[test]
    fn interactive_commit_calls_will_dismiss() {
        let (presenter, host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.prepare();
        presenter.handle_pan(&PanEvent::began(TouchTarget::Content));
        presenter.handle_pan(&PanEvent::changed(0.0, 200.0));
        let effect = presenter.handle_pan(&PanEvent::ended(0.0, 200.0));
        assert_eq!(effect, DismissEffect::Finished);
        assert!(presenter.flags().contains(PresenterFlags::DISMISSING));
        let log = host.borrow().log.clone();
        assert!(log.contains(&"driver start".to_string()));
        assert!(log.contains(&"driver finish".to_string()));

        presenter.complete_dismissal();
        assert!(!presenter.is_prepared());
        assert!(host.borrow().attached.is_empty());
    }

    #[test]
    fn explicit_dismissal_aborts_drag() {
        let (presenter, host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.prepare();
        presenter.handle_pan(&PanEvent::began(TouchTarget::Content));
        presenter.handle_pan(&PanEvent::changed(0.0, 50.0));
        presenter.dismiss(false);
        let log = host.borrow().log.clone();
        assert!(log.contains(&"driver cancel".to_string()));
        assert_eq!(log.last().map(String::as_str), Some("dismiss_card false"));
        assert_eq!(presenter.dismiss_phase(), Some(DismissPhase::Suppressed));
    }

    #[test]
    fn insets_follow_item_preference() {
        let (presenter, host) = presenter(Rc::new(ImmediateAnimator::new()));
        assert!(!presenter.viewport_insets_changed(Insets::bottom(200.0)));
        presenter.prepare();
        assert!(presenter.viewport_insets_changed(Insets::bottom(200.0)));
        assert_eq!(host.borrow().bottom_inset, 200.0);
    }

    #[test]
    fn requests_on_unprepared_presenter_are_discarded() {
        let (presenter, _host) = presenter(Rc::new(ImmediateAnimator::new()));
        presenter.navigator().pop();
        presenter.navigator().pop_to_root();
        assert_eq!(presenter.process_requests(), 0);
        assert_eq!(presenter.depth(), 0);
    }

    #[test]
    fn reduced_motion_refreshes_instantly() {
        let timeline = Rc::new(Timeline::new());
        let host = Rc::new(RefCell::new(Host::default()));
        let presenter = CardPresenter::new(
            page(),
            host,
            timeline.clone(),
            PresentationConfig::default().reduced_motion(true),
        );
        presenter.prepare();
        presenter.push(page());
        assert!(!presenter.is_transitioning());
        assert!(timeline.is_idle());
    }
}
