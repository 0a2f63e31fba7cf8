#![forbid(unsafe_code)]

//! Integration tests: whole presentations driven through a recording host.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cardstack_core::{Insets, ItemRef};
use cardstack_harness::{Journal, RecordingHost, RecordingItem};
use cardstack_runtime::{ImmediateAnimator, PresentationConfig, Timeline};
use cardstack_widgets::CardPresenter;

struct Fixture {
    journal: Journal,
    host: Rc<RefCell<RecordingHost>>,
    timeline: Rc<Timeline>,
    presenter: CardPresenter,
}

fn fixture(root: impl FnOnce(&Journal) -> ItemRef) -> Fixture {
    let journal = Journal::new();
    let host = RecordingHost::shared(&journal);
    let timeline = Rc::new(Timeline::new());
    let presenter = CardPresenter::new(
        root(&journal),
        host.clone(),
        timeline.clone(),
        PresentationConfig::default(),
    );
    Fixture {
        journal,
        host,
        timeline,
        presenter,
    }
}

fn welcome(journal: &Journal) -> ItemRef {
    RecordingItem::new("welcome", journal).into_ref()
}

// ============================================================================
// Content refresh
// ============================================================================

#[test]
fn prepare_displays_root_without_animation() {
    let f = fixture(welcome);
    f.presenter.prepare();

    assert!(f.timeline.is_idle());
    assert!(f.journal.before("welcome.set_up", "welcome.will_display"));
    assert!(f.journal.before("welcome.will_display", "welcome.on_display"));
    assert!(f.presenter.is_dismissable());

    let host = f.host.borrow();
    assert!(host.close_visible);
    assert_eq!(host.visible(), f.presenter.displayed_nodes());
}

#[test]
fn push_runs_three_phase_swap() {
    let f = fixture(welcome);
    f.presenter.prepare();
    let root_nodes = f.presenter.displayed_nodes();

    f.presenter
        .push(RecordingItem::new("details", &f.journal).into_ref());
    assert!(f.journal.contains("details.set_up"));
    assert!(!f.journal.contains("details.will_display"));
    {
        let host = f.host.borrow();
        // New nodes are attached hidden; the old ones are still on the card.
        assert_eq!(host.attached().len(), 4);
        assert!(f.presenter.displayed_nodes().iter().all(|n| host.is_hidden(*n)));
        assert!(!host.close_visible);
    }

    // Phase boundaries sit at thirds of 750 ms; step just past each one.
    f.timeline.advance(Duration::from_millis(260));
    {
        let host = f.host.borrow();
        assert!(root_nodes.iter().all(|n| host.alpha(*n) == 0.0));
    }

    f.timeline.advance(Duration::from_millis(250));
    assert!(f.journal.contains("details.will_display"));
    assert!(f.journal.contains("welcome.will_dismiss"));
    assert!(!f.journal.contains("details.on_display"));

    f.timeline.advance(Duration::from_millis(250));
    assert!(f.journal.before("details.will_display", "details.on_display"));
    assert!(f.journal.contains("welcome.on_dismiss"));
    assert!(!f.presenter.is_transitioning());
    assert!(f.presenter.is_dismissable());

    let host = f.host.borrow();
    assert_eq!(host.attached(), f.presenter.displayed_nodes().as_slice());
    assert_eq!(host.visible(), f.presenter.displayed_nodes());
}

#[test]
fn displaced_items_are_torn_down_one_transition_later() {
    let f = fixture(welcome);
    f.presenter.prepare();
    let details = RecordingItem::new("details", &f.journal);
    let tear_downs = details.tear_down_counter();

    f.presenter.push(details.into_ref());
    f.timeline.run_to_idle();
    f.presenter.pop();
    f.timeline.run_to_idle();
    assert_eq!(tear_downs.get(), 0);

    f.presenter
        .push(RecordingItem::new("extra", &f.journal).into_ref());
    assert_eq!(tear_downs.get(), 1);
    assert!(f.journal.contains("details.detach"));
    f.timeline.run_to_idle();
    assert_eq!(tear_downs.get(), 1);
}

#[test]
fn display_next_follows_the_item_chain() {
    let f = fixture(|journal| {
        let last = RecordingItem::new("last", journal).into_ref();
        let middle = RecordingItem::new("middle", journal)
            .into_ref()
            .with_next(last);
        RecordingItem::new("first", journal)
            .into_ref()
            .with_next(middle)
    });
    f.presenter.prepare();

    f.presenter.display_next();
    f.timeline.run_to_idle();
    f.presenter.display_next();
    f.timeline.run_to_idle();

    assert_eq!(f.presenter.depth(), 2);
    assert!(f.journal.contains("last.on_display"));
    assert!(f.presenter.current_item().next().is_none());
}

#[test]
#[should_panic(expected = "has no next item")]
fn display_next_at_end_of_chain_traps() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter.display_next();
}

#[test]
fn transitions_requested_mid_chain_coalesce() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter
        .push(RecordingItem::new("second", &f.journal).into_ref());
    f.presenter
        .push(RecordingItem::new("third", &f.journal).into_ref());
    f.presenter.pop();

    f.timeline.run_to_idle();
    // Back at `second`, which the running chain already displayed.
    assert_eq!(f.journal.count("second.set_up"), 1);
    assert!(!f.journal.contains("third.set_up"));
    assert_eq!(f.presenter.displayed_item(), Some(f.presenter.current_item()));
}

#[test]
fn pop_at_root_changes_nothing() {
    let f = fixture(welcome);
    f.presenter.prepare();
    let before = f.journal.entries();
    assert!(f.presenter.pop().is_none());
    assert!(f.presenter.pop_to_root().is_none());
    assert_eq!(f.journal.entries(), before);
}

// ============================================================================
// Busy indicator
// ============================================================================

#[test]
fn busy_item_starts_behind_indicator() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter
        .push(RecordingItem::new("loading", &f.journal).busy(true).into_ref());
    f.timeline.run_to_idle();

    assert!(f.presenter.is_busy());
    assert!(!f.presenter.is_dismissable());
    {
        let host = f.host.borrow();
        assert_eq!(host.busy_alpha, 1.0);
        assert_eq!(host.content_alpha, 0.0);
        assert!(host.busy_animating);
    }

    f.presenter.hide_busy_indicator();
    f.timeline.run_to_idle();
    assert!(f.presenter.is_dismissable());
    let host = f.host.borrow();
    assert_eq!(host.busy_alpha, 0.0);
    assert_eq!(host.content_alpha, 1.0);
    assert!(!host.busy_animating);
}

#[test]
fn leaving_a_busy_item_hides_indicator() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter
        .push(RecordingItem::new("loading", &f.journal).busy(true).into_ref());
    f.timeline.run_to_idle();
    f.presenter
        .push(RecordingItem::new("done", &f.journal).into_ref());
    f.timeline.run_to_idle();

    assert!(!f.presenter.is_busy());
    assert!(f.presenter.is_dismissable());
    assert_eq!(f.host.borrow().busy_alpha, 0.0);
}

// ============================================================================
// Dismissal
// ============================================================================

#[test]
fn tap_outside_is_ignored_while_transitioning() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter
        .push(RecordingItem::new("details", &f.journal).into_ref());
    assert!(!f.presenter.dismiss_if_possible());
    f.timeline.run_to_idle();
    assert!(f.presenter.dismiss_if_possible());
    assert!(f.journal.contains("host.dismiss_card animated=true"));
    assert!(f.journal.contains("details.will_dismiss"));
}

#[test]
fn non_dismissable_item_hides_close_control() {
    let f = fixture(|journal| {
        RecordingItem::new("gate", journal)
            .dismissable(false)
            .into_ref()
    });
    f.presenter.prepare();
    assert!(!f.presenter.is_dismissable());
    assert!(!f.host.borrow().close_visible);
    assert!(!f.presenter.dismiss_if_possible());
}

#[test]
fn complete_dismissal_resets_for_reuse() {
    let f = fixture(welcome);
    f.presenter.prepare();
    let details = RecordingItem::new("details", &f.journal);
    let slot = details.navigator_slot();
    f.presenter.push(details.into_ref());
    f.timeline.run_to_idle();

    f.presenter.dismiss(true);
    f.presenter.complete_dismissal();
    assert!(f.journal.contains("details.on_dismiss"));
    assert!(slot.borrow().is_none());
    assert!(!f.presenter.is_prepared());
    assert!(f.host.borrow().attached().is_empty());
    assert_eq!(f.presenter.depth(), 0);

    f.presenter.prepare();
    assert_eq!(f.journal.count("welcome.on_display"), 2);
    assert_eq!(f.host.borrow().attached().len(), 2);
}

// ============================================================================
// Item requests, insets, teardown
// ============================================================================

#[test]
fn items_drive_navigation_through_requests() {
    let journal = Journal::new();
    let root = RecordingItem::new("welcome", &journal);
    let slot = root.navigator_slot();
    let presenter = CardPresenter::new(
        root.into_ref(),
        RecordingHost::shared(&journal),
        Rc::new(ImmediateAnimator::new()),
        PresentationConfig::default(),
    );
    presenter.prepare();

    let navigator = slot.borrow().clone().expect("root is attached");
    assert_eq!(navigator.presentation(), presenter.presentation());
    navigator.push(RecordingItem::new("next", &journal).into_ref());
    navigator.pop();
    navigator.dismiss(false);
    assert_eq!(presenter.process_requests(), 3);
    assert!(journal.contains("next.on_display"));
    assert!(journal.contains("host.dismiss_card animated=false"));
}

#[test]
fn inset_changes_respect_item_preference() {
    let f = fixture(|journal| {
        RecordingItem::new("form", journal)
            .responds_to_insets(false)
            .into_ref()
    });
    f.presenter.prepare();
    assert!(!f.presenter.viewport_insets_changed(Insets::bottom(300.0)));
    f.presenter
        .push(RecordingItem::new("keyboard", &f.journal).into_ref());
    assert!(f.presenter.viewport_insets_changed(Insets::bottom(300.0)));
    assert_eq!(f.journal.with_prefix("host.bottom_inset"), vec!["host.bottom_inset 300"]);
}

#[test]
fn dropping_presenter_releases_every_item() {
    let journal = Journal::new();
    let tail = RecordingItem::new("tail", &journal);
    let tail_slot = tail.tear_down_counter();
    let root = RecordingItem::new("root", &journal)
        .into_ref()
        .with_next(tail.into_ref());
    let pushed = RecordingItem::new("pushed", &journal);
    let pushed_slot = pushed.navigator_slot();
    let pushed = pushed.into_ref();

    let presenter = CardPresenter::new(
        root.clone(),
        RecordingHost::shared(&journal),
        Rc::new(ImmediateAnimator::new()),
        PresentationConfig::default(),
    );
    presenter.prepare();
    presenter.push(pushed.clone());
    drop(presenter);

    assert_eq!(journal.count("root.tear_down"), 1);
    assert_eq!(journal.count("pushed.tear_down"), 1);
    assert_eq!(tail_slot.get(), 1);
    assert!(pushed_slot.borrow().is_none());
    assert!(root.next().is_none());
    assert!(!pushed.is_attached());
}

#[test]
fn reduced_motion_swaps_instantly() {
    let journal = Journal::new();
    let timeline = Rc::new(Timeline::new());
    let presenter = CardPresenter::new(
        welcome(&journal),
        RecordingHost::shared(&journal),
        timeline.clone(),
        PresentationConfig::default().reduced_motion(true),
    );
    presenter.prepare();
    presenter.push(RecordingItem::new("details", &journal).into_ref());
    assert!(journal.contains("details.on_display"));
    assert!(timeline.is_idle());
}

#[test]
fn refresh_runs_under_a_subscriber() {
    let subscriber = tracing_subscriber::registry();
    tracing::subscriber::with_default(subscriber, || {
        let f = fixture(welcome);
        f.presenter.prepare();
        f.presenter
            .push(RecordingItem::new("details", &f.journal).into_ref());
        f.timeline.run_to_idle();
        assert!(f.journal.contains("details.on_display"));
    });
}

// ============================================================================
// Reuse and overlapping transitions
// ============================================================================

#[test]
fn reused_presenter_keeps_root_reachable() {
    let f = fixture(welcome);
    let root = f.presenter.current_item();
    f.presenter.prepare();
    f.presenter.push(RecordingItem::new("b", &f.journal).into_ref());
    f.timeline.run_to_idle();
    f.presenter.push(RecordingItem::new("c", &f.journal).into_ref());
    f.timeline.run_to_idle();
    // The root left `previous` when `c` was pushed.
    assert!(f.journal.contains("welcome.tear_down"));

    f.presenter.dismiss(true);
    f.presenter.complete_dismissal();
    f.presenter.prepare();

    assert!(root.is_attached());
    let navigator = root.navigator().expect("root owns a navigator");
    assert_eq!(navigator.presentation(), f.presenter.presentation());
    assert!(navigator.push(RecordingItem::new("d", &f.journal).into_ref()));
    assert_eq!(f.presenter.process_requests(), 1);
    assert_eq!(f.presenter.depth(), 1);
}

#[test]
fn reset_mid_transition_abandons_the_running_chain() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter.push(RecordingItem::new("b", &f.journal).into_ref());
    f.timeline.advance(Duration::from_millis(100));

    f.presenter.dismiss(true);
    f.presenter.complete_dismissal();
    assert!(f.host.borrow().attached().is_empty());

    f.presenter.prepare();
    f.presenter.push(RecordingItem::new("c", &f.journal).into_ref());
    f.timeline.advance(Duration::from_millis(700));
    // The abandoned chain has ended; the one for `c` has not.
    assert!(f.presenter.is_transitioning());

    let entries = f.journal.entries();
    let torn = f.journal.position("b.tear_down").expect("reset tears b down");
    assert!(
        entries[torn..]
            .iter()
            .all(|e| e != "b.will_display" && e != "b.on_display")
    );

    f.timeline.run_to_idle();
    assert!(!f.presenter.is_transitioning());
    assert!(f.journal.contains("c.on_display"));
    let host = f.host.borrow();
    assert_eq!(host.attached(), f.presenter.displayed_nodes().as_slice());
}

#[test]
fn outgoing_root_outlives_its_exit_animation() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter.push(RecordingItem::new("b", &f.journal).into_ref());
    f.presenter.push(RecordingItem::new("c", &f.journal).into_ref());
    assert!(!f.journal.contains("welcome.tear_down"));

    f.timeline.run_to_idle();
    assert!(f.journal.before("welcome.on_dismiss", "welcome.tear_down"));
    assert_eq!(f.journal.count("welcome.tear_down"), 1);
    assert_eq!(f.journal.count("b.tear_down"), 0);
    assert!(f.journal.contains("c.on_display"));
}

#[test]
fn item_shown_by_a_coalesced_refresh_is_torn_down_after_it_fades() {
    let f = fixture(welcome);
    f.presenter.prepare();
    f.presenter.push(RecordingItem::new("b", &f.journal).into_ref());
    f.presenter.push(RecordingItem::new("c", &f.journal).into_ref());
    f.presenter.pop_to_root();

    f.timeline.run_to_idle();
    assert!(f.journal.before("b.on_dismiss", "b.tear_down"));
    assert_eq!(f.journal.count("b.tear_down"), 1);
    assert_eq!(f.journal.count("welcome.tear_down"), 0);
    assert_eq!(f.journal.count("welcome.on_display"), 2);
    assert!(f.presenter.current_item().is_attached());
}
