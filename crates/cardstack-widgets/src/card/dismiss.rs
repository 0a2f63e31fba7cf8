#![forbid(unsafe_code)]

//! Interactive swipe-to-dismiss.
//!
//! `DismissController` turns the host's drag events into a percent-driven,
//! cancellable dismissal. It owns no views: every visible effect goes
//! through the [`DismissTarget`] it is handed on each event.
//!
//! ```text
//! Idle -> Tracking -> {Finished | Cancelled} -> Idle
//!   \---> Elastic (not dismissable / regular layout) ---> Idle
//!   \---> Ignored (began on a control) -----------------> Idle
//! ```
//!
//! # Invariants
//!
//! 1. Progress is reported only while `Tracking`, and never twice in a row
//!    with the same value.
//! 2. Reported progress is within `[0, 1]`.
//! 3. A drag released at a cumulative vertical translation of at least
//!    `dismiss_threshold` finishes; anything shorter cancels and restores
//!    the card.
//! 4. A drag that began on a control produces no effect at all.
//! 5. After [`DismissController::cancel_if_needed`] aborts a drag, events are
//!    dropped until the next `Began`.
//!
//! # Failure Modes
//!
//! - Events without a preceding `Began` are ignored.
//! - A zero or negative content height yields a zero track percentage, so
//!   the drag can still commit but reports no intermediate progress.

use cardstack_core::{PanEvent, PanPhase, Point, SizeClass, Transform};
use tracing::{debug, trace};

/// Share of the raw drag applied before the elastic threshold.
const TRACKING_FACTOR: f64 = 2.0 / 3.0;

/// Share of the (resisted) drag applied to the card's cosmetic transform.
const VISUAL_FACTOR: f64 = 1.0 / 3.0;

/// Sub-linear damping applied to drag distance: `30·atan(x/120) + x/10`.
#[inline]
#[must_use]
pub fn resisted(x: f64) -> f64 {
    30.0 * (x / 120.0).atan() + x / 10.0
}

/// Drag distance after friction; grows slower past `elastic_threshold`.
#[must_use]
pub fn adaptive(distance: f64, elastic_threshold: f64) -> f64 {
    if distance <= elastic_threshold {
        distance * TRACKING_FACTOR
    } else {
        resisted(distance - elastic_threshold) + elastic_threshold * TRACKING_FACTOR
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Distances derived from the height of the card content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DismissMetrics {
    pub content_height: f64,
    pub distance_factor: f64,
    pub dismiss_threshold: f64,
    pub elastic_threshold: f64,
    pub track_percentage: f64,
}

impl DismissMetrics {
    /// Height at and above which the larger distance factor applies.
    pub const TALL_CONTENT: f64 = 500.0;

    #[must_use]
    pub fn new(content_height: f64) -> Self {
        let distance_factor = if content_height >= Self::TALL_CONTENT {
            0.75
        } else {
            2.0 / 3.0
        };
        let dismiss_threshold = 256.0 * distance_factor;
        let track_percentage = if content_height > 0.0 {
            dismiss_threshold / content_height
        } else {
            0.0
        };
        Self {
            content_height,
            distance_factor,
            dismiss_threshold,
            elastic_threshold: 128.0 * distance_factor,
            track_percentage,
        }
    }

    /// Transition progress for a downward drag of `distance`, clamped to `[0, 1]`.
    #[must_use]
    pub fn percentage(&self, distance: f64) -> f64 {
        let raw = adaptive(distance, self.elastic_threshold) / self.dismiss_threshold
            * self.track_percentage;
        raw.clamp(0.0, 1.0)
    }
}

/// What the controller needs to know about the presentation it is wired to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DismissContext {
    pub metrics: DismissMetrics,
    pub size_class: SizeClass,
}

impl DismissContext {
    #[must_use]
    pub fn new(content_height: f64, size_class: SizeClass) -> Self {
        Self {
            metrics: DismissMetrics::new(content_height),
            size_class,
        }
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// The presentation side of an interactive dismissal.
pub trait DismissTarget {
    /// Whether the card may currently be dismissed.
    fn is_dismissable(&self) -> bool;

    /// Move the card for cosmetic rubber-band feedback.
    fn set_card_transform(&mut self, transform: Transform);

    /// Animate the card back to the identity transform.
    fn restore_card(&mut self);

    /// Start the percent-driven dismissal transition.
    fn begin_interactive_dismissal(&mut self);

    /// Report transition progress in `[0, 1]`.
    fn update_dismissal(&mut self, percent: f64);

    /// Commit the dismissal.
    fn finish_dismissal(&mut self);

    /// Abandon the dismissal; the card stays.
    fn cancel_dismissal(&mut self);
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Lifecycle state of the current drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DismissPhase {
    #[default]
    Idle,
    /// A real dismissal is in progress.
    Tracking,
    /// Cosmetic feedback only; the drag can never dismiss.
    Elastic,
    /// The drag began on a control and is ignored until it ends.
    Ignored,
    /// The drag was aborted; remaining events are dropped.
    Suppressed,
}

/// How the latest interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissOutcome {
    Finished,
    Cancelled,
}

/// Effect of one event, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DismissEffect {
    /// Nothing happened.
    Noop,
    /// Tracking started; the host dismissal transition was begun.
    Began,
    /// The drag can only rubber-band.
    ElasticBegan,
    /// The card was moved cosmetically.
    Moved(Transform),
    /// Progress was reported.
    Progress(f64),
    /// Progress was unchanged and not reported.
    Unchanged,
    Finished,
    Cancelled,
    /// The card was restored without a tracked session.
    Restored,
}

/// Converts drag input into dismissal progress.
#[derive(Debug, Clone, Default)]
pub struct DismissController {
    context: Option<DismissContext>,
    phase: DismissPhase,
    moved: bool,
    finished: bool,
    last_percentage: Option<f64>,
    outcome: Option<DismissOutcome>,
}

impl DismissController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the controller to a presentation's metrics.
    ///
    /// Rewiring resets any state from a previous drag.
    pub fn wire(&mut self, context: DismissContext) {
        *self = Self {
            context: Some(context),
            ..Self::default()
        };
    }

    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.context.is_some()
    }

    #[must_use]
    pub fn context(&self) -> Option<&DismissContext> {
        self.context.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> DismissPhase {
        self.phase
    }

    /// Whether a real dismissal is being tracked.
    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.phase == DismissPhase::Tracking
    }

    /// Whether the latest session committed.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Last progress value reported to the target.
    #[must_use]
    pub fn current_percentage(&self) -> Option<f64> {
        self.last_percentage
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<DismissOutcome> {
        self.outcome
    }

    /// Feed one drag event.
    pub fn handle_pan(&mut self, event: &PanEvent, target: &mut dyn DismissTarget) -> DismissEffect {
        let Some(context) = self.context else {
            return DismissEffect::Noop;
        };
        match event.phase {
            PanPhase::Began => self.began(event, context, target),
            PanPhase::Changed => self.changed(event.translation, context, target),
            PanPhase::Ended => self.ended(event.translation, context, target),
            PanPhase::Cancelled | PanPhase::Failed => self.aborted(target),
        }
    }

    /// Abort a drag that is mid-flight.
    ///
    /// Used when a non-gesture dismissal takes precedence. Returns `true` if a
    /// drag was aborted.
    pub fn cancel_if_needed(&mut self, target: &mut dyn DismissTarget) -> bool {
        if !self.moved || !matches!(self.phase, DismissPhase::Tracking | DismissPhase::Elastic) {
            return false;
        }
        let was_tracking = self.is_tracking();
        self.phase = DismissPhase::Suppressed;
        self.moved = false;
        target.restore_card();
        if was_tracking {
            target.cancel_dismissal();
            self.outcome = Some(DismissOutcome::Cancelled);
        }
        debug!(was_tracking, "interactive dismissal aborted");
        true
    }

    fn began(
        &mut self,
        event: &PanEvent,
        context: DismissContext,
        target: &mut dyn DismissTarget,
    ) -> DismissEffect {
        self.finished = false;
        self.moved = false;
        self.last_percentage = None;

        if event.origin.is_control() {
            self.phase = DismissPhase::Ignored;
            trace!(origin = ?event.origin, "drag began on a control; ignored");
            return DismissEffect::Noop;
        }

        if !target.is_dismissable() || !context.size_class.is_compact() {
            self.phase = DismissPhase::Elastic;
            return DismissEffect::ElasticBegan;
        }

        self.phase = DismissPhase::Tracking;
        target.begin_interactive_dismissal();
        debug!(
            dismiss_threshold = context.metrics.dismiss_threshold,
            "interactive dismissal began"
        );
        DismissEffect::Began
    }

    fn changed(
        &mut self,
        translation: Point,
        context: DismissContext,
        target: &mut dyn DismissTarget,
    ) -> DismissEffect {
        if self.finished || !matches!(self.phase, DismissPhase::Tracking | DismissPhase::Elastic) {
            return DismissEffect::Noop;
        }
        self.moved = true;

        let tracking = self.is_tracking();
        if !tracking || translation.y <= 0.0 {
            // Bring the host transition back to rest once.
            if tracking && self.last_percentage.is_some_and(|p| p > 0.0) {
                self.last_percentage = Some(0.0);
                target.update_dismissal(0.0);
            }
            let transform = self.visual_transform(translation, context);
            target.set_card_transform(transform);
            return DismissEffect::Moved(transform);
        }

        target.set_card_transform(Transform::IDENTITY);
        let percentage = context.metrics.percentage(translation.y);
        if self.last_percentage == Some(percentage) {
            return DismissEffect::Unchanged;
        }
        self.last_percentage = Some(percentage);
        target.update_dismissal(percentage);
        trace!(percentage, distance = translation.y, "dismissal progress");
        DismissEffect::Progress(percentage)
    }

    fn ended(
        &mut self,
        translation: Point,
        context: DismissContext,
        target: &mut dyn DismissTarget,
    ) -> DismissEffect {
        match self.phase {
            DismissPhase::Tracking => {}
            DismissPhase::Elastic => {
                self.reset_idle();
                target.restore_card();
                return DismissEffect::Restored;
            }
            _ => {
                self.reset_idle();
                return DismissEffect::Noop;
            }
        }

        self.reset_idle();
        if translation.y >= context.metrics.dismiss_threshold {
            self.finished = true;
            self.outcome = Some(DismissOutcome::Finished);
            target.finish_dismissal();
            debug!(distance = translation.y, "interactive dismissal finished");
            DismissEffect::Finished
        } else {
            self.outcome = Some(DismissOutcome::Cancelled);
            target.restore_card();
            target.cancel_dismissal();
            debug!(distance = translation.y, "interactive dismissal cancelled");
            DismissEffect::Cancelled
        }
    }

    fn aborted(&mut self, target: &mut dyn DismissTarget) -> DismissEffect {
        let phase = self.phase;
        self.reset_idle();
        if self.finished {
            return DismissEffect::Noop;
        }
        match phase {
            DismissPhase::Tracking => {
                self.outcome = Some(DismissOutcome::Cancelled);
                target.restore_card();
                target.cancel_dismissal();
                DismissEffect::Cancelled
            }
            DismissPhase::Elastic => {
                target.restore_card();
                DismissEffect::Restored
            }
            _ => DismissEffect::Noop,
        }
    }

    fn reset_idle(&mut self) {
        self.phase = DismissPhase::Idle;
        self.moved = false;
    }

    /// Cosmetic transform for a drag that cannot (or does not) dismiss.
    fn visual_transform(&self, translation: Point, context: DismissContext) -> Transform {
        let y = if translation.y < 0.0 || !self.is_tracking() {
            resisted(translation.y)
        } else {
            translation.y
        };
        let ty = y * VISUAL_FACTOR;
        if context.size_class.is_compact() {
            return Transform::translation(0.0, ty);
        }
        Transform::translation(resisted(translation.x) * VISUAL_FACTOR, ty)
    }
}
