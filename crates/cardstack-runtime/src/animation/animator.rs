#![forbid(unsafe_code)]

//! Host animation primitive and two reference implementations.
//!
//! An [`Animator`] receives a body (the state changes to animate) and a
//! completion callback. It must call the body exactly once, then the
//! completion exactly once, never the completion first.
//!
//! - [`ImmediateAnimator`] runs both synchronously; motion is skipped.
//! - [`Timeline`] is a deterministic, clock-driven animator. Time only moves
//!   when the host calls [`Timeline::advance`], [`Timeline::advance_to`] or
//!   [`Timeline::tick`], which makes it suitable both for frame-loop hosts and
//!   for tests.
//!
//! # Timeline scheduling
//!
//! - With no delay, the body runs synchronously inside `animate`; with no
//!   delay and no duration, the completion also runs synchronously.
//! - Otherwise events (delayed body starts, completions) are processed in
//!   time order, ties broken by scheduling order.
//! - While a completion runs, the timeline clock reads the completing
//!   animation's end time, so an animation scheduled from a completion
//!   callback starts exactly where the previous one ended.

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use web_time::Instant;

use super::curve::Curve;

/// The state changes of one animation.
pub type AnimationBody = Box<dyn FnOnce()>;

/// Callback fired once the animation has visually completed.
pub type AnimationCompletion = Box<dyn FnOnce()>;

/// Timing parameters of one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationRequest {
    pub duration: Duration,
    pub delay: Duration,
    pub curve: Curve,
}

impl AnimationRequest {
    /// An undelayed animation.
    #[must_use]
    pub const fn new(duration: Duration, curve: Curve) -> Self {
        Self {
            duration,
            delay: Duration::ZERO,
            curve,
        }
    }

    /// Set the start delay.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Whether the whole animation takes no time.
    #[inline]
    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.duration.is_zero() && self.delay.is_zero()
    }
}

/// Identifier of a scheduled animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    /// Get the raw handle value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// The host's "animate and notify on completion" primitive.
pub trait Animator {
    /// Animate the changes made by `body`, then call `completion`.
    fn animate(
        &self,
        request: AnimationRequest,
        body: AnimationBody,
        completion: AnimationCompletion,
    ) -> AnimationHandle;
}

// ---------------------------------------------------------------------------
// ImmediateAnimator
// ---------------------------------------------------------------------------

/// Animator that applies every animation instantly.
#[derive(Debug, Default)]
pub struct ImmediateAnimator {
    issued: std::cell::Cell<u64>,
}

impl ImmediateAnimator {
    /// Create a new immediate animator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of animations run so far.
    #[must_use]
    pub fn animations_run(&self) -> u64 {
        self.issued.get()
    }
}

impl Animator for ImmediateAnimator {
    fn animate(
        &self,
        _request: AnimationRequest,
        body: AnimationBody,
        completion: AnimationCompletion,
    ) -> AnimationHandle {
        let handle = AnimationHandle(self.issued.get());
        self.issued.set(self.issued.get() + 1);
        body();
        completion();
        handle
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

struct Entry {
    handle: AnimationHandle,
    begin_at: Duration,
    end_at: Duration,
    curve: Curve,
    body: Option<AnimationBody>,
    completion: AnimationCompletion,
}

impl Entry {
    /// Time of the next event of this entry.
    fn next_event_at(&self) -> Duration {
        if self.body.is_some() {
            self.begin_at
        } else {
            self.end_at
        }
    }
}

#[derive(Default)]
struct TimelineState {
    now: Duration,
    next_handle: u64,
    entries: Vec<Entry>,
    wall_anchor: Option<(Instant, Duration)>,
}

enum Step {
    Begin(AnimationBody),
    Complete(AnimationCompletion),
}

/// Deterministic, manually clocked animator.
#[derive(Default)]
pub struct Timeline {
    state: RefCell<TimelineState>,
}

impl Timeline {
    /// Create a timeline at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current timeline time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of animations that have not completed yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Whether no animation is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    /// Eased progress of an in-flight animation, `None` once it completed.
    #[must_use]
    pub fn progress(&self, handle: AnimationHandle) -> Option<f64> {
        let state = self.state.borrow();
        let entry = state.entries.iter().find(|e| e.handle == handle)?;
        if state.now <= entry.begin_at {
            return Some(0.0);
        }
        let span = entry.end_at.saturating_sub(entry.begin_at);
        if span.is_zero() {
            return Some(1.0);
        }
        let linear = (state.now - entry.begin_at).as_secs_f64() / span.as_secs_f64();
        Some(entry.curve.apply(linear))
    }

    /// Move the clock forward by `dt`, firing every event that falls due.
    pub fn advance(&self, dt: Duration) {
        let target = self.now() + dt;
        self.advance_to(target);
    }

    /// Move the clock to `target`, firing every event that falls due.
    ///
    /// Moving backwards is a no-op.
    pub fn advance_to(&self, target: Duration) {
        while let Some(step) = self.next_step(target) {
            match step {
                Step::Begin(body) => body(),
                Step::Complete(completion) => completion(),
            }
        }
        let mut state = self.state.borrow_mut();
        state.now = state.now.max(target);
    }

    /// Advance to the current wall-clock time.
    ///
    /// The first call anchors the timeline to the wall clock.
    pub fn tick(&self) {
        let target = {
            let mut state = self.state.borrow_mut();
            let now = state.now;
            let (anchor, base) = *state.wall_anchor.get_or_insert((Instant::now(), now));
            base + anchor.elapsed()
        };
        self.advance_to(target);
    }

    /// Run the clock until no animation is in flight, including animations
    /// scheduled by completions along the way.
    pub fn run_to_idle(&self) {
        loop {
            let horizon = {
                let state = self.state.borrow();
                state.entries.iter().map(|e| e.end_at).max()
            };
            match horizon {
                Some(end) => self.advance_to(end),
                None => break,
            }
        }
    }

    fn next_step(&self, target: Duration) -> Option<Step> {
        let mut state = self.state.borrow_mut();
        let (at, index) = state
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.next_event_at(), i))
            .filter(|(at, _)| *at <= target)
            .min()?;
        state.now = state.now.max(at);
        if let Some(body) = state.entries[index].body.take() {
            return Some(Step::Begin(body));
        }
        let entry = state.entries.remove(index);
        Some(Step::Complete(entry.completion))
    }
}

impl Animator for Timeline {
    fn animate(
        &self,
        request: AnimationRequest,
        body: AnimationBody,
        completion: AnimationCompletion,
    ) -> AnimationHandle {
        let (handle, begin_at) = {
            let mut state = self.state.borrow_mut();
            let handle = AnimationHandle(state.next_handle);
            state.next_handle += 1;
            (handle, state.now + request.delay)
        };

        let body = if request.delay.is_zero() {
            body();
            if request.duration.is_zero() {
                completion();
                return handle;
            }
            None
        } else {
            Some(body)
        };

        self.state.borrow_mut().entries.push(Entry {
            handle,
            begin_at,
            end_at: begin_at + request.duration,
            curve: request.curve,
            body,
            completion,
        });
        handle
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Timeline")
            .field("now", &state.now)
            .field("pending", &state.entries.len())
            .finish()
    }
}
