#![forbid(unsafe_code)]

//! Ordered, proportionally timed animation sequences.
//!
//! An [`AnimationChain`] owns a queue of [`AnimationPhase`]s and drains it
//! through an [`Animator`], one phase at a time. Each phase lasts
//! `relative_duration × total_duration`; the chain's initial delay applies
//! to the first phase only.
//!
//! # Failure Modes
//!
//! | Misuse | Result |
//! |--------|--------|
//! | `add` while running | panic |
//! | `start` while running | panic |
//! | relative duration outside `(0, 1]` | panic in `AnimationPhase::new` |
//! | call off the UI thread | panic |
//!
//! There is no cancellation: once started, a chain runs to completion. The
//! chain keeps itself alive through its pending completion callback, so
//! dropping the handle mid-flight does not stop it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use cardstack_core::UiThread;
use tracing::{debug, trace};

use super::animator::{AnimationRequest, Animator};
use super::curve::Curve;

/// One step of an [`AnimationChain`].
pub struct AnimationPhase {
    relative_duration: f64,
    curve: Curve,
    body: Option<Box<dyn FnOnce()>>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl AnimationPhase {
    /// Create a phase lasting `relative_duration` of the chain's duration.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < relative_duration <= 1`.
    #[must_use]
    #[track_caller]
    pub fn new(relative_duration: f64, curve: Curve) -> Self {
        assert!(
            relative_duration > 0.0 && relative_duration <= 1.0,
            "relative duration must be in (0, 1], got {relative_duration}"
        );
        Self {
            relative_duration,
            curve,
            body: None,
            on_complete: None,
        }
    }

    /// Set the animated changes.
    #[must_use]
    pub fn body(mut self, body: impl FnOnce() + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// Set the callback run once the phase has visually completed.
    #[must_use]
    pub fn on_complete(mut self, on_complete: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    #[must_use]
    pub fn relative_duration(&self) -> f64 {
        self.relative_duration
    }

    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }
}

impl fmt::Debug for AnimationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationPhase")
            .field("relative_duration", &self.relative_duration)
            .field("curve", &self.curve)
            .finish_non_exhaustive()
    }
}

struct ChainState {
    initial_delay: Duration,
    phases: VecDeque<AnimationPhase>,
    running: bool,
    first_scheduled: bool,
    on_complete: Option<Box<dyn FnOnce()>>,
}

struct ChainInner {
    animator: Rc<dyn Animator>,
    ui: UiThread,
    total_duration: Duration,
    state: RefCell<ChainState>,
}

/// A sequence of animations run one after the other.
pub struct AnimationChain {
    inner: Rc<ChainInner>,
}

impl AnimationChain {
    /// Create an empty chain of the given total duration.
    ///
    /// The calling thread becomes the chain's UI thread.
    pub fn new(total_duration: Duration, animator: Rc<dyn Animator>) -> Self {
        Self {
            inner: Rc::new(ChainInner {
                animator,
                ui: UiThread::current(),
                total_duration,
                state: RefCell::new(ChainState {
                    initial_delay: Duration::ZERO,
                    phases: VecDeque::new(),
                    running: false,
                    first_scheduled: false,
                    on_complete: None,
                }),
            }),
        }
    }

    /// Builder: delay applied once, before the first phase.
    #[must_use]
    pub fn with_initial_delay(self, delay: Duration) -> Self {
        self.inner.state.borrow_mut().initial_delay = delay;
        self
    }

    /// Builder: callback run once every phase has completed.
    #[must_use]
    pub fn with_completion(self, on_complete: impl FnOnce() + 'static) -> Self {
        self.set_completion(on_complete);
        self
    }

    /// Replace the chain's completion callback.
    pub fn set_completion(&self, on_complete: impl FnOnce() + 'static) {
        self.inner.state.borrow_mut().on_complete = Some(Box::new(on_complete));
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.inner.total_duration
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.inner.state.borrow().initial_delay
    }

    /// Whether the chain has started and not yet finished.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().running
    }

    /// Number of phases not yet started.
    #[must_use]
    pub fn pending_phases(&self) -> usize {
        self.inner.state.borrow().phases.len()
    }

    /// Append a phase.
    ///
    /// # Panics
    ///
    /// Panics if the chain is running or if called off the UI thread.
    #[track_caller]
    pub fn add(&self, phase: AnimationPhase) {
        self.inner.ui.assert_current("AnimationChain::add");
        let mut state = self.inner.state.borrow_mut();
        assert!(
            !state.running,
            "cannot add an animation phase to a chain that is already running"
        );
        state.phases.push_back(phase);
    }

    /// Start draining the phase queue.
    ///
    /// With a synchronous animator (or a zero total duration on [`Timeline`])
    /// every callback has fired by the time this returns.
    ///
    /// # Panics
    ///
    /// Panics if the chain is already running or if called off the UI thread.
    ///
    /// [`Timeline`]: super::Timeline
    #[track_caller]
    pub fn start(&self) {
        self.inner.ui.assert_current("AnimationChain::start");
        {
            let mut state = self.inner.state.borrow_mut();
            assert!(!state.running, "animation chain is already running");
            state.running = true;
            debug!(
                phases = state.phases.len(),
                total_ms = self.inner.total_duration.as_millis() as u64,
                delay_ms = state.initial_delay.as_millis() as u64,
                "animation chain started"
            );
        }
        ChainInner::perform_next(&self.inner);
    }
}

impl ChainInner {
    fn perform_next(this: &Rc<ChainInner>) {
        let next = {
            let mut state = this.state.borrow_mut();
            state.phases.pop_front().map(|phase| {
                let delay = if state.first_scheduled {
                    Duration::ZERO
                } else {
                    state.initial_delay
                };
                state.first_scheduled = true;
                (phase, delay)
            })
        };

        let Some((phase, delay)) = next else {
            Self::finish(this);
            return;
        };

        let request = AnimationRequest {
            duration: this.total_duration.mul_f64(phase.relative_duration),
            delay,
            curve: phase.curve,
        };
        trace!(
            duration_ms = request.duration.as_millis() as u64,
            curve = ?request.curve,
            "animation phase scheduled"
        );

        let body = phase.body.unwrap_or_else(|| Box::new(|| {}));
        let on_complete = phase.on_complete;
        let chain = Rc::clone(this);
        this.animator.animate(
            request,
            body,
            Box::new(move || {
                if let Some(on_complete) = on_complete {
                    on_complete();
                }
                ChainInner::perform_next(&chain);
            }),
        );
    }

    fn finish(this: &Rc<ChainInner>) {
        let on_complete = {
            let mut state = this.state.borrow_mut();
            state.running = false;
            state.on_complete.take()
        };
        debug!("animation chain finished");
        if let Some(on_complete) = on_complete {
            on_complete();
        }
    }
}

impl fmt::Debug for AnimationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AnimationChain")
            .field("total_duration", &self.inner.total_duration)
            .field("initial_delay", &state.initial_delay)
            .field("pending_phases", &state.phases.len())
            .field("running", &state.running)
            .finish()
    }
}
