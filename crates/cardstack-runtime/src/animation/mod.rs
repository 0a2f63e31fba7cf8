#![forbid(unsafe_code)]

//! Animation sequencing.
//!
//! Hosts expose their native "animate, then notify on completion" primitive
//! through the [`Animator`] trait. [`AnimationChain`] builds strictly ordered,
//! proportionally timed sequences on top of it.
//!
//! # Invariants
//!
//! 1. Phase *k+1* is scheduled only from phase *k*'s completion callback.
//! 2. A phase's `on_complete` runs before the next phase's body.
//! 3. The chain's own completion runs exactly once, after the last phase.
//! 4. A zero total duration takes the same path; with a synchronous
//!    animator every callback fires before `start()` returns.

mod animator;
mod chain;
mod curve;

pub use animator::{
    AnimationBody, AnimationCompletion, AnimationHandle, AnimationRequest, Animator,
    ImmediateAnimator, Timeline,
};
pub use chain::{AnimationChain, AnimationPhase};
pub use curve::Curve;
