#![forbid(unsafe_code)]

//! Runtime services for cardstack presentations.
//!
//! - [`animation`]: the ordered animation sequencer ([`AnimationChain`]) and
//!   the host animation primitive ([`Animator`]) it runs on.
//! - [`config`]: presentation timing and interaction policy.

pub mod animation;
pub mod config;

pub use animation::{
    AnimationChain, AnimationHandle, AnimationPhase, AnimationRequest, Animator, Curve,
    ImmediateAnimator, Timeline,
};
pub use config::{ConfigError, PresentationConfig};
