#![forbid(unsafe_code)]

//! Card presentation widgets for cardstack.
//!
//! - [`card::NavigationStack`]: which item is current, and what happens to
//!   the ones it displaced.
//! - [`card::DismissController`]: swipe-to-dismiss.
//! - [`card::CardPresenter`]: ties both to a host card.

pub mod card;

pub use card::{
    CardHost, CardPresenter, CardSurface, DismissContext, DismissController, DismissEffect,
    DismissMetrics, DismissOutcome, DismissPhase, DismissTarget, NavigationStack, NodeId,
    PresenterFlags, SharedHost, Transition, TransitionDelegate, TransitionDriver,
};
