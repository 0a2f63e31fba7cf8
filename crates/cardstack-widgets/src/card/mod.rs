#![forbid(unsafe_code)]

//! Bottom-sheet card presentation.
//!
//! The card shows one item at a time. Navigation is owned by
//! [`NavigationStack`], content swaps are sequenced by the presenter on an
//! `AnimationChain`, and [`DismissController`] turns drags into an
//! interactive dismissal.
//!
//! # Example
//!
//! ```ignore
//! let host: SharedHost = Rc::new(RefCell::new(MyHost::new()));
//! let presenter = CardPresenter::new(
//!     ItemRef::new(Welcome),
//!     host,
//!     Rc::new(Timeline::new()),
//!     PresentationConfig::default(),
//! );
//! presenter.prepare();
//! presenter.push(ItemRef::new(Permissions));
//! ```

mod dismiss;
mod navigation;
mod presenter;
mod surface;

pub use dismiss::{
    DismissContext, DismissController, DismissEffect, DismissMetrics, DismissOutcome,
    DismissPhase, DismissTarget, adaptive, resisted,
};
pub use navigation::{NavigationStack, Transition, TransitionDelegate};
pub use presenter::{CardPresenter, PresenterFlags, SharedHost};
pub use surface::{CardHost, CardSurface, NodeId, TransitionDriver};
