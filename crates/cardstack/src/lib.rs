#![forbid(unsafe_code)]

//! cardstack: a bottom-sheet card that presents a sequence of content items.
//!
//! The card shows one item at a time. Items are pushed, popped and chained
//! through their `next` link; every change swaps the card content through a
//! three-phase animation, and the card can be swiped down to dismiss.
//!
//! Most hosts only need the [`prelude`]:
//!
//! ```ignore
//! use cardstack::prelude::*;
//!
//! let presenter = CardPresenter::new(root, host, animator, PresentationConfig::default());
//! presenter.prepare();
//! presenter.push(details);
//! ```
//!
//! Lower-level pieces (the navigation stack, the animation chain, the
//! dismiss controller) are re-exported at the crate root.

pub use cardstack_core::{
    ControlKind, Insets, Item, ItemId, ItemRef, NavRequest, Navigator, PanEvent, PanPhase, Point,
    PresentationId, SizeClass, TouchTarget, Transform,
};
pub use cardstack_runtime::{
    AnimationChain, AnimationPhase, AnimationRequest, Animator, ConfigError, Curve,
    ImmediateAnimator, PresentationConfig, Timeline,
};
pub use cardstack_widgets::{
    CardHost, CardPresenter, CardSurface, DismissContext, DismissController, DismissEffect,
    DismissPhase, DismissTarget, NavigationStack, NodeId, SharedHost, Transition,
    TransitionDriver,
};

/// Everything a host needs to present a card.
pub mod prelude {
    pub use cardstack_core::{
        Insets, Item, ItemRef, Navigator, PanEvent, SizeClass, TouchTarget, Transform,
    };
    pub use cardstack_runtime::{Animator, ImmediateAnimator, PresentationConfig};
    pub use cardstack_widgets::{
        CardHost, CardPresenter, CardSurface, NodeId, SharedHost, TransitionDriver,
    };
}
