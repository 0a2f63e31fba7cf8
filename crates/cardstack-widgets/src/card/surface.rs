#![forbid(unsafe_code)]

//! Host-side collaborators of a card presentation.
//!
//! The presenter never touches a real view. It asks a [`CardSurface`] to
//! build, show, hide and fade opaque nodes, and drives a
//! [`TransitionDriver`] during an interactive dismissal. A host implements
//! both and hands the presenter a [`CardHost`].

use cardstack_core::{ItemRef, SizeClass, Transform};

/// Opaque handle to one host visual node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// The card and its content area, as seen by the presenter.
pub trait CardSurface {
    /// Build the visual nodes of `item`, in display order.
    fn make_nodes(&mut self, item: &ItemRef) -> Vec<NodeId>;

    /// Add nodes to the content area.
    fn attach_nodes(&mut self, nodes: &[NodeId]);

    /// Remove nodes from the content area.
    fn detach_nodes(&mut self, nodes: &[NodeId]);

    fn set_node_alpha(&mut self, node: NodeId, alpha: f64);

    fn set_node_hidden(&mut self, node: NodeId, hidden: bool);

    /// Opacity of the whole content area.
    fn set_content_alpha(&mut self, alpha: f64);

    fn set_busy_indicator_alpha(&mut self, alpha: f64);

    fn set_busy_indicator_animating(&mut self, animating: bool);

    fn set_close_control_visible(&mut self, visible: bool);

    fn set_card_transform(&mut self, transform: Transform);

    /// Extra bottom spacing, e.g. to clear an on-screen keyboard.
    fn set_bottom_inset(&mut self, inset: f64);

    /// Current height of the card content.
    fn content_height(&self) -> f64;

    /// Layout class of the screen hosting the card.
    fn size_class(&self) -> SizeClass {
        SizeClass::Compact
    }

    /// Begin a non-interactive dismissal of the card.
    ///
    /// The host calls `CardPresenter::complete_dismissal` once the card is gone.
    fn dismiss_card(&mut self, animated: bool);
}

/// The host's percent-driven dismissal transition.
pub trait TransitionDriver {
    fn start(&mut self);

    /// Set progress in `[0, 1]`.
    fn update(&mut self, percent: f64);

    fn finish(&mut self);

    fn cancel(&mut self);
}

/// Everything a presenter needs from its host.
pub trait CardHost: CardSurface + TransitionDriver {}

impl<T: CardSurface + TransitionDriver + ?Sized> CardHost for T {}
