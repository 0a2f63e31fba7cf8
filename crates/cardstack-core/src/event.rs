#![forbid(unsafe_code)]

//! Continuous drag input delivered by the host's gesture system.
//!
//! A drag is a sequence of [`PanEvent`]s: exactly one `Began`, any number of
//! `Changed`, then one terminal `Ended`, `Cancelled` or `Failed`. The
//! translation is always cumulative since the gesture began.

use crate::geometry::Point;

/// Lifecycle phase of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanPhase {
    Began,
    Changed,
    Ended,
    /// The gesture system aborted the drag (e.g. the recognizer was disabled).
    Cancelled,
    /// The gesture system decided the touch was not a drag after all.
    Failed,
}

impl PanPhase {
    /// Whether this phase ends the gesture.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled | Self::Failed)
    }
}

/// Kind of interactive control a touch started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    TextField,
    Switch,
    Other,
}

/// What was under the pointer when the gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TouchTarget {
    /// Non-interactive card content.
    #[default]
    Content,
    /// An interactive control inside the card.
    Control(ControlKind),
    /// Outside the card (the dimmed backdrop).
    Outside,
}

impl TouchTarget {
    /// Whether the touch landed on an interactive control.
    #[inline]
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Control(_))
    }
}

/// One drag gesture update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    pub phase: PanPhase,
    /// Cumulative translation since `Began`.
    pub translation: Point,
    /// Touch origin. Only meaningful on `Began`.
    pub origin: TouchTarget,
}

impl PanEvent {
    /// A gesture start on the given target.
    #[must_use]
    pub const fn began(origin: TouchTarget) -> Self {
        Self {
            phase: PanPhase::Began,
            translation: Point::ZERO,
            origin,
        }
    }

    /// A movement update with cumulative translation `(x, y)`.
    #[must_use]
    pub const fn changed(x: f64, y: f64) -> Self {
        Self {
            phase: PanPhase::Changed,
            translation: Point::new(x, y),
            origin: TouchTarget::Content,
        }
    }

    /// The pointer was released at cumulative translation `(x, y)`.
    #[must_use]
    pub const fn ended(x: f64, y: f64) -> Self {
        Self {
            phase: PanPhase::Ended,
            translation: Point::new(x, y),
            origin: TouchTarget::Content,
        }
    }

    /// The gesture system aborted the drag.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            phase: PanPhase::Cancelled,
            translation: Point::ZERO,
            origin: TouchTarget::Content,
        }
    }

    /// The gesture system rejected the drag.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            phase: PanPhase::Failed,
            translation: Point::ZERO,
            origin: TouchTarget::Content,
        }
    }
}
