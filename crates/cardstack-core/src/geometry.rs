#![forbid(unsafe_code)]

//! Geometry primitives shared by the gesture and presentation layers.
//!
//! Coordinates are logical points (`f64`), y grows downward. A positive
//! vertical translation therefore means "dragged toward the bottom edge".

/// A point or a 2D translation in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A purely vertical translation.
    #[must_use]
    pub const fn vertical(y: f64) -> Self {
        Self { x: 0.0, y }
    }
}

/// Translation-only affine transform applied to the card.
///
/// Cards never scale or rotate in response to a drag, so a translation pair
/// is all the host needs to position the card.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub tx: f64,
    pub ty: f64,
}

impl Transform {
    /// The identity transform (card at rest).
    pub const IDENTITY: Self = Self { tx: 0.0, ty: 0.0 };

    /// Create a translation transform.
    #[must_use]
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self { tx, ty }
    }

    /// Whether this transform leaves the card where it is.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.tx == 0.0 && self.ty == 0.0
    }
}

/// Horizontal layout class of the screen hosting the card.
///
/// Only the narrow (`Compact`) layout supports interactive swipe-to-dismiss;
/// in `Regular` layouts the card floats and a drag only rubber-bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SizeClass {
    #[default]
    Compact,
    Regular,
}

impl SizeClass {
    /// Returns `true` for the narrow layout class.
    #[inline]
    #[must_use]
    pub const fn is_compact(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Edge insets of the visible viewport (e.g. an on-screen keyboard).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Insets {
    /// No insets.
    pub const ZERO: Self = Self {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    /// Insets with only a bottom component.
    #[must_use]
    pub const fn bottom(bottom: f64) -> Self {
        Self {
            top: 0.0,
            left: 0.0,
            bottom,
            right: 0.0,
        }
    }
}
