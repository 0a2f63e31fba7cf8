#![forbid(unsafe_code)]

//! Proptest strategies for navigation sequences.

use proptest::prelude::*;

/// One host-level navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOp {
    /// Push a fresh item.
    Push,
    Pop,
    PopToRoot,
    /// Advance the animation clock by this many milliseconds.
    Advance(u16),
}

/// Any navigation call, weighted towards pushes so stacks get deep.
pub fn nav_op() -> impl Strategy<Value = NavOp> {
    prop_oneof![
        3 => Just(NavOp::Push),
        2 => Just(NavOp::Pop),
        1 => Just(NavOp::PopToRoot),
        2 => (0u16..1_000).prop_map(NavOp::Advance),
    ]
}

/// A sequence of up to `max` navigation calls.
pub fn nav_ops(max: usize) -> impl Strategy<Value = Vec<NavOp>> {
    proptest::collection::vec(nav_op(), 0..max)
}
