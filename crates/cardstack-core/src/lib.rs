#![forbid(unsafe_code)]

//! Core contracts for cardstack presentations.
//!
//! This crate holds the pieces every other layer agrees on:
//!
//! - [`item`]: the [`Item`] capability trait and the shared [`ItemRef`] handle
//!   that carries the forward `next` chain and the owner back-reference.
//! - [`navigator`]: the back-reference handle ([`Navigator`]) items use to ask
//!   their presentation to navigate.
//! - [`geometry`]: points, translations, size classes and insets.
//! - [`event`]: continuous drag input ([`PanEvent`]).
//! - [`ui_thread`]: the single UI-coordination thread assertion.

pub mod event;
pub mod geometry;
pub mod item;
pub mod navigator;
pub mod ui_thread;

pub use event::{ControlKind, PanEvent, PanPhase, TouchTarget};
pub use geometry::{Insets, Point, SizeClass, Transform};
pub use item::{Item, ItemId, ItemRef};
pub use navigator::{NavRequest, Navigator, PresentationId, RequestQueue};
pub use ui_thread::UiThread;
