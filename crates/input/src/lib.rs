//! Viewer input: raw keys, drags and scrolls mapped to high-level actions.
//!
//! # Invariants
//! - The host consumes actions, never raw input events.
//! - Input never touches the scene clock; pausing goes through an action.

pub mod action;

pub use action::{Action, DragState, Key, action_for_key, action_for_scroll};
