//! Input boundary: the keyboard, cursor and window-focus state that camera
//! controllers read, behind a trait so no window implementation leaks in.
//!
//! # Invariants
//! - Controllers never reach into a window directly; everything arrives via
//!   [`InputSource`].
//! - [`InputState`] is a complete in-memory source for headless runs and tests.

mod key;
mod state;

pub use key::Key;
pub use state::{InputSource, InputState};
