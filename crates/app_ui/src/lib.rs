//! Flipview UI Layer
//!
//! Provides:
//! - Input normalization and per-mode keymaps
//! - Dialog and tag editor controllers
//! - The controller that executes operations against the core

pub mod components;
pub mod controller;
pub mod input;

pub use components::{Dialogs, EditorAction, StatusInfo, TagEditor};
pub use controller::Controller;
pub use input::{InputRouter, Keymap, Modifier, NamedKey, RawInput};
