//! Keyboard input polled once per frame.
//!
//! The public API does not expose winit types; the runtime translates window
//! events through `platform::winit` and feeds them into `InputState`.

pub(crate) mod platform;
mod state;
mod toggle;
mod types;

pub use state::InputState;
pub use toggle::{EdgeToggle, ToggleBindings, ToggleSignals, Toggles};
pub use types::{InputEvent, Key, KeyState};
