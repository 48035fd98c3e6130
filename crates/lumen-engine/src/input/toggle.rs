//! Edge-triggered switches.
//!
//! A toggle fires on the rising edge of its pressed signal only; holding the
//! key across frames fires once.

use super::{InputState, Key};

/// Tracks the previous pressed state of one signal.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct EdgeToggle {
    previous: bool,
}

impl EdgeToggle {
    /// Feeds this frame's signal; returns true on a released → pressed transition.
    #[inline]
    pub fn update(&mut self, pressed: bool) -> bool {
        let fired = pressed && !self.previous;
        self.previous = pressed;
        fired
    }
}

/// Toggle events that fired this frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ToggleSignals {
    pub toggle_aa: bool,
    pub toggle_sub_mode: bool,
}

/// Key assignments for the two toggles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ToggleBindings {
    pub toggle_aa: Key,
    pub toggle_sub_mode: Key,
}

impl Default for ToggleBindings {
    fn default() -> Self {
        Self {
            toggle_aa: Key::F,
            toggle_sub_mode: Key::G,
        }
    }
}

/// Both edge toggles plus their bindings, sampled once per frame.
#[derive(Debug, Clone, Default)]
pub struct Toggles {
    bindings: ToggleBindings,
    aa: EdgeToggle,
    sub_mode: EdgeToggle,
}

impl Toggles {
    pub fn new(bindings: ToggleBindings) -> Self {
        Self {
            bindings,
            aa: EdgeToggle::default(),
            sub_mode: EdgeToggle::default(),
        }
    }

    pub fn bindings(&self) -> ToggleBindings {
        self.bindings
    }

    /// Samples the bound keys and reports which toggles fired.
    pub fn sample(&mut self, input: &InputState) -> ToggleSignals {
        ToggleSignals {
            toggle_aa: self.aa.update(input.key_down(self.bindings.toggle_aa)),
            toggle_sub_mode: self.sub_mode.update(input.key_down(self.bindings.toggle_sub_mode)),
        }
    }
}
