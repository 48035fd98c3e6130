use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Keyboard state for the window: which keys are currently held.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Releases are not delivered to unfocused windows.
                    self.keys_down.clear();
                }
            }

            InputEvent::Key { key, state: KeyState::Pressed, .. } => {
                self.keys_down.insert(key);
            }

            InputEvent::Key { key, state: KeyState::Released, .. } => {
                self.keys_down.remove(&key);
            }
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState, repeat: bool) -> InputEvent {
        InputEvent::Key { key, state, repeat }
    }

    #[test]
    fn press_and_release_track_held_keys() {
        let mut s = InputState::default();
        s.apply_event(key(Key::F, KeyState::Pressed, false));
        assert!(s.key_down(Key::F));
        s.apply_event(key(Key::F, KeyState::Pressed, true));
        assert!(s.key_down(Key::F));
        s.apply_event(key(Key::F, KeyState::Released, false));
        assert!(!s.key_down(Key::F));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::default();
        s.apply_event(InputEvent::Focused(true));
        s.apply_event(key(Key::G, KeyState::Pressed, false));
        s.apply_event(InputEvent::Focused(false));
        assert!(!s.focused);
        assert!(s.keys_down.is_empty());
    }
}
