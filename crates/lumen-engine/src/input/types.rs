use std::fmt;

/// Keyboard key identifier (physical position, US layout names).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Space,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Any other key, with the platform key code when one exists.
    Unknown(u32),
}

const LETTERS: [Key; 26] = [
    Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
    Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
    Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
];

const DIGITS: [Key; 10] = [
    Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
    Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
];

const FUNCTION_KEYS: [Key; 12] = [
    Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
    Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
];

impl Key {
    /// Parses a key name as written in config files: `"F"`, `"g"`, `"7"`,
    /// `"F5"`, `"Escape"`, `"Space"`. Case-insensitive.
    pub fn from_name(name: &str) -> Option<Key> {
        let upper = name.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();

        match upper.as_str() {
            "ESCAPE" | "ESC" => return Some(Key::Escape),
            "ENTER" | "RETURN" => return Some(Key::Enter),
            "TAB" => return Some(Key::Tab),
            "SPACE" => return Some(Key::Space),
            _ => {}
        }

        match bytes {
            [c @ b'A'..=b'Z'] => Some(LETTERS[(c - b'A') as usize]),
            [c @ b'0'..=b'9'] => Some(DIGITS[(c - b'0') as usize]),
            [b'F', rest @ ..] if !rest.is_empty() => {
                let n: usize = upper[1..].parse().ok()?;
                FUNCTION_KEYS.get(n.checked_sub(1)?).copied()
            }
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Unknown(code) => write!(f, "Unknown({code})"),
            Key::Digit0 | Key::Digit1 | Key::Digit2 | Key::Digit3 | Key::Digit4
            | Key::Digit5 | Key::Digit6 | Key::Digit7 | Key::Digit8 | Key::Digit9 => {
                let d = DIGITS.iter().position(|k| k == self).unwrap_or(0);
                write!(f, "{d}")
            }
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// True when the event is an OS key-repeat.
        repeat: bool,
    },

    /// Window focus change.
    Focused(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_parse_case_insensitively() {
        assert_eq!(Key::from_name("F"), Some(Key::F));
        assert_eq!(Key::from_name("g"), Some(Key::G));
        assert_eq!(Key::from_name("7"), Some(Key::Digit7));
        assert_eq!(Key::from_name("f5"), Some(Key::F5));
        assert_eq!(Key::from_name("F12"), Some(Key::F12));
        assert_eq!(Key::from_name("escape"), Some(Key::Escape));
        assert_eq!(Key::from_name(" Space "), Some(Key::Space));
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        assert_eq!(Key::from_name(""), None);
        assert_eq!(Key::from_name("F13"), None);
        assert_eq!(Key::from_name("F0"), None);
        assert_eq!(Key::from_name("Hyper"), None);
    }

    #[test]
    fn display_matches_config_names() {
        for name in ["F", "G", "F5", "Escape", "3"] {
            let key = Key::from_name(name).unwrap();
            assert_eq!(Key::from_name(&key.to_string()), Some(key));
        }
    }
}
