use super::router::{Modifiers, RawInput};
use device_query::{DeviceQuery, DeviceState, Keycode};

/// Polls the physical keyboard and reports keys that went down or up since
/// the previous poll.
pub struct KeyboardHandler {
    device_state: DeviceState,
    held: Vec<Keycode>,
}

impl KeyboardHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&mut self) -> Vec<RawInput> {
        let keys = self.device_state.get_keys();
        let events = transitions(&self.held, &keys);
        self.held = keys;
        events
    }

    pub fn is_held(&self, key: Keycode) -> bool {
        self.held.contains(&key)
    }
}

impl Default for KeyboardHandler {
    fn default() -> Self {
        Self {
            device_state: DeviceState::new(),
            held: Vec::new(),
        }
    }
}

/// Key-up events for keys in `previous` but not in `current`, then key-down
/// events for the reverse. Keys without a label are skipped.
pub fn transitions(previous: &[Keycode], current: &[Keycode]) -> Vec<RawInput> {
    let modifiers = modifiers(current);
    let released = previous
        .iter()
        .filter(|key| !current.contains(key))
        .filter_map(|key| key_label(*key))
        .map(|key| RawInput::KeyUp {
            key: key.to_string(),
            modifiers,
        });
    let pressed = current
        .iter()
        .filter(|key| !previous.contains(key))
        .filter_map(|key| key_label(*key))
        .map(|key| RawInput::KeyDown {
            key: key.to_string(),
            modifiers,
            repeat: false,
        });
    released.chain(pressed).collect()
}

pub fn modifiers(keys: &[Keycode]) -> Modifiers {
    Modifiers {
        ctrl: keys.contains(&Keycode::LControl) || keys.contains(&Keycode::RControl),
        alt: keys.contains(&Keycode::LAlt) || keys.contains(&Keycode::RAlt),
        meta: keys.contains(&Keycode::Meta),
    }
}

/// The character a key types without shift, for keys that can be bound to a
/// note.
pub fn key_label(key: Keycode) -> Option<&'static str> {
    let label = match key {
        Keycode::A => "a",
        Keycode::B => "b",
        Keycode::C => "c",
        Keycode::D => "d",
        Keycode::E => "e",
        Keycode::F => "f",
        Keycode::G => "g",
        Keycode::H => "h",
        Keycode::I => "i",
        Keycode::J => "j",
        Keycode::K => "k",
        Keycode::L => "l",
        Keycode::M => "m",
        Keycode::N => "n",
        Keycode::O => "o",
        Keycode::P => "p",
        Keycode::Q => "q",
        Keycode::R => "r",
        Keycode::S => "s",
        Keycode::T => "t",
        Keycode::U => "u",
        Keycode::V => "v",
        Keycode::W => "w",
        Keycode::X => "x",
        Keycode::Y => "y",
        Keycode::Z => "z",
        Keycode::Key0 => "0",
        Keycode::Key1 => "1",
        Keycode::Key2 => "2",
        Keycode::Key3 => "3",
        Keycode::Key4 => "4",
        Keycode::Key5 => "5",
        Keycode::Key6 => "6",
        Keycode::Key7 => "7",
        Keycode::Key8 => "8",
        Keycode::Key9 => "9",
        Keycode::Comma => ",",
        Keycode::Dot => ".",
        Keycode::Semicolon => ";",
        Keycode::Minus => "-",
        Keycode::Equal => "=",
        Keycode::LeftBracket => "[",
        Keycode::RightBracket => "]",
        Keycode::BackSlash => "\\",
        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_the_two_row_layout() {
        assert_eq!(key_label(Keycode::Z), Some("z"));
        assert_eq!(key_label(Keycode::Key1), Some("1"));
        assert_eq!(key_label(Keycode::BackSlash), Some("\\"));
        assert_eq!(key_label(Keycode::Escape), None);
        assert_eq!(key_label(Keycode::LControl), None);
    }

    #[test]
    fn reports_changes_only() {
        let events = transitions(&[Keycode::Z], &[Keycode::Z, Keycode::X]);
        assert_eq!(
            events,
            vec![RawInput::KeyDown {
                key: "x".to_string(),
                modifiers: Modifiers::NONE,
                repeat: false,
            }]
        );

        let events = transitions(&[Keycode::Z, Keycode::X], &[Keycode::X]);
        assert_eq!(
            events,
            vec![RawInput::KeyUp {
                key: "z".to_string(),
                modifiers: Modifiers::NONE,
            }]
        );

        assert!(transitions(&[Keycode::X], &[Keycode::X]).is_empty());
    }

    #[test]
    fn carries_held_modifiers() {
        let events = transitions(&[], &[Keycode::LControl, Keycode::Z]);

        assert_eq!(
            events,
            vec![RawInput::KeyDown {
                key: "z".to_string(),
                modifiers: Modifiers {
                    ctrl: true,
                    ..Modifiers::NONE
                },
                repeat: false,
            }]
        );
    }
}
