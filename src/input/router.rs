use crate::synth::note::{NoteCatalog, NoteEvent, NoteId, NoteSource};
use std::collections::{HashMap, HashSet};

/// Modifier keys that turn a key press into a shortcut rather than a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Input as the renderer and the keyboard see it, before normalization.
///
/// Pointer and touch input already names its note; keyboard input names a
/// physical key by its label (`"z"`, `"1"`, `","`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    PointerDown(NoteId),
    PointerUp(NoteId),
    /// The pointer moved off a key.
    PointerLeave(NoteId),
    TouchStart(NoteId),
    TouchEnd(NoteId),
    KeyDown {
        key: String,
        modifiers: Modifiers,
        repeat: bool,
    },
    KeyUp {
        key: String,
        modifiers: Modifiers,
    },
}

/// Turns [`RawInput`] into note presses and releases, dropping repeats and
/// shortcuts.
pub struct InputRouter {
    catalog: NoteCatalog,
    held: HashSet<(NoteSource, NoteId)>,
    /// Lowercased key label to the note its key-down pressed.
    held_keys: HashMap<String, NoteId>,
}

impl InputRouter {
    pub fn new(catalog: NoteCatalog) -> Self {
        Self {
            catalog,
            held: HashSet::new(),
            held_keys: HashMap::new(),
        }
    }

    pub fn route(&mut self, input: RawInput) -> Option<NoteEvent> {
        match input {
            RawInput::PointerDown(note) => self.hold(NoteSource::Pointer, note),
            RawInput::PointerUp(note) => Some(self.let_go(NoteSource::Pointer, note)),
            RawInput::PointerLeave(note) => {
                if self.held.contains(&(NoteSource::Pointer, note.clone())) {
                    Some(self.let_go(NoteSource::Pointer, note))
                } else {
                    None
                }
            }
            RawInput::TouchStart(note) => self.hold(NoteSource::Touch, note),
            RawInput::TouchEnd(note) => Some(self.let_go(NoteSource::Touch, note)),
            RawInput::KeyDown {
                key,
                modifiers,
                repeat,
            } => self.key_down(&key, modifiers, repeat),
            RawInput::KeyUp { key, modifiers } => self.key_up(&key, modifiers),
        }
    }

    fn hold(&mut self, source: NoteSource, note: NoteId) -> Option<NoteEvent> {
        if self.held.insert((source, note.clone())) {
            Some(NoteEvent::press(note, source))
        } else {
            None
        }
    }

    /// Releasing a note stops it for every source, so none of them may keep
    /// holding it.
    fn let_go(&mut self, source: NoteSource, note: NoteId) -> NoteEvent {
        self.held.retain(|(_, held)| *held != note);
        NoteEvent::release(note, source)
    }

    fn key_down(&mut self, key: &str, modifiers: Modifiers, repeat: bool) -> Option<NoteEvent> {
        if repeat || modifiers.any() {
            return None;
        }
        let key = key.to_lowercase();
        if self.held_keys.contains_key(&key) {
            return None;
        }
        let note = self.catalog.find_by_binding(&key)?.id.clone();
        self.held_keys.insert(key, note.clone());
        Some(NoteEvent::press(note, NoteSource::Keyboard))
    }

    fn key_up(&mut self, key: &str, modifiers: Modifiers) -> Option<NoteEvent> {
        let key = key.to_lowercase();
        // A key we saw go down always comes back up, even if a modifier was
        // pressed in the meantime.
        if let Some(note) = self.held_keys.remove(&key) {
            return Some(NoteEvent::release(note, NoteSource::Keyboard));
        }
        if modifiers.any() {
            return None;
        }
        let note = self.catalog.find_by_binding(&key)?.id.clone();
        Some(NoteEvent::release(note, NoteSource::Keyboard))
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.held_keys.contains_key(&key.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::note::NoteIntent;

    fn router() -> InputRouter {
        InputRouter::new(NoteCatalog::two_row_layout())
    }

    fn key_down(key: &str) -> RawInput {
        RawInput::KeyDown {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
            repeat: false,
        }
    }

    fn key_up(key: &str) -> RawInput {
        RawInput::KeyUp {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn key_resolves_to_bound_note() {
        let mut router = router();

        let press = router.route(key_down("Z")).unwrap();
        assert_eq!(press.note.as_str(), "C3");
        assert_eq!(press.intent, NoteIntent::Press);
        assert_eq!(press.source, NoteSource::Keyboard);

        let release = router.route(key_up("z")).unwrap();
        assert_eq!(release.note.as_str(), "C3");
        assert_eq!(release.intent, NoteIntent::Release);
    }

    #[test]
    fn unbound_key_is_ignored() {
        let mut router = router();
        assert!(router.route(key_down("d")).is_none());
        assert!(router.route(key_up("d")).is_none());
    }

    #[test]
    fn repeated_key_down_is_dropped() {
        let mut router = router();
        assert!(router.route(key_down("q")).is_some());
        assert!(router.route(key_down("q")).is_none());
        assert!(router
            .route(RawInput::KeyDown {
                key: "w".to_string(),
                modifiers: Modifiers::NONE,
                repeat: true,
            })
            .is_none());
        assert!(router.is_key_held("Q"));
        assert!(!router.is_key_held("w"));
    }

    #[test]
    fn modifier_combinations_never_trigger() {
        let mut router = router();
        for modifiers in [
            Modifiers { ctrl: true, ..Modifiers::NONE },
            Modifiers { alt: true, ..Modifiers::NONE },
            Modifiers { meta: true, ..Modifiers::NONE },
        ] {
            let down = RawInput::KeyDown {
                key: "z".to_string(),
                modifiers,
                repeat: false,
            };
            assert!(router.route(down).is_none());

            let up = RawInput::KeyUp {
                key: "z".to_string(),
                modifiers,
            };
            assert!(router.route(up).is_none());
        }
    }

    #[test]
    fn held_key_releases_even_with_modifier() {
        let mut router = router();
        router.route(key_down("x"));

        let up = RawInput::KeyUp {
            key: "x".to_string(),
            modifiers: Modifiers { ctrl: true, ..Modifiers::NONE },
        };
        assert_eq!(router.route(up).map(|e| e.intent), Some(NoteIntent::Release));
    }

    #[test]
    fn pointer_leave_releases_only_when_held() {
        let mut router = router();
        let c3 = NoteId::from("C3");

        assert!(router.route(RawInput::PointerLeave(c3.clone())).is_none());

        assert!(router.route(RawInput::PointerDown(c3.clone())).is_some());
        assert!(router.route(RawInput::PointerDown(c3.clone())).is_none());

        let release = router.route(RawInput::PointerLeave(c3.clone())).unwrap();
        assert_eq!(release.intent, NoteIntent::Release);
        assert_eq!(release.source, NoteSource::Pointer);
        assert!(router.route(RawInput::PointerLeave(c3)).is_none());
    }

    #[test]
    fn touch_maps_to_press_and_release() {
        let mut router = router();
        let a4 = NoteId::from("A4");

        let press = router.route(RawInput::TouchStart(a4.clone())).unwrap();
        assert_eq!((press.intent, press.source), (NoteIntent::Press, NoteSource::Touch));

        let release = router.route(RawInput::TouchEnd(a4)).unwrap();
        assert_eq!(release.intent, NoteIntent::Release);
    }

    #[test]
    fn release_from_any_source_clears_the_hold() {
        let mut router = router();
        let c3 = NoteId::from("C3");

        assert!(router.route(RawInput::TouchStart(c3.clone())).is_some());
        assert!(router.route(RawInput::PointerUp(c3.clone())).is_some());

        let again = router.route(RawInput::TouchStart(c3.clone())).unwrap();
        assert_eq!((again.intent, again.source), (NoteIntent::Press, NoteSource::Touch));

        router.route(RawInput::PointerDown(c3.clone()));
        router.route(RawInput::TouchEnd(c3.clone()));
        assert!(router.route(RawInput::PointerLeave(c3.clone())).is_none());
        assert!(router.route(RawInput::PointerDown(c3)).is_some());
    }
}
