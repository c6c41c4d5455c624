use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stable identity of a note in the catalog, e.g. `"C3"` or `"C#4"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NoteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the renderer draws a key. Nothing else looks at this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyColor {
    Natural,
    Accidental,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteDefinition {
    pub id: NoteId,
    pub frequency: f32,
    /// Physical key that plays this note, matched case-insensitively.
    pub binding: String,
    pub color: KeyColor,
}

impl NoteDefinition {
    pub fn new(id: &str, frequency: f32, binding: &str, color: KeyColor) -> Self {
        Self {
            id: NoteId::new(id),
            frequency,
            binding: binding.to_string(),
            color,
        }
    }

    pub fn is_natural(&self) -> bool {
        self.color == KeyColor::Natural
    }

    fn matches_key(&self, key: &str) -> bool {
        self.binding.to_lowercase() == key.to_lowercase()
    }
}

/// Whether a note should start or stop sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteIntent {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteSource {
    Pointer,
    Touch,
    Keyboard,
}

/// A normalized press or release of one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEvent {
    pub note: NoteId,
    pub intent: NoteIntent,
    pub source: NoteSource,
}

impl NoteEvent {
    pub fn press(note: NoteId, source: NoteSource) -> Self {
        Self {
            note,
            intent: NoteIntent::Press,
            source,
        }
    }

    pub fn release(note: NoteId, source: NoteSource) -> Self {
        Self {
            note,
            intent: NoteIntent::Release,
            source,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate note id: {0}")]
    DuplicateId(NoteId),
    #[error("note {id} has invalid frequency {frequency}")]
    InvalidFrequency { id: NoteId, frequency: f32 },
}

/// Immutable, ordered set of playable notes.
///
/// Cloning is cheap; every clone shares the same definitions.
#[derive(Debug, Clone)]
pub struct NoteCatalog {
    notes: Arc<[NoteDefinition]>,
}

impl NoteCatalog {
    pub fn new(notes: Vec<NoteDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for note in &notes {
            if !(note.frequency.is_finite() && note.frequency > 0.0) {
                return Err(CatalogError::InvalidFrequency {
                    id: note.id.clone(),
                    frequency: note.frequency,
                });
            }
            if !seen.insert(note.id.as_str()) {
                return Err(CatalogError::DuplicateId(note.id.clone()));
            }
        }
        Ok(Self {
            notes: notes.into(),
        })
    }

    /// Two layers of keys: row Z (naturals) with row A (sharps) covers C3 to
    /// C4, row Q with row 1 continues from C4 up to A5.
    pub fn two_row_layout() -> Self {
        let notes = TWO_ROW_LAYOUT
            .iter()
            .map(|&(id, frequency, binding, color)| NoteDefinition::new(id, frequency, binding, color))
            .collect::<Vec<_>>();
        Self {
            notes: notes.into(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&NoteDefinition> {
        self.notes.iter().find(|note| note.id.as_str() == id)
    }

    /// First note bound to `key`, ignoring case.
    pub fn find_by_binding(&self, key: &str) -> Option<&NoteDefinition> {
        self.notes.iter().find(|note| note.matches_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteDefinition> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl Default for NoteCatalog {
    fn default() -> Self {
        Self::two_row_layout()
    }
}

use KeyColor::{Accidental as B, Natural as W};

#[rustfmt::skip]
const TWO_ROW_LAYOUT: &[(&str, f32, &str, KeyColor)] = &[
    // Lower octave: row Z + row A
    ("C3", 130.81, "z", W),
    ("C#3", 138.59, "a", B),
    ("D3", 146.83, "x", W),
    ("D#3", 155.56, "s", B),
    ("E3", 164.81, "c", W),
    ("F3", 174.61, "v", W),
    ("F#3", 185.00, "f", B), // d has no E#
    ("G3", 196.00, "b", W),
    ("G#3", 207.65, "g", B),
    ("A3", 220.00, "n", W),
    ("A#3", 233.08, "h", B),
    ("B3", 246.94, "m", W),
    ("C4-L", 261.63, ",", W),
    // Upper octave: row Q + row 1, overlapping C4
    ("C4", 261.63, "q", W),
    ("C#4", 277.18, "1", B),
    ("D4", 293.66, "w", W),
    ("D#4", 311.13, "2", B),
    ("E4", 329.63, "e", W),
    ("F4", 349.23, "r", W),
    ("F#4", 369.99, "4", B),
    ("G4", 392.00, "t", W),
    ("G#4", 415.30, "5", B),
    ("A4", 440.00, "y", W),
    ("A#4", 466.16, "6", B),
    ("B4", 493.88, "u", W),
    // High octave, continuing row Q + row 1
    ("C5", 523.25, "i", W),
    ("C#5", 554.37, "8", B),
    ("D5", 587.33, "o", W),
    ("D#5", 622.25, "9", B),
    ("E5", 659.25, "p", W),
    ("F5", 698.46, "[", W),
    ("F#5", 739.99, "-", B),
    ("G5", 783.99, "]", W),
    ("G#5", 830.61, "=", B),
    ("A5", 880.00, "\\", W),
];
