use crate::synth::note::NoteId;
use std::collections::BTreeSet;

/// Notes the renderer should draw as held down.
///
/// Only ever built from the voice map, never edited on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveKeys(BTreeSet<NoteId>);

impl ActiveKeys {
    pub(crate) fn from_notes<'a>(notes: impl IntoIterator<Item = &'a NoteId>) -> Self {
        Self(notes.into_iter().cloned().collect())
    }

    pub fn contains(&self, note: &str) -> bool {
        self.0.contains(note)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
