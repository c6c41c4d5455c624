pub mod config;
pub mod engine;
pub mod envelope;
pub mod note;
pub mod voice;
pub mod waveform;

pub use self::config::SynthConfig;
pub use self::note::{
    KeyColor, NoteCatalog, NoteDefinition, NoteEvent, NoteId, NoteIntent, NoteSource,
};
pub use self::waveform::Waveform;
