mod cpal_backend;

pub use self::cpal_backend::{CpalEngine, CpalVoice};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("audio stream error: {0}")]
    Stream(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("all {0} voices are in use")]
    VoiceLimit(usize),
    #[error("audio thread is gone")]
    Disconnected,
    #[error("audio engine has been shut down")]
    ShutDown,
}

/// The sound-producing side of the instrument.
///
/// Construction is the implementor's concern; every other operation may fail
/// and callers must treat it that way.
pub trait AudioEngine {
    type Voice: VoiceHandle;

    /// Makes sure audio is flowing. Safe to call while already running.
    fn resume(&mut self) -> Result<(), EngineError>;

    /// Starts a new voice sounding at `frequency` Hz.
    fn start_voice(&mut self, frequency: f32) -> Result<Self::Voice, EngineError>;

    fn set_volume(&mut self, _volume: f32) -> Result<(), EngineError> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// One sounding voice on an [`AudioEngine`].
pub trait VoiceHandle {
    /// Begins the release ramp. Returns without waiting for it to finish.
    fn release(&self) -> Result<(), EngineError>;

    /// Disconnects the voice and frees its engine resources. Consumes the
    /// handle, so this can only happen once.
    fn disconnect_and_free(self) -> Result<(), EngineError>;
}
