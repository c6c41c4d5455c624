//! A playable on-screen and computer-keyboard piano.
//!
//! Input from the mouse, touch screens and the physical keyboard is normalized
//! by [`input::InputRouter`] into press/release events, which
//! [`instrument::VoiceManager`] turns into at most one sounding voice per note
//! on an [`audio::AudioEngine`].

pub mod audio;
pub mod input;
pub mod instrument;
pub mod synth;
pub mod ui;
