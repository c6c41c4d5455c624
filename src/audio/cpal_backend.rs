use super::{AudioEngine, EngineError, VoiceHandle};
use crate::synth::config::SynthConfig;
use crate::synth::engine::{EngineCommand, SynthEngine, MAX_BLOCK_FRAMES};
use crate::synth::voice::VoiceId;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{error, info};

/// [`AudioEngine`] that renders a [`SynthEngine`] on the default cpal output
/// device.
pub struct CpalEngine {
    stream: Option<Stream>,
    commands: Sender<EngineCommand>,
    next_id: VoiceId,
    live_voices: Arc<AtomicUsize>,
    max_voices: usize,
}

impl CpalEngine {
    /// Opens the default output device and starts the stream.
    pub fn new(config: &SynthConfig) -> Result<Self, EngineError> {
        let synth_engine = SynthEngine::new(config.clone());
        let commands = synth_engine.get_command_sender();
        let stream = build_stream(synth_engine)?;
        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        Ok(Self {
            stream: Some(stream),
            commands,
            next_id: 0,
            live_voices: Arc::new(AtomicUsize::new(0)),
            max_voices: config.max_voices.max(1),
        })
    }

    /// Voices started and not yet freed, including ones still releasing.
    pub fn live_voices(&self) -> usize {
        self.live_voices.load(Ordering::Acquire)
    }
}

fn build_stream(mut synth_engine: SynthEngine) -> Result<Stream, EngineError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(EngineError::NoDevice)?;
    info!(device = %device.name().unwrap_or_default(), "selected output device");

    let config = device
        .default_output_config()
        .map_err(|e| EngineError::Stream(e.to_string()))?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    info!(sample_rate, channels, "audio config");

    let mut mono = vec![0.0; MAX_BLOCK_FRAMES];
    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render_interleaved(&mut synth_engine, &mut mono, data, channels, sample_rate);
            },
            |err| error!(%err, "output stream error"),
            None,
        ),
        other => return Err(EngineError::UnsupportedFormat(format!("{other:?}"))),
    };

    stream.map_err(|e| EngineError::Stream(e.to_string()))
}

/// Renders into an interleaved buffer at most `mono.len()` frames at a time,
/// copying each sample to every channel.
fn render_interleaved(
    synth_engine: &mut SynthEngine,
    mono: &mut [f32],
    data: &mut [f32],
    channels: usize,
    sample_rate: f32,
) {
    for block in data.chunks_mut(mono.len() * channels) {
        let frames = &mut mono[..block.len() / channels];
        synth_engine.process(frames, sample_rate);

        for (frame, sample) in block.chunks_mut(channels).zip(frames.iter()) {
            frame.fill(*sample);
        }
    }
}

impl AudioEngine for CpalEngine {
    type Voice = CpalVoice;

    fn resume(&mut self) -> Result<(), EngineError> {
        let stream = self.stream.as_ref().ok_or(EngineError::ShutDown)?;
        stream.play().map_err(|e| EngineError::Stream(e.to_string()))
    }

    fn start_voice(&mut self, frequency: f32) -> Result<CpalVoice, EngineError> {
        if self.stream.is_none() {
            return Err(EngineError::ShutDown);
        }
        if self.live_voices() >= self.max_voices {
            return Err(EngineError::VoiceLimit(self.max_voices));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.commands
            .send(EngineCommand::Start { id, frequency })
            .map_err(|_| EngineError::Disconnected)?;
        self.live_voices.fetch_add(1, Ordering::AcqRel);

        Ok(CpalVoice {
            id,
            commands: self.commands.clone(),
            live_voices: Arc::clone(&self.live_voices),
        })
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::SetVolume(volume))
            .map_err(|_| EngineError::Disconnected)
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        match self.stream.take() {
            Some(stream) => stream
                .pause()
                .map_err(|e| EngineError::Stream(e.to_string())),
            None => Ok(()),
        }
    }
}

/// Handle to one voice rendered by a [`CpalEngine`].
#[derive(Debug)]
pub struct CpalVoice {
    id: VoiceId,
    commands: Sender<EngineCommand>,
    live_voices: Arc<AtomicUsize>,
}

impl CpalVoice {
    pub fn id(&self) -> VoiceId {
        self.id
    }
}

impl VoiceHandle for CpalVoice {
    fn release(&self) -> Result<(), EngineError> {
        self.commands
            .send(EngineCommand::Release(self.id))
            .map_err(|_| EngineError::Disconnected)
    }

    fn disconnect_and_free(self) -> Result<(), EngineError> {
        self.live_voices.fetch_sub(1, Ordering::AcqRel);
        self.commands
            .send(EngineCommand::Free(self.id))
            .map_err(|_| EngineError::Disconnected)
    }
}
