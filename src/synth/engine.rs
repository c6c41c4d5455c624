use super::config::SynthConfig;
use super::voice::{SynthVoice, VoiceId};
use std::sync::mpsc::{Receiver, Sender};

/// Most frames rendered by one [`SynthEngine::process`] call without
/// allocating.
pub const MAX_BLOCK_FRAMES: usize = 1024;

/// Requests sent from voice handles to the audio thread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineCommand {
    Start { id: VoiceId, frequency: f32 },
    /// Begin the release ramp.
    Release(VoiceId),
    /// Drop the voice; it is never rendered again.
    Free(VoiceId),
    SetVolume(f32),
}

/// Renders every live voice into the output buffer. Lives on the audio thread.
pub struct SynthEngine {
    pub voices: Vec<SynthVoice>,
    pub config: SynthConfig,
    command_receiver: Receiver<EngineCommand>,
    command_sender: Sender<EngineCommand>,
    master_volume: f32,
    current_gain: f32,
    scratch: Vec<f32>,
}

impl SynthEngine {
    pub fn new(config: SynthConfig) -> Self {
        let (command_sender, command_receiver) = std::sync::mpsc::channel();
        let master_volume = config.master_volume.clamp(0.0, 1.0);
        Self {
            voices: Vec::with_capacity(config.max_voices),
            config,
            command_receiver,
            command_sender,
            master_volume,
            current_gain: master_volume,
            scratch: Vec::with_capacity(MAX_BLOCK_FRAMES),
        }
    }

    /// Get a sender for commands that can be used from the control thread
    pub fn get_command_sender(&self) -> Sender<EngineCommand> {
        self.command_sender.clone()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Process audio for the current buffer
    pub fn process(&mut self, output: &mut [f32], sample_rate: f32) {
        self.process_commands();

        output.fill(0.0);
        for voice in self.voices.iter_mut() {
            voice.process(output, &mut self.scratch, sample_rate);
        }

        self.apply_gain(output);
        apply_limiter(output);
    }

    fn process_commands(&mut self) {
        while let Ok(command) = self.command_receiver.try_recv() {
            match command {
                EngineCommand::Start { id, frequency } => {
                    self.voices.push(SynthVoice::new(id, frequency, &self.config));
                }
                EngineCommand::Release(id) => {
                    if let Some(voice) = self.voices.iter_mut().find(|v| v.id == id) {
                        voice.release();
                    }
                }
                EngineCommand::Free(id) => {
                    self.voices.retain(|v| v.id != id);
                }
                EngineCommand::SetVolume(volume) => {
                    self.master_volume = volume.clamp(0.0, 1.0);
                }
            }
        }
    }

    /// Ramp from the previous gain to the master volume across the buffer so
    /// volume changes do not click.
    fn apply_gain(&mut self, output: &mut [f32]) {
        let target = self.master_volume;
        let len = output.len().max(1) as f32;
        for (i, sample) in output.iter_mut().enumerate() {
            let t = i as f32 / len;
            *sample *= self.current_gain + (target - self.current_gain) * t;
        }
        self.current_gain = target;
    }
}

/// Soft knee limiter to prevent clipping
fn apply_limiter(output: &mut [f32]) {
    for sample in output.iter_mut() {
        if sample.abs() > 0.9 {
            let excess = (sample.abs() - 0.9) / 0.1;
            let scale = 1.0 - excess * 0.1;
            *sample *= scale.max(0.0);
        }
    }
}
