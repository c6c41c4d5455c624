use super::config::SynthConfig;
use super::envelope::EnvelopeGenerator;
use super::waveform::Oscillator;

/// Engine-side identity of a rendered voice.
pub type VoiceId = u64;

/// One sounding oscillator with its amplitude envelope.
pub struct SynthVoice {
    pub id: VoiceId,
    pub frequency: f32,
    oscillator: Oscillator,
    envelope: EnvelopeGenerator,
}

impl SynthVoice {
    /// Creates a voice and starts its attack immediately.
    pub fn new(id: VoiceId, frequency: f32, config: &SynthConfig) -> Self {
        let mut envelope = EnvelopeGenerator::new(config);
        envelope.trigger();
        Self {
            id,
            frequency,
            oscillator: Oscillator::new(config.waveform),
            envelope,
        }
    }

    pub fn release(&mut self) {
        self.envelope.release();
    }

    /// True once the release ramp has decayed to silence.
    pub fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }

    /// Adds this voice's output to `output`.
    pub fn process(&mut self, output: &mut [f32], scratch: &mut Vec<f32>, sample_rate: f32) {
        if self.is_finished() {
            return;
        }

        scratch.clear();
        scratch.extend((0..output.len()).map(|_| self.oscillator.next_sample(self.frequency, sample_rate)));
        self.envelope.apply(scratch, sample_rate);

        for (out, sample) in output.iter_mut().zip(scratch.iter()) {
            *out += *sample;
        }
    }
}
