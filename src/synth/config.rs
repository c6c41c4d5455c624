use super::waveform::Waveform;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct SynthConfig {
    /// Voices the engine may hold at once, counting ones still releasing.
    pub max_voices: usize,
    pub waveform: Waveform,
    pub master_volume: f32,
    pub attack: Duration,
    pub decay: Duration,
    pub peak_level: f32,
    pub sustain_level: f32,
    /// Length of the release ramp the engine plays after a note is let go.
    pub release: Duration,
    /// Extra time after the release ramp before the voice is freed.
    pub cleanup_margin: Duration,
}

impl SynthConfig {
    /// Delay between releasing a note and freeing its engine voice.
    pub fn cleanup_delay(&self) -> Duration {
        self.release + self.cleanup_margin
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            max_voices: 32,
            waveform: Waveform::Triangle,
            master_volume: 0.65,
            attack: Duration::from_millis(20),
            decay: Duration::from_millis(180),
            peak_level: 0.6,
            sustain_level: 0.4,
            release: Duration::from_millis(200),
            cleanup_margin: Duration::from_millis(50),
        }
    }
}
