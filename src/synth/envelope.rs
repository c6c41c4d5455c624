use super::config::SynthConfig;

/// Attack/decay/sustain envelope with an exponential release.
#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    pub attack: f32,
    pub decay: f32,
    pub peak: f32,
    pub sustain: f32,
    pub release: f32,
    pub value: f32,
    state: EnvelopeState,
    release_start_value: f32,
    min_threshold: f32,
}

#[derive(PartialEq, Debug, Copy, Clone)]
enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

impl EnvelopeGenerator {
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            attack: config.attack.as_secs_f32(),
            decay: config.decay.as_secs_f32(),
            peak: config.peak_level,
            sustain: config.sustain_level,
            release: config.release.as_secs_f32(),
            value: 0.0,
            state: EnvelopeState::Idle,
            release_start_value: 0.0,
            min_threshold: 0.001,
        }
    }

    pub fn trigger(&mut self) {
        self.value = 0.0;
        self.state = EnvelopeState::Attack;
    }

    pub fn release(&mut self) {
        if self.state != EnvelopeState::Idle && self.state != EnvelopeState::Release {
            self.state = EnvelopeState::Release;
            self.release_start_value = self.value;
        }
    }

    pub fn is_releasing(&self) -> bool {
        self.state == EnvelopeState::Release
    }

    pub fn is_finished(&self) -> bool {
        self.state == EnvelopeState::Idle && self.value == 0.0
    }

    pub fn apply(&mut self, output: &mut [f32], sample_rate: f32) {
        let attack_step = self.peak / (self.attack * sample_rate).max(1.0);
        let decay_step = (self.peak - self.sustain) / (self.decay * sample_rate).max(1.0);
        // Per-sample factor that takes the release from its start value down
        // to the threshold in `release` seconds.
        let release_factor = if self.release_start_value > self.min_threshold {
            (self.min_threshold / self.release_start_value)
                .powf(1.0 / (self.release * sample_rate).max(1.0))
        } else {
            0.0
        };

        for sample in output.iter_mut() {
            self.value = match self.state {
                EnvelopeState::Idle => 0.0,
                EnvelopeState::Attack => {
                    let next = self.value + attack_step;
                    if next >= self.peak {
                        self.state = EnvelopeState::Decay;
                        self.peak
                    } else {
                        next
                    }
                }
                EnvelopeState::Decay => {
                    let next = self.value - decay_step;
                    if next <= self.sustain {
                        self.state = EnvelopeState::Sustain;
                        self.sustain
                    } else {
                        next
                    }
                }
                EnvelopeState::Sustain => self.value,
                EnvelopeState::Release => {
                    let next = self.value * release_factor;
                    if next <= self.min_threshold {
                        self.state = EnvelopeState::Idle;
                        0.0
                    } else {
                        next
                    }
                }
            };

            *sample *= self.value;
        }
    }
}
