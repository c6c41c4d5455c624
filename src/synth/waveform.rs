use rand::Rng;
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
}

impl Waveform {
    /// Value of the waveform at `phase`, where one cycle spans `0.0..1.0`.
    fn sample_at(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Noise => rand::thread_rng().gen_range(-1.0..1.0),
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
            Waveform::Noise => "noise",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown waveform '{0}' (expected sine, square, sawtooth, triangle or noise)")]
pub struct WaveformParseError(String);

impl FromStr for Waveform {
    type Err = WaveformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Sawtooth),
            "triangle" => Ok(Waveform::Triangle),
            "noise" => Ok(Waveform::Noise),
            _ => Err(WaveformParseError(s.to_string())),
        }
    }
}

/// Phase-accumulating oscillator for a single voice.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let sample = self.waveform.sample_at(self.phase);
        self.phase = (self.phase + frequency / sample_rate).fract();
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("Triangle".parse::<Waveform>(), Ok(Waveform::Triangle));
        assert_eq!("saw".parse::<Waveform>(), Ok(Waveform::Sawtooth));
        assert!("pulse".parse::<Waveform>().is_err());
    }

    #[test]
    fn triangle_stays_in_range() {
        let mut osc = Oscillator::new(Waveform::Triangle);
        let samples: Vec<f32> = (0..1000).map(|_| osc.next_sample(440.0, 44100.0)).collect();

        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(samples[0], -1.0);
        assert!(samples.iter().any(|s| *s > 0.9));
    }
}
