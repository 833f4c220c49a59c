//! Deterministic synthetic strumming examples.
//!
//! Each strum becomes an exponentially decaying tone burst in the audio and a
//! short velocity pulse in the motion trace (positive for upstrokes, negative
//! for downstrokes). The generated triple can be written to disk in the same
//! layout as a real dataset, which lets tests and demos exercise the full
//! evaluation path without recorded data.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::StrumDirection;
use crate::dataset::{ExampleFiles, MotionSignal, StrumLabel, Waveform};
use crate::error::DatasetError;

const CHORDS: [&str; 4] = ["C", "G", "Am", "F"];

/// Declarative description of a synthetic example
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub sample_rate: u32,
    pub duration_secs: f64,
    pub motion_rate_hz: f64,
    pub tone_hz: f64,
    /// Time constant of the burst envelope in seconds
    pub decay_secs: f64,
    /// Width (standard deviation) of the motion velocity pulse in seconds
    pub pulse_width_secs: f64,
    /// Amplitude of uniform background noise (0 disables it)
    pub noise_amplitude: f32,
    pub seed: u64,
    pub strums: Vec<(f64, StrumDirection)>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            duration_secs: 3.0,
            motion_rate_hz: 100.0,
            tone_hz: 440.0,
            decay_secs: 0.04,
            pulse_width_secs: 0.05,
            noise_amplitude: 0.0,
            seed: 0x5A5A_FFF0,
            strums: alternating_strums(5, 0.5, 0.5),
        }
    }
}

/// `count` strums every `interval` seconds from `first`, starting with a downstroke
pub fn alternating_strums(count: usize, first: f64, interval: f64) -> Vec<(f64, StrumDirection)> {
    (0..count)
        .map(|i| {
            let direction = if i % 2 == 0 {
                StrumDirection::Down
            } else {
                StrumDirection::Up
            };
            (first + i as f64 * interval, direction)
        })
        .collect()
}

/// Generated audio, motion and labels
#[derive(Debug, Clone)]
pub struct SyntheticExample {
    pub waveform: Waveform,
    pub motion: MotionSignal,
    pub labels: Vec<StrumLabel>,
}

impl SyntheticSpec {
    pub fn with_strums(mut self, strums: Vec<(f64, StrumDirection)>) -> Self {
        self.strums = strums;
        self
    }

    /// Tone bursts at every strum time plus optional noise
    pub fn audio(&self) -> Waveform {
        let total = (self.duration_secs * self.sample_rate as f64).round() as usize;
        let mut samples = vec![0.0f32; total];
        let burst_len = (10.0 * self.decay_secs * self.sample_rate as f64) as usize;

        for &(onset, _) in &self.strums {
            let start = (onset * self.sample_rate as f64).round() as usize;
            for (offset, sample) in samples.iter_mut().skip(start).take(burst_len).enumerate() {
                let t = offset as f64 / self.sample_rate as f64;
                let value = 0.8 * (-t / self.decay_secs).exp() * (2.0 * PI * self.tone_hz * t).sin();
                *sample += value as f32;
            }
        }

        if self.noise_amplitude > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed);
            for sample in samples.iter_mut() {
                *sample += rng.gen_range(-self.noise_amplitude..self.noise_amplitude);
            }
        }

        Waveform {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Hand position: the integral of one velocity pulse per strum
    pub fn motion(&self) -> MotionSignal {
        let count = (self.duration_secs * self.motion_rate_hz).round() as usize;
        let dt = 1.0 / self.motion_rate_hz;
        let two_sigma_sq = 2.0 * self.pulse_width_secs * self.pulse_width_secs;

        let timestamps: Vec<f64> = (0..count).map(|i| i as f64 * dt).collect();
        let mut position = 0.0;
        let values = timestamps
            .iter()
            .map(|&t| {
                let velocity: f64 = self
                    .strums
                    .iter()
                    .map(|&(onset, direction)| {
                        let sign = match direction {
                            StrumDirection::Up => 1.0,
                            StrumDirection::Down => -1.0,
                        };
                        sign * (-(t - onset).powi(2) / two_sigma_sq).exp()
                    })
                    .sum();
                position += velocity * dt;
                position
            })
            .collect();

        MotionSignal { timestamps, values }
    }

    pub fn labels(&self) -> Vec<StrumLabel> {
        self.strums
            .iter()
            .enumerate()
            .map(|(i, &(time, direction))| StrumLabel {
                time,
                code: direction.code().to_string(),
                chord: Some(CHORDS[(i / 2) % CHORDS.len()].to_string()),
            })
            .collect()
    }

    pub fn build(&self) -> SyntheticExample {
        SyntheticExample {
            waveform: self.audio(),
            motion: self.motion(),
            labels: self.labels(),
        }
    }
}

impl SyntheticExample {
    /// Write the example as `<id>_line.wav`, `<id>.csv` and `<id>.strums` in `dir`
    pub fn write_to(&self, dir: &Path, id: &str) -> Result<ExampleFiles, DatasetError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DatasetError::Io { path, source }
        };

        fs::create_dir_all(dir).map_err(io_err(dir))?;
        let files = ExampleFiles::resolve(dir, id);

        write_wav(&files.audio, &self.waveform)?;

        let motion: String = self
            .motion
            .timestamps
            .iter()
            .zip(&self.motion.values)
            .map(|(t, v)| format!("{t},{v}\n"))
            .collect();
        fs::write(&files.motion, motion).map_err(io_err(&files.motion))?;

        let labels: String = self
            .labels
            .iter()
            .map(|label| {
                format!(
                    "{}\t{}\t{}\n",
                    label.time,
                    label.code,
                    label.chord.as_deref().unwrap_or_default()
                )
            })
            .collect();
        fs::write(&files.labels, labels).map_err(io_err(&files.labels))?;

        tracing::debug!("[Synthetic] Wrote example {} to {}", id, dir.display());
        Ok(files)
    }
}

/// Write mono 32-bit float WAV
pub fn write_wav(path: &Path, waveform: &Waveform) -> Result<(), DatasetError> {
    let encode_err = |source| DatasetError::AudioDecode {
        path: path.to_path_buf(),
        source,
    };
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(encode_err)?;
    for &sample in &waveform.samples {
        writer.write_sample(sample).map_err(encode_err)?;
    }
    writer.finalize().map_err(encode_err)
}
