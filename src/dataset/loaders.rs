//! Loaders for the three files of a dataset example.
//!
//! - audio: PCM/float WAV, downmixed to mono and optionally resampled
//! - motion: headerless `time,value` CSV
//! - labels: headerless tab-separated `time<TAB>code<TAB>chord`

use std::fs;
use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::StrumDirection;
use crate::error::DatasetError;

const SINC_LEN: usize = 256;

/// Mono audio samples with their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Resample to `target_rate` with a band-limited sinc filter
    pub fn resampled(self, target_rate: u32) -> Result<Self, ResampleFailure> {
        if target_rate == 0 || target_rate == self.sample_rate || self.samples.is_empty() {
            return Ok(self);
        }
        Ok(Self {
            samples: resample_sinc(&self.samples, self.sample_rate, target_rate)?,
            sample_rate: target_rate,
        })
    }
}

/// Motion sensor trace: parallel timestamp (seconds) and value sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionSignal {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl MotionSignal {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scale values so the largest magnitude is 1.0
    ///
    /// Returns `None` when every value is zero (or the signal is empty).
    pub fn normalized(mut self) -> Option<Self> {
        let peak = self.values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if peak == 0.0 {
            return None;
        }
        self.values.iter_mut().for_each(|v| *v /= peak);
        Some(self)
    }
}

/// One annotated strum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrumLabel {
    pub time: f64,
    pub code: String,
    pub chord: Option<String>,
}

impl StrumLabel {
    /// Direction for `U`/`D` codes; other codes are not strums
    pub fn direction(&self) -> Option<StrumDirection> {
        StrumDirection::from_code(&self.code)
    }
}

/// Sorted reference times of all labels with the given direction
pub fn reference_times(labels: &[StrumLabel], direction: StrumDirection) -> Vec<f64> {
    let mut times: Vec<f64> = labels
        .iter()
        .filter(|label| label.direction() == Some(direction))
        .map(|label| label.time)
        .collect();
    times.sort_by(f64::total_cmp);
    times
}

/// Resampler setup or processing failure
#[derive(Debug, Error)]
pub enum ResampleFailure {
    #[error(transparent)]
    Construction(#[from] rubato::ResamplerConstructionError),
    #[error(transparent)]
    Process(#[from] rubato::ResampleError),
}

/// Band-limited resampling of a mono signal
///
/// The whole signal is processed as one zero-padded chunk. The filter delay is
/// trimmed so output sample `i` lines up with time `i / to_rate`, and the
/// result has `round(len * to_rate / from_rate)` samples.
pub fn resample_sinc(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, ResampleFailure> {
    if samples.is_empty() || from_rate == 0 || to_rate == 0 || from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Room for the filter delay plus the tail of the last samples
    let tail = ((2 * SINC_LEN) as f64 / ratio.min(1.0)).ceil() as usize;
    let chunk_size = samples.len() + tail;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, chunk_size, 1)?;

    let mut padded = samples.to_vec();
    padded.resize(chunk_size, 0.0);
    let input = vec![padded];
    let output = resampler.process(&input, None)?;

    let delay = resampler.output_delay();
    let expected = ((samples.len() as f64) * ratio).round().max(1.0) as usize;
    let mut resampled: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected)
        .collect();
    resampled.resize(expected, 0.0);

    tracing::debug!(
        "[Loaders] Resampled {} samples @ {} Hz to {} samples @ {} Hz",
        samples.len(),
        from_rate,
        resampled.len(),
        to_rate
    );

    Ok(resampled)
}

/// Decode a WAV file into mono f32 samples in [-1, 1]
pub fn read_wav(path: &Path) -> Result<Waveform, DatasetError> {
    let decode_err = |source| DatasetError::AudioDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DatasetError::UnsupportedAudio {
            path: path.to_path_buf(),
            reason: "zero channels".to_string(),
        });
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ 1..=32 => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(decode_err)?
            }
            bits => {
                return Err(DatasetError::UnsupportedAudio {
                    path: path.to_path_buf(),
                    reason: format!("unsupported bits_per_sample={}", bits),
                })
            }
        },
    };

    let channels = spec.channels as usize;
    let samples = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Waveform {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Decode a WAV file and optionally resample it
pub fn load_waveform(path: &Path, target_rate: Option<u32>) -> Result<Waveform, DatasetError> {
    let waveform = read_wav(path)?;
    if waveform.samples.is_empty() {
        return Err(DatasetError::UnsupportedAudio {
            path: path.to_path_buf(),
            reason: "no samples".to_string(),
        });
    }
    match target_rate {
        Some(rate) => waveform
            .resampled(rate)
            .map_err(|err| DatasetError::UnsupportedAudio {
                path: path.to_path_buf(),
                reason: format!("resampling to {} Hz failed: {}", rate, err),
            }),
        None => Ok(waveform),
    }
}

fn read_text(path: &Path) -> Result<String, DatasetError> {
    fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number(path: &Path, line: usize, field: &str, what: &str) -> Result<f64, DatasetError> {
    field.trim().parse::<f64>().map_err(|_| DatasetError::Parse {
        path: path.to_path_buf(),
        line,
        reason: format!("invalid {} '{}'", what, field.trim()),
    })
}

/// Parse a motion CSV (`time,value` per line, no header)
pub fn parse_motion_csv(path: &Path, contents: &str) -> Result<MotionSignal, DatasetError> {
    let mut signal = MotionSignal::default();

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            return Err(DatasetError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("expected 2 columns, found {}", fields.len()),
            });
        }

        signal
            .timestamps
            .push(parse_number(path, line_no, fields[0], "time")?);
        signal
            .values
            .push(parse_number(path, line_no, fields[1], "value")?);
    }

    Ok(signal)
}

/// Read a motion CSV file without normalizing it
pub fn read_motion_csv(path: &Path) -> Result<MotionSignal, DatasetError> {
    parse_motion_csv(path, &read_text(path)?)
}

/// Read a motion CSV file and normalize it to a peak magnitude of 1.0
pub fn load_motion(path: &Path) -> Result<MotionSignal, DatasetError> {
    read_motion_csv(path)?
        .normalized()
        .ok_or_else(|| DatasetError::DegenerateMotion {
            path: path.to_path_buf(),
        })
}

/// Parse a strum label file (`time<TAB>code<TAB>chord` per line, no header)
pub fn parse_strum_labels(path: &Path, contents: &str) -> Result<Vec<StrumLabel>, DatasetError> {
    let mut labels = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let time = parse_number(path, line_no, fields.next().unwrap_or_default(), "time")?;
        let code = fields
            .next()
            .map(str::trim)
            .ok_or_else(|| DatasetError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                reason: "missing strum code column".to_string(),
            })?
            .to_string();
        let chord = fields
            .next()
            .map(str::trim)
            .filter(|chord| !chord.is_empty())
            .map(str::to_string);

        labels.push(StrumLabel { time, code, chord });
    }

    Ok(labels)
}

/// Read a strum label file
pub fn read_strum_labels(path: &Path) -> Result<Vec<StrumLabel>, DatasetError> {
    parse_strum_labels(path, &read_text(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("take.csv")
    }

    #[test]
    fn test_parse_motion_csv() {
        let signal = parse_motion_csv(&path(), "0.0,1.5\n0.01, -3.0\n\n0.02,0.75\n").unwrap();
        assert_eq!(signal.timestamps, vec![0.0, 0.01, 0.02]);
        assert_eq!(signal.values, vec![1.5, -3.0, 0.75]);
    }

    #[test]
    fn test_parse_motion_csv_rejects_extra_columns() {
        let err = parse_motion_csv(&path(), "0.0,1.0\n0.1,2.0,3.0\n").unwrap_err();
        match err {
            DatasetError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_motion_csv_rejects_header() {
        let err = parse_motion_csv(&path(), "time,value\n0.0,1.0\n").unwrap_err();
        assert!(err.to_string().contains("invalid time 'time'"));
    }

    #[test]
    fn test_normalize_divides_by_peak_magnitude() {
        let signal = MotionSignal {
            timestamps: vec![0.0, 0.1, 0.2],
            values: vec![1.0, -4.0, 2.0],
        };
        let normalized = signal.normalized().unwrap();
        assert_eq!(normalized.values, vec![0.25, -1.0, 0.5]);
    }

    #[test]
    fn test_normalize_all_zero_is_degenerate() {
        let signal = MotionSignal {
            timestamps: vec![0.0, 0.1],
            values: vec![0.0, 0.0],
        };
        assert!(signal.normalized().is_none());
    }

    #[test]
    fn test_parse_strum_labels() {
        let contents = "0.52\tD\tC\n1.01\tU\tC\n1.50\tX\tG\n2.0\tD\n";
        let labels = parse_strum_labels(&path(), contents).unwrap();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels[0].direction(), Some(StrumDirection::Down));
        assert_eq!(labels[1].direction(), Some(StrumDirection::Up));
        assert_eq!(labels[2].direction(), None);
        assert_eq!(labels[2].chord.as_deref(), Some("G"));
        assert_eq!(labels[3].chord, None);
    }

    #[test]
    fn test_parse_strum_labels_requires_code() {
        let err = parse_strum_labels(&path(), "0.5\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_reference_times_are_sorted_per_direction() {
        let labels = parse_strum_labels(&path(), "2.0\tD\tC\n0.5\tD\tC\n1.0\tU\tC\n").unwrap();
        assert_eq!(reference_times(&labels, StrumDirection::Down), vec![0.5, 2.0]);
        assert_eq!(reference_times(&labels, StrumDirection::Up), vec![1.0]);
    }

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let len = (sample_rate as f32 * seconds) as usize;
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_resample_output_length() {
        let out = resample_sinc(&vec![0.0; 44_100], 44_100, 22_050).unwrap();
        assert_eq!(out.len(), 22_050);
        let out = resample_sinc(&vec![0.0; 48_000], 48_000, 22_050).unwrap();
        assert_eq!(out.len(), 22_050);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = sine(440.0, 22_050, 0.1);
        assert_eq!(resample_sinc(&samples, 22_050, 22_050).unwrap(), samples);
    }

    #[test]
    fn test_resample_keeps_passband_tone() {
        let out = resample_sinc(&sine(1_000.0, 44_100, 1.0), 44_100, 22_050).unwrap();
        let body = &out[2_000..20_000];
        assert!((rms(body) - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.02, "rms {}", rms(body));
    }

    #[test]
    fn test_resample_removes_tone_above_target_nyquist() {
        // 15 kHz would alias to about 7 kHz without the low-pass filter
        let out = resample_sinc(&sine(15_000.0, 44_100, 1.0), 44_100, 22_050).unwrap();
        let body = &out[2_000..20_000];
        assert!(rms(body) < 0.01, "rms {}", rms(body));
    }

    #[test]
    fn test_resample_preserves_timing() {
        let mut samples = vec![0.0f32; 48_000];
        samples[24_000] = 1.0;
        let out = resample_sinc(&samples, 48_000, 22_050).unwrap();
        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - 11_025).abs() <= 2, "peak at {peak}");
    }

    #[test]
    fn test_read_wav_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let wav_path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&wav_path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(i16::MIN).unwrap();
            writer.write_sample(16_384i16).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = read_wav(&wav_path).unwrap();
        assert_eq!(waveform.sample_rate, 8_000);
        // (-1.0 + 0.5) / 2
        assert_eq!(waveform.samples, vec![-0.25; 4]);
    }

    #[test]
    fn test_load_waveform_resamples_to_analysis_rate() {
        let dir = tempfile::tempdir().unwrap();
        let wav_path = dir.path().join("take_line.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&wav_path, spec).unwrap();
        for sample in sine(15_000.0, 44_100, 0.5) {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = load_waveform(&wav_path, Some(22_050)).unwrap();

        assert_eq!(waveform.sample_rate, 22_050);
        assert_eq!(waveform.samples.len(), 11_025);
        assert!(rms(&waveform.samples[1_000..10_000]) < 0.01);
    }

    #[test]
    fn test_read_wav_missing_file() {
        let err = read_wav(Path::new("/nonexistent/take_line.wav")).unwrap_err();
        assert!(matches!(err, DatasetError::AudioDecode { .. }));
    }
}
