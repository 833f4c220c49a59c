// OnsetDetector - spectral flux-based onset detection
//
// This module implements offline onset detection over a complete waveform.
//
// Algorithm:
// 1. Centered STFT (Hann window, n_fft = 2048, hop = 512) → power spectrum
// 2. Fold into 128 mel bands and convert to dB (clipped 80 dB below the max)
// 3. Spectral flux: flux_t = mean_b max(0, S_t[b] - S_(t-lag)[b])
// 4. Left-pad the flux by lag + n_fft / (2 * hop) frames so frame t lines up
//    with time t * hop / sr
// 5. Normalize to [0, 1] and pick local maxima above a moving average + delta
// 6. Drop candidates within min_onset_gap of the previous raw candidate

use crate::analysis::spectrogram::{power_to_db, MelFilterbank, Stft};
use crate::config::OnsetDetectionConfig;

/// Peak-picking window sizes in frames
///
/// Frame `n` is a peak if it is the maximum of `x[n - pre_max .. n + post_max)`,
/// at least `delta` above the mean of `x[n - pre_avg .. n + post_avg)` and
/// more than `wait` frames after the previous peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPickParams {
    pub pre_max: usize,
    pub post_max: usize,
    pub pre_avg: usize,
    pub post_avg: usize,
    pub delta: f32,
    pub wait: usize,
}

impl PeakPickParams {
    /// Derive window sizes from the frame rate (30 ms max window, 100 ms
    /// average window, 30 ms refractory period)
    pub fn for_frame_rate(sample_rate: u32, hop_size: usize, delta: f32) -> Self {
        let frames_in = |seconds: f64| (seconds * sample_rate as f64 / hop_size as f64).floor() as usize;
        let pre_avg = frames_in(0.10);
        Self {
            pre_max: frames_in(0.03),
            post_max: 1,
            pre_avg,
            post_avg: pre_avg + 1,
            delta,
            wait: frames_in(0.03),
        }
    }
}

/// OnsetDetector turns a waveform into a pruned list of onset times (seconds)
pub struct OnsetDetector {
    sample_rate: u32,
    config: OnsetDetectionConfig,
    stft: Stft,
    mel: MelFilterbank,
}

impl OnsetDetector {
    /// Create a new OnsetDetector with the specified sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (e.g., 22050)
    pub fn new(sample_rate: u32) -> Self {
        Self::with_config(sample_rate, OnsetDetectionConfig::default())
    }

    /// Create a detector with explicit configuration parameters
    pub fn with_config(sample_rate: u32, config: OnsetDetectionConfig) -> Self {
        let stft = Stft::new(config.n_fft, config.hop_size);
        let mel = MelFilterbank::new(sample_rate.max(1), stft.n_fft(), config.n_mels);

        Self {
            sample_rate: sample_rate.max(1),
            config,
            stft,
            mel,
        }
    }

    /// Duration of one analysis hop in seconds
    pub fn hop_duration(&self) -> f64 {
        self.stft.hop_size() as f64 / self.sample_rate as f64
    }

    pub fn peak_params(&self) -> PeakPickParams {
        PeakPickParams::for_frame_rate(self.sample_rate, self.stft.hop_size(), self.config.delta)
    }

    /// Detect onsets and return their times in seconds
    ///
    /// The result is strictly increasing and may be empty (e.g. silence).
    pub fn detect(&self, audio: &[f32]) -> Vec<f64> {
        let envelope = self.onset_strength(audio);
        let peaks = pick_peaks(&envelope, &self.peak_params());
        let hop = self.hop_duration();
        let candidates: Vec<f64> = peaks.iter().map(|&frame| frame as f64 * hop).collect();
        let onsets = prune_close_onsets(&candidates, self.config.min_onset_gap);

        tracing::debug!(
            "[OnsetDetector] {} frames, {} candidates, {} onsets after pruning",
            envelope.len(),
            candidates.len(),
            onsets.len()
        );

        onsets
    }

    /// Compute the onset strength envelope (one value per STFT frame)
    pub fn onset_strength(&self, audio: &[f32]) -> Vec<f32> {
        let mut mel_frames: Vec<Vec<f32>> = self
            .stft
            .power_frames(audio)
            .iter()
            .map(|power| self.mel.apply(power))
            .collect();
        power_to_db(&mut mel_frames, self.config.top_db);

        let frames = mel_frames.len();
        let lag = self.config.lag.max(1);
        let pad = lag + self.stft.n_fft() / (2 * self.stft.hop_size());

        let mut envelope = vec![0.0f32; pad.min(frames)];
        envelope.extend(
            (lag..frames)
                .map(|t| spectral_flux(&mel_frames[t], &mel_frames[t - lag]))
                .take(frames.saturating_sub(pad)),
        );
        envelope
    }
}

/// Mean positive difference between two spectra
///
/// SF(t) = mean_b max(0, S_t[b] - S_(t-1)[b])
fn spectral_flux(current: &[f32], previous: &[f32]) -> f32 {
    if current.is_empty() {
        return 0.0;
    }
    let total: f32 = current
        .iter()
        .zip(previous.iter())
        .map(|(curr, prev)| (curr - prev).max(0.0))
        .sum();
    total / current.len() as f32
}

/// Pick onset frames from a raw onset strength envelope
///
/// The envelope is normalized to [0, 1] first; an envelope without any
/// positive value yields no peaks.
pub fn pick_peaks(envelope: &[f32], params: &PeakPickParams) -> Vec<usize> {
    if envelope.iter().all(|&v| v == 0.0) {
        return Vec::new();
    }

    let min = envelope.iter().copied().fold(f32::INFINITY, f32::min);
    let shifted: Vec<f32> = envelope.iter().map(|&v| v - min).collect();
    let max = shifted.iter().copied().fold(0.0f32, f32::max);
    let x: Vec<f32> = shifted.iter().map(|&v| v / (max + f32::MIN_POSITIVE)).collect();

    let len = x.len();
    let mut peaks = Vec::new();
    let mut last_peak: Option<usize> = None;

    for n in 0..len {
        let value = x[n];
        if value == 0.0 {
            continue;
        }

        let max_window = &x[n.saturating_sub(params.pre_max)..(n + params.post_max).min(len)];
        let local_max = max_window.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if value != local_max {
            continue;
        }

        let avg_window = &x[n.saturating_sub(params.pre_avg)..(n + params.post_avg).min(len)];
        let local_mean = avg_window.iter().sum::<f32>() / avg_window.len() as f32;
        if value < local_mean + params.delta {
            continue;
        }

        if last_peak.is_some_and(|last| n <= last + params.wait) {
            continue;
        }

        peaks.push(n);
        last_peak = Some(n);
    }

    peaks
}

/// Remove candidates that follow the previous raw candidate by `min_gap` or less
///
/// Each candidate is compared with the candidate immediately before it in the
/// input, whether or not that one was kept. The first candidate has no
/// predecessor and is always kept.
pub fn prune_close_onsets(candidates: &[f64], min_gap: f64) -> Vec<f64> {
    let mut previous: Option<f64> = None;
    candidates
        .iter()
        .copied()
        .filter(|&t| {
            let keep = previous.map_or(true, |prev| t - prev > min_gap);
            previous = Some(t);
            keep
        })
        .collect()
}

/// Detect onsets of a waveform with the default configuration
pub fn detect_onsets(waveform: &[f32], sample_rate: u32) -> Vec<f64> {
    OnsetDetector::new(sample_rate).detect(waveform)
}
