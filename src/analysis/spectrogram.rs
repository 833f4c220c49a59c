// Spectrogram module - STFT power spectra and mel filterbank
//
// Frames are centered: the signal is zero-padded by n_fft/2 on both sides so
// frame t is centered on sample t * hop. Each frame is weighted with a
// periodic Hann window before the FFT.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Short-time Fourier transform producing power spectra
pub struct Stft {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_size: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

impl Stft {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size in samples
    /// * `hop_size` - Advance between consecutive frames in samples
    pub fn new(n_fft: usize, hop_size: usize) -> Self {
        let n_fft = n_fft.max(2);
        let window = (0..n_fft)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / n_fft as f32).cos())
            })
            .collect();

        Self {
            fft: FftPlanner::new().plan_fft_forward(n_fft),
            n_fft,
            hop_size: hop_size.max(1),
            window,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of positive-frequency bins per frame
    pub fn bin_count(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of centered frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        let padded = len + 2 * (self.n_fft / 2);
        if padded < self.n_fft {
            return 0;
        }
        1 + (padded - self.n_fft) / self.hop_size
    }

    /// Compute the power spectrum |X[k]|^2 of every centered frame
    pub fn power_frames(&self, audio: &[f32]) -> Vec<Vec<f32>> {
        let pad = self.n_fft / 2;
        let frames = self.frame_count(audio.len());
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut result = Vec::with_capacity(frames);

        for frame in 0..frames {
            let start = frame * self.hop_size;
            for (i, slot) in buffer.iter_mut().enumerate() {
                // Index into the virtual zero-padded signal
                let sample = (start + i)
                    .checked_sub(pad)
                    .and_then(|idx| audio.get(idx))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut buffer);

            result.push(
                buffer[..self.bin_count()]
                    .iter()
                    .map(|c| c.norm_sqr())
                    .collect(),
            );
        }

        result
    }
}

/// Triangular mel filterbank on the Slaney mel scale with area normalization
pub struct MelFilterbank {
    /// Per band: first FFT bin and the non-zero weights starting at that bin
    bands: Vec<(usize, Vec<f32>)>,
}

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Convert Hz to mels (linear below 1 kHz, logarithmic above)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert mels back to Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

impl MelFilterbank {
    /// Build `n_mels` filters spanning 0 Hz to Nyquist for an `n_fft`-point FFT
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let n_mels = n_mels.max(1);
        let bins = n_fft / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let fft_freqs: Vec<f64> = (0..bins)
            .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
            .collect();

        let max_mel = hz_to_mel(nyquist);
        let mel_freqs: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f64 / (n_mels + 1) as f64))
            .collect();

        let bands = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (mel_freqs[m], mel_freqs[m + 1], mel_freqs[m + 2]);
                let norm = 2.0 / (upper - lower);
                let weights: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&f| {
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        rising.min(falling).max(0.0) * norm
                    })
                    .collect();

                match weights.iter().position(|&w| w > 0.0) {
                    Some(first) => {
                        let last = weights.iter().rposition(|&w| w > 0.0).unwrap_or(first);
                        let span = weights[first..=last].iter().map(|&w| w as f32).collect();
                        (first, span)
                    }
                    None => (0, Vec::new()),
                }
            })
            .collect();

        Self { bands }
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Fold a power spectrum into mel band energies
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.bands
            .iter()
            .map(|(start, weights)| {
                weights
                    .iter()
                    .zip(power.iter().skip(*start))
                    .map(|(w, p)| w * p)
                    .sum()
            })
            .collect()
    }
}

/// Convert power values to decibels in place
///
/// Values are floored at 1e-10 before the log, then clipped to `top_db`
/// below the global maximum.
pub fn power_to_db(frames: &mut [Vec<f32>], top_db: f32) {
    let mut max_db = f32::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = 10.0 * value.max(1e-10).log10();
        max_db = max_db.max(*value);
    }

    if top_db > 0.0 && max_db.is_finite() {
        let floor = max_db - top_db;
        for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
            *value = value.max(floor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_is_centered() {
        let stft = Stft::new(2048, 512);
        assert_eq!(stft.frame_count(22_050), 1 + 22_050 / 512);
        assert_eq!(stft.frame_count(0), 1);
    }

    #[test]
    fn test_sine_power_peaks_at_expected_bin() {
        let sample_rate = 8_000.0f32;
        let n_fft = 256;
        // 1 kHz lands exactly on bin 32
        let audio: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sample_rate).sin())
            .collect();
        let stft = Stft::new(n_fft, 64);
        let frames = stft.power_frames(&audio);
        let middle = &frames[frames.len() / 2];
        let peak = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn test_mel_scale_roundtrip_points() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
        assert!((mel_to_hz(15.0) - 1000.0).abs() < 1e-9);
        assert!((mel_to_hz(hz_to_mel(4321.0)) - 4321.0).abs() < 1e-6);
    }

    #[test]
    fn test_mel_filterbank_routes_energy_to_one_band() {
        let bank = MelFilterbank::new(22_050, 2048, 40);
        assert_eq!(bank.band_count(), 40);

        let mut power = vec![0.0f32; 1025];
        power[200] = 1.0;
        let bands = bank.apply(&power);
        let active = bands.iter().filter(|&&e| e > 0.0).count();
        assert!((1..=2).contains(&active), "energy spread over {} bands", active);
    }

    #[test]
    fn test_power_to_db_clips_to_dynamic_range() {
        let mut frames = vec![vec![1.0, 0.0], vec![1e-3, 1e-12]];
        power_to_db(&mut frames, 80.0);
        assert_eq!(frames[0][0], 0.0);
        assert_eq!(frames[0][1], -80.0);
        assert!((frames[1][0] + 30.0).abs() < 1e-4);
        assert_eq!(frames[1][1], -80.0);
    }
}
