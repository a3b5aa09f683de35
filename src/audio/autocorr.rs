//! Autocorrelation tempo estimator.
//!
//! Works on a hop-rate amplitude envelope of the filtered signal: the
//! autocorrelation (Wiener-Khinchin, via FFT) is searched over a wide lag
//! range and the best lag becomes a raw BPM. The raw value is not range
//! limited; callers correct it with the octave fold.

use rustfft::{num_complex::Complex, FftPlanner};

use super::model::TempoEstimate;
use crate::error::{AnalysisError, Result};

const HOP_SIZE: usize = 256;
const SEARCH_MIN_BPM: f64 = 60.0;
const SEARCH_MAX_BPM: f64 = 240.0;
const PEAK_RATIO: f32 = 0.8;

/// Mean absolute amplitude per hop, with the overall mean removed.
pub fn envelope(samples: &[f32], hop: usize) -> Vec<f32> {
    let raw: Vec<f32> = samples
        .chunks(hop)
        .map(|chunk| chunk.iter().map(|s| s.abs()).sum::<f32>() / chunk.len() as f32)
        .collect();
    if raw.is_empty() {
        return raw;
    }
    let mean = raw.iter().sum::<f32>() / raw.len() as f32;
    raw.into_iter().map(|v| v - mean).collect()
}

/// Linear autocorrelation for lags `0..x.len()`, each lag normalized by the
/// number of overlapping terms.
pub fn autocorrelate(x: &[f32]) -> Vec<f32> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let fft_len = (n * 2).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_len);
    let ifft = planner.plan_fft_inverse(fft_len);

    let mut buffer: Vec<Complex<f32>> = x
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();

    fft.process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    ifft.process(&mut buffer);

    let scale = 1.0 / fft_len as f32;
    buffer
        .iter()
        .take(n)
        .enumerate()
        .map(|(lag, c)| c.re * scale / (n - lag) as f32)
        .collect()
}

/// Fractional position of the maximum around `idx`, from a parabola through
/// its neighbors.
fn refine_lag(acf: &[f32], idx: usize) -> f64 {
    if idx == 0 || idx + 1 >= acf.len() {
        return idx as f64;
    }
    let (y0, y1, y2) = (acf[idx - 1] as f64, acf[idx] as f64, acf[idx + 1] as f64);
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < 1e-12 {
        return idx as f64;
    }
    idx as f64 + (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5)
}

/// Envelope frame at which a comb of period `frames_per_beat` collects the
/// most energy.
fn best_phase(env: &[f32], frames_per_beat: f64) -> usize {
    let mut best = (0usize, f32::NEG_INFINITY);
    for phase in 0..(frames_per_beat.floor() as usize).max(1) {
        let mut sum = 0.0f32;
        let mut pos = phase as f64;
        while (pos as usize) < env.len() {
            sum += env[pos as usize];
            pos += frames_per_beat;
        }
        if sum > best.1 {
            best = (phase, sum);
        }
    }
    best.0
}

/// Estimates a raw tempo and a reference beat time from filtered samples.
///
/// A signal that never reaches `floor` is `NoPeaksDetected`; one too short or
/// too flat to show a periodicity is `NoTempoCandidate`.
pub fn estimate(samples: &[f32], sample_rate: u32, floor: f32) -> Result<TempoEstimate> {
    let loudest = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if loudest < floor {
        return Err(AnalysisError::NoPeaksDetected { floor });
    }

    let env_rate = sample_rate as f64 / HOP_SIZE as f64;
    let env = envelope(samples, HOP_SIZE);
    let min_lag = ((env_rate * 60.0 / SEARCH_MAX_BPM).round() as usize).max(1);
    let max_lag = (env_rate * 60.0 / SEARCH_MIN_BPM).round() as usize;
    if max_lag + 1 >= env.len() {
        return Err(AnalysisError::NoTempoCandidate { peaks: 0 });
    }

    let acf = autocorrelate(&env);
    let strongest = acf[min_lag..=max_lag].iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if strongest <= 0.0 {
        return Err(AnalysisError::NoTempoCandidate { peaks: 0 });
    }
    // Multiples of the beat period score about as high as the period itself;
    // take the shortest lag that is a strong local maximum.
    let lag = (min_lag..=max_lag)
        .find(|&l| acf[l] >= PEAK_RATIO * strongest && acf[l] >= acf[l - 1] && acf[l] >= acf[l + 1])
        .ok_or(AnalysisError::NoTempoCandidate { peaks: 0 })?;
    let score = acf[lag];

    let frames_per_beat = refine_lag(&acf, lag);
    let bpm = 60.0 * env_rate / frames_per_beat;
    let phase = best_phase(&env, frames_per_beat);
    let offset_seconds = (phase * HOP_SIZE) as f64 / sample_rate as f64;

    log::debug!(
        "Autocorrelation: lag {:.2} frames (score {:.4}) -> {:.2} BPM, phase {:.3}s",
        frames_per_beat,
        score,
        bpm,
        offset_seconds
    );
    Ok(TempoEstimate { bpm, offset_seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autocorrelation_peaks_at_the_period() {
        let x: Vec<f32> = (0..400).map(|i| if i % 20 == 0 { 1.0 } else { 0.0 }).collect();
        let acf = autocorrelate(&x);
        assert_eq!(acf.len(), 400);
        assert!(acf[20] > acf[10]);
        assert!(acf[20] > acf[19] && acf[20] > acf[21]);
        assert!((acf[0] - 0.05).abs() < 1e-4);
    }

    #[test]
    fn envelope_is_zero_mean() {
        let env = envelope(&[1.0, 1.0, 0.0, 0.0, 1.0, 1.0], 2);
        assert_eq!(env.len(), 3);
        assert!(env.iter().sum::<f32>().abs() < 1e-6);
    }

    #[test]
    fn parabola_centers_symmetric_peak() {
        assert_eq!(refine_lag(&[0.0, 1.0, 2.0, 1.0, 0.0], 2), 2.0);
        let shifted = refine_lag(&[0.0, 1.0, 2.0, 2.0, 0.0], 2);
        assert!(shifted > 2.0 && shifted <= 2.5);
    }

    #[test]
    fn quiet_signal_has_no_peaks() {
        let silence = vec![0.01f32; 44100];
        assert_eq!(
            estimate(&silence, 44100, 0.3),
            Err(AnalysisError::NoPeaksDetected { floor: 0.3 })
        );
    }

    #[test]
    fn short_signal_has_no_candidate() {
        let blip = vec![1.0f32; 4410];
        assert!(matches!(
            estimate(&blip, 44100, 0.3),
            Err(AnalysisError::NoTempoCandidate { .. })
        ));
    }
}
