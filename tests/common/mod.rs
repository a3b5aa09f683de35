#![allow(dead_code)]

use beatgrid::SampleBuffer;

pub const SR: u32 = 44100;

/// Sample positions of clicks at `bpm`, starting at `start_s`.
pub fn click_positions(bpm: f64, sr: u32, seconds: f64, start_s: f64) -> Vec<usize> {
    let period = 60.0 / bpm * sr as f64;
    let n = (seconds * sr as f64) as usize;
    (0u64..)
        .map(|k| (start_s * sr as f64 + k as f64 * period).round() as usize)
        .take_while(|&p| p < n)
        .collect()
}

/// Kick-like click track: 20ms rectangular pulses at full scale, so the
/// transients survive a bass low-pass. A one-sample click at 1.0 comes out of
/// the 150Hz one-pole filter at about 0.02, below the 0.3 floor, and is
/// reported as `NoPeaksDetected` (see `single_sample_clicks_are_filtered_out`).
pub fn gen_click_track(bpm: f64, sr: u32, seconds: f64, start_s: f64) -> Vec<f32> {
    let n = (seconds * sr as f64) as usize;
    let width = sr as usize / 50;
    let mut out = vec![0.0f32; n];
    for p in click_positions(bpm, sr, seconds, start_s) {
        for v in out.iter_mut().skip(p).take(width) {
            *v = 1.0;
        }
    }
    out
}

/// Deterministic pseudo-random noise in [-amp, amp].
pub fn gen_noise(n: usize, amp: f32, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            (unit * 2.0 - 1.0) * amp
        })
        .collect()
}

pub fn mono(samples: Vec<f32>) -> SampleBuffer {
    SampleBuffer::mono(SR, samples).expect("valid buffer")
}

pub fn assert_bpm(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance} BPM, got {actual}"
    );
}
