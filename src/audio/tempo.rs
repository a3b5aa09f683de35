//! Tempo clustering and octave correction.
//!
//! Interval-derived tempos are frequently off by a factor of two or four from
//! the felt beat. Every tempo that leaves this module has been folded into a
//! single canonical octave by [`TempoRange::fold`], whether it came from the
//! interval histogram or from another estimator.

use std::collections::{BTreeMap, BTreeSet};

use super::model::{IntervalCount, TempoCandidate};
use crate::error::{AnalysisError, Result};

/// Finest tempo bucketing; finer keys would overflow `i64`.
pub const MAX_TEMPO_DECIMALS: u32 = 6;

/// Canonical tempo octave, inclusive at both ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRange {
    pub low: f64,
    pub high: f64,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            low: 80.0,
            high: 160.0,
        }
    }
}

impl TempoRange {
    /// The range must span at least one octave, otherwise some tempos would
    /// bounce between doubling and halving forever.
    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "tempo range {}-{} must be finite and positive",
                self.low, self.high
            )));
        }
        if self.high < 2.0 * self.low {
            return Err(AnalysisError::invalid(format!(
                "tempo range {}-{} spans less than an octave",
                self.low, self.high
            )));
        }
        Ok(())
    }

    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.low && bpm <= self.high
    }

    /// Doubles tempos below the range and halves tempos above it until they
    /// land inside.
    pub fn fold(&self, bpm: f64) -> Result<f64> {
        self.validate()?;
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AnalysisError::invalid(format!("cannot fold tempo {bpm}")));
        }
        let mut folded = bpm;
        while folded < self.low {
            folded *= 2.0;
        }
        while folded > self.high {
            folded /= 2.0;
        }
        Ok(folded)
    }
}

/// Brings a BPM reported by an alternative estimator into `range`.
pub fn correct_external_bpm(bpm: f64, range: &TempoRange) -> Result<f64> {
    let corrected = range.fold(bpm)?;
    if corrected != bpm {
        log::warn!(
            "Estimated tempo {:.2} BPM outside {}-{}, corrected to {:.2}",
            bpm,
            range.low,
            range.high,
            corrected
        );
    }
    Ok(corrected)
}

pub fn interval_to_bpm(interval: usize, sample_rate: u32) -> f64 {
    60.0 / (interval as f64 / sample_rate as f64)
}

/// Converts histogram intervals to folded tempos and merges those that agree
/// to `decimals` decimal places, summing their counts.
pub fn cluster_tempos(
    histogram: &[IntervalCount],
    sample_rate: u32,
    range: &TempoRange,
    decimals: u32,
) -> Result<Vec<TempoCandidate>> {
    if decimals > MAX_TEMPO_DECIMALS {
        return Err(AnalysisError::invalid(format!(
            "tempo decimals must be at most {MAX_TEMPO_DECIMALS}, got {decimals}"
        )));
    }
    let scale = 10f64.powi(decimals as i32);
    let mut buckets: BTreeMap<i64, TempoCandidate> = BTreeMap::new();

    for entry in histogram.iter().filter(|e| e.interval > 0) {
        let tempo = range.fold(interval_to_bpm(entry.interval, sample_rate))?;
        let key = (tempo * scale).round() as i64;
        let candidate = buckets.entry(key).or_insert_with(|| TempoCandidate {
            tempo: key as f64 / scale,
            count: 0,
            peaks: BTreeSet::new(),
        });
        candidate.count += entry.count;
        candidate.peaks.extend(entry.peaks.iter().copied());
    }

    Ok(buckets.into_values().collect())
}

/// Orders candidates by support, highest first; equal support goes to the
/// lower tempo.
pub fn rank_candidates(candidates: &mut [TempoCandidate]) {
    candidates.sort_by(|a, b| b.count.cmp(&a.count).then(a.tempo.total_cmp(&b.tempo)));
}

pub fn select_winner(mut candidates: Vec<TempoCandidate>) -> Option<TempoCandidate> {
    rank_candidates(&mut candidates);
    candidates.into_iter().next()
}

/// Playback rate that makes a track at `track_bpm` play at `target_bpm`.
pub fn playback_rate(track_bpm: f64, target_bpm: f64) -> Result<f64> {
    for bpm in [track_bpm, target_bpm] {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AnalysisError::invalid(format!("tempo {bpm} must be positive")));
        }
    }
    Ok(target_bpm / track_bpm)
}

/// One decimal place, the precision adjusted tempos are kept at.
pub fn round_bpm(bpm: f64) -> f64 {
    (bpm * 10.0).round() / 10.0
}
