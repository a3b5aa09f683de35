use crate::error::{AnalysisError, Result};

/// Constant-tempo beat timestamps in seconds, strictly increasing.
///
/// The first point may sit slightly before zero when the reference beat does;
/// [`BeatGrid::clipped`] drops those for display.
#[derive(Clone, Debug, PartialEq)]
pub struct BeatGrid {
    beats: Vec<f64>,
    interval: f64,
}

/// Beat of the grid through `offset` that the forward walk starts from. Uses an
/// exact remainder, constant time for any finite offset.
fn first_beat(offset: f64, interval: f64) -> f64 {
    let mut phase = offset.rem_euclid(interval);
    if phase >= interval {
        phase = 0.0;
    }
    match (offset > 0.0, phase > 0.0) {
        (true, true) => phase,
        (true, false) => interval,
        (false, true) => phase - interval,
        (false, false) => 0.0,
    }
}

impl BeatGrid {
    /// Lays a grid at `bpm` through the beat at `offset`, from the first beat
    /// after zero up to (excluding) `duration`.
    ///
    /// A positive offset is moved back to the earliest beat still after zero,
    /// a non-positive one forward to the latest beat at or before zero. A
    /// non-positive duration yields an empty grid.
    pub fn synthesize(bpm: f64, duration: f64, offset: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AnalysisError::invalid(format!("grid tempo {bpm} must be positive")));
        }
        if !duration.is_finite() || !offset.is_finite() {
            return Err(AnalysisError::invalid(format!(
                "grid duration {duration} and offset {offset} must be finite"
            )));
        }
        let interval = 60.0 / bpm;
        if duration <= 0.0 {
            return Ok(Self {
                beats: Vec::new(),
                interval,
            });
        }

        let anchor = first_beat(offset, interval);

        let beats: Vec<f64> = (0u64..)
            .map(|k| anchor + k as f64 * interval)
            .take_while(|&t| t < duration)
            .collect();

        log::debug!(
            "Beat grid: {} beats at {:.4}s spacing from {:.4}s",
            beats.len(),
            interval,
            anchor
        );
        Ok(Self { beats, interval })
    }

    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    pub fn into_beats(self) -> Vec<f64> {
        self.beats
    }

    /// Seconds between consecutive beats.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Beats at or after time zero.
    pub fn clipped(&self) -> Vec<f64> {
        self.beats.iter().copied().filter(|&t| t >= 0.0).collect()
    }

    /// Clipped beats followed by `duration` itself, for sizing a timeline.
    pub fn with_end_marker(&self, duration: f64) -> Vec<f64> {
        let mut points = self.clipped();
        if points.last().map_or(true, |&last| last < duration) {
            points.push(duration);
        }
        points
    }
}
