use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

/// Peak picker parameters, all on the normalized sample scale.
#[derive(Clone, Copy, Debug)]
pub struct PeakSearch {
    pub initial_threshold: f32,
    pub min_threshold: f32,
    pub threshold_step: f32,
    pub min_peaks: usize,
    /// Samples skipped after each accepted peak
    pub refractory: usize,
}

impl PeakSearch {
    pub fn from_config(config: &AnalysisConfig, sample_rate: u32) -> Self {
        let refractory = (sample_rate as f64 * config.refractory_seconds).round() as usize;
        Self {
            initial_threshold: config.initial_threshold,
            min_threshold: config.min_threshold,
            threshold_step: config.threshold_step,
            min_peaks: config.min_peaks,
            refractory: refractory.max(1),
        }
    }

    /// Thresholds tried in order, from the initial value down to the floor.
    ///
    /// Computed from a step index rather than by repeated subtraction so the
    /// floor is reached exactly.
    fn thresholds(&self) -> impl Iterator<Item = f32> {
        let span = (self.initial_threshold - self.min_threshold) as f64;
        let steps = (span / self.threshold_step as f64 + 1e-6).floor() as usize;
        let (start, step) = (self.initial_threshold as f64, self.threshold_step as f64);
        (0..=steps).map(move |k| (start - k as f64 * step) as f32)
    }
}

/// Strictly increasing sample indices of detected transients, plus the
/// threshold they were found at.
#[derive(Clone, Debug, PartialEq)]
pub struct PeakSet {
    indices: Vec<usize>,
    threshold: f32,
}

impl PeakSet {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }
}

/// One pass over `data`: every sample above `threshold` is a peak, after which
/// `refractory` samples are skipped.
pub fn scan(data: &[f32], threshold: f32, refractory: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    let mut i = 0;
    while i < data.len() {
        if data[i] > threshold {
            peaks.push(i);
            i += refractory;
        } else {
            i += 1;
        }
    }
    peaks
}

/// Lowers the threshold until at least `min_peaks` peaks are found or the
/// floor is passed. Below the count the floor result is returned as a best
/// effort; an empty floor result is `NoPeaksDetected`.
pub fn pick_peaks(data: &[f32], search: &PeakSearch) -> Result<PeakSet> {
    let mut best = PeakSet {
        indices: Vec::new(),
        threshold: search.min_threshold,
    };
    for threshold in search.thresholds() {
        let indices = scan(data, threshold, search.refractory);
        log::debug!("Threshold {:.2}: {} peaks", threshold, indices.len());
        let enough = indices.len() >= search.min_peaks;
        best = PeakSet { indices, threshold };
        if enough {
            return Ok(best);
        }
    }

    if best.is_empty() {
        return Err(AnalysisError::NoPeaksDetected {
            floor: search.min_threshold,
        });
    }
    log::warn!(
        "Only {} peaks at floor threshold {:.2} (wanted {})",
        best.len(),
        best.threshold,
        search.min_peaks
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(min_peaks: usize, refractory: usize) -> PeakSearch {
        PeakSearch {
            initial_threshold: 0.9,
            min_threshold: 0.3,
            threshold_step: 0.05,
            min_peaks,
            refractory,
        }
    }

    #[test]
    fn thresholds_reach_the_floor_exactly() {
        let all: Vec<f32> = search(1, 1).thresholds().collect();
        assert_eq!(all.len(), 13);
        assert!((all[0] - 0.9).abs() < 1e-6);
        assert!((all[12] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn refractory_skips_the_tail_of_a_transient() {
        let mut data = vec![0.0f32; 100];
        for v in &mut data[10..20] {
            *v = 1.0;
        }
        data[50] = 1.0;
        assert_eq!(scan(&data, 0.5, 25), vec![10, 50]);
    }

    #[test]
    fn stops_at_first_threshold_meeting_the_count() {
        let mut data = vec![0.0f32; 400];
        data[0] = 0.95;
        data[100] = 0.68;
        data[200] = 0.68;
        data[300] = 0.2;
        let peaks = pick_peaks(&data, &search(3, 10)).unwrap();
        assert_eq!(peaks.indices(), &[0, 100, 200]);
        assert!((peaks.threshold() - 0.65).abs() < 1e-6);
    }

    #[test]
    fn falls_back_to_floor_result() {
        let mut data = vec![0.0f32; 400];
        data[40] = 0.4;
        data[240] = 0.35;
        let peaks = pick_peaks(&data, &search(30, 10)).unwrap();
        assert_eq!(peaks.indices(), &[40, 240]);
        assert!((peaks.threshold() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn silence_yields_no_peaks() {
        let data = vec![0.29f32; 1000];
        assert_eq!(
            pick_peaks(&data, &search(30, 10)),
            Err(AnalysisError::NoPeaksDetected { floor: 0.3 })
        );
    }

    #[test]
    fn refractory_is_derived_from_sample_rate() {
        let s = PeakSearch::from_config(&AnalysisConfig::default(), 44100);
        assert_eq!(s.refractory, 11025);
    }
}
