use serde::Serialize;
use std::collections::BTreeSet;

/// How often one peak-to-peak distance occurred.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntervalCount {
    /// Distance in samples
    pub interval: usize,
    pub count: usize,
    /// Peaks the distance was measured from
    pub peaks: BTreeSet<usize>,
}

/// A folded tempo and the histogram support behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TempoCandidate {
    pub tempo: f64,
    pub count: usize,
    pub peaks: BTreeSet<usize>,
}

/// Output of a tempo estimator: a BPM and the time of a reference beat.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TempoEstimate {
    pub bpm: f64,
    pub offset_seconds: f64,
}

/// The externally consumed result of one analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub bpm: f64,
    pub offset_seconds: f64,
    pub beat_grid: Vec<f64>,
    pub sample_rate: u32,
    pub duration: f64,
}
