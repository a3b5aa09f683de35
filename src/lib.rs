//! Tempo and beat-grid analysis for decoded audio.
//!
//! A buffer is low-pass filtered, its transients are picked with an adaptive
//! threshold, and the distances between nearby transients vote for a tempo
//! folded into one canonical octave. The winning tempo and its earliest
//! supporting transient anchor a constant-tempo beat grid.
//!
//! ```no_run
//! use beatgrid::{analyze, AnalysisConfig, SampleBuffer};
//!
//! let samples = vec![0.0f32; 44100 * 30];
//! let buffer = SampleBuffer::mono(44100, samples)?;
//! let result = analyze(&buffer, &AnalysisConfig::default())?;
//! println!("{:.1} BPM, first beat at {:.3}s", result.bpm, result.offset_seconds);
//! # Ok::<(), beatgrid::AnalysisError>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;

use std::path::Path;

pub use audio::analysis::{
    analyze, analyze_in_background, analyze_with, estimator_for, AnalysisHandle, AutocorrEstimator,
    IntervalEstimator, TempoEstimator,
};
pub use audio::buffer::SampleBuffer;
pub use audio::grid::BeatGrid;
pub use audio::model::{AnalysisResult, IntervalCount, TempoCandidate, TempoEstimate};
pub use audio::peaks::PeakSet;
pub use audio::tempo::{correct_external_bpm, playback_rate, round_bpm, TempoRange};
pub use config::{AnalysisConfig, EstimatorKind};
pub use error::AnalysisError;

/// Decodes `path` and analyzes it.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    config.validate()?;
    let buffer = audio::decode::decode_file(path)?;
    analyze(&buffer, config)
}
