use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::autocorr;
use super::buffer::SampleBuffer;
use super::filter::lowpass;
use super::grid::BeatGrid;
use super::intervals::interval_histogram;
use super::model::{AnalysisResult, TempoCandidate, TempoEstimate};
use super::peaks::{pick_peaks, PeakSearch};
use super::tempo::{cluster_tempos, correct_external_bpm, rank_candidates};
use crate::config::{AnalysisConfig, EstimatorKind};
use crate::error::{AnalysisError, Result};

/// Derives a BPM and a reference beat time from a low-passed buffer.
pub trait TempoEstimator: Send + Sync {
    fn name(&self) -> &'static str;

    fn estimate(&self, filtered: &SampleBuffer, config: &AnalysisConfig) -> Result<TempoEstimate>;
}

/// Peak picking, interval histogram, octave-folded clustering. The reference
/// beat is the earliest peak supporting the winning tempo.
pub struct IntervalEstimator;

impl IntervalEstimator {
    /// All folded candidates, best first.
    pub fn candidates(&self, filtered: &SampleBuffer, config: &AnalysisConfig) -> Result<Vec<TempoCandidate>> {
        let sample_rate = filtered.sample_rate();
        let data = filtered.channel(0).unwrap_or_default();

        let peaks = pick_peaks(data, &PeakSearch::from_config(config, sample_rate))?;
        log::info!("Found {} peaks at threshold {:.2}", peaks.len(), peaks.threshold());

        let histogram = interval_histogram(peaks.indices(), config.neighbor_count, config.interval_quantum);
        let mut candidates = cluster_tempos(
            &histogram,
            sample_rate,
            &config.tempo_range(),
            config.tempo_decimals,
        )?;
        if candidates.is_empty() {
            return Err(AnalysisError::NoTempoCandidate { peaks: peaks.len() });
        }
        rank_candidates(&mut candidates);
        Ok(candidates)
    }
}

impl TempoEstimator for IntervalEstimator {
    fn name(&self) -> &'static str {
        "intervals"
    }

    fn estimate(&self, filtered: &SampleBuffer, config: &AnalysisConfig) -> Result<TempoEstimate> {
        let candidates = self.candidates(filtered, config)?;
        for c in candidates.iter().take(3) {
            log::debug!("Candidate {:.1} BPM: count {}", c.tempo, c.count);
        }
        let winner = &candidates[0];
        let first_peak = winner
            .peaks
            .first()
            .copied()
            .ok_or(AnalysisError::NoTempoCandidate { peaks: 0 })?;
        Ok(TempoEstimate {
            bpm: winner.tempo,
            offset_seconds: first_peak as f64 / filtered.sample_rate() as f64,
        })
    }
}

/// Envelope autocorrelation; its raw BPM is folded into the configured range.
pub struct AutocorrEstimator;

impl TempoEstimator for AutocorrEstimator {
    fn name(&self) -> &'static str {
        "autocorrelation"
    }

    fn estimate(&self, filtered: &SampleBuffer, config: &AnalysisConfig) -> Result<TempoEstimate> {
        let data = filtered.channel(0).unwrap_or_default();
        let raw = autocorr::estimate(data, filtered.sample_rate(), config.min_threshold)?;
        Ok(TempoEstimate {
            bpm: correct_external_bpm(raw.bpm, &config.tempo_range())?,
            offset_seconds: raw.offset_seconds,
        })
    }
}

pub fn estimator_for(kind: EstimatorKind) -> Box<dyn TempoEstimator> {
    match kind {
        EstimatorKind::Intervals => Box::new(IntervalEstimator),
        EstimatorKind::Autocorrelation => Box::new(AutocorrEstimator),
    }
}

/// Runs the configured estimator over `buffer` and lays the beat grid.
pub fn analyze(buffer: &SampleBuffer, config: &AnalysisConfig) -> Result<AnalysisResult> {
    analyze_with(buffer, config, estimator_for(config.estimator).as_ref())
}

pub fn analyze_with(
    buffer: &SampleBuffer,
    config: &AnalysisConfig,
    estimator: &dyn TempoEstimator,
) -> Result<AnalysisResult> {
    config.validate()?;
    let duration = buffer.duration();

    log::info!("Stage 1: Low-pass at {}Hz...", config.lowpass_hz);
    let filtered = lowpass(buffer, config.lowpass_hz)?;

    log::info!("Stage 2: Tempo estimation ({})...", estimator.name());
    let estimate = estimator.estimate(&filtered, config)?;

    log::info!("Stage 3: Beat grid...");
    let grid = BeatGrid::synthesize(estimate.bpm, duration, estimate.offset_seconds)?;

    log::info!(
        "Tempo {:.2} BPM, first beat {:.3}s, {} beats over {:.1}s",
        estimate.bpm,
        estimate.offset_seconds,
        grid.len(),
        duration
    );

    Ok(AnalysisResult {
        bpm: estimate.bpm,
        offset_seconds: estimate.offset_seconds,
        beat_grid: grid.into_beats(),
        sample_rate: buffer.sample_rate(),
        duration,
    })
}

/// An analysis running on its own thread. Dropping the handle abandons it.
pub struct AnalysisHandle {
    rx: Receiver<Result<AnalysisResult>>,
}

impl AnalysisHandle {
    /// Blocks until the analysis finishes.
    pub fn wait(self) -> Result<AnalysisResult> {
        self.rx.recv().unwrap_or_else(|_| Err(worker_lost()))
    }

    /// The result if the analysis has finished, without blocking.
    pub fn try_result(&self) -> Option<Result<AnalysisResult>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }
}

fn worker_lost() -> AnalysisError {
    AnalysisError::AnalysisIncomplete("analysis worker exited without a result".into())
}

/// Moves `buffer` onto a worker thread and analyzes it there.
pub fn analyze_in_background(buffer: SampleBuffer, config: AnalysisConfig) -> AnalysisHandle {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // the receiver is gone when the caller abandoned the analysis
        let _ = tx.send(analyze(&buffer, &config));
    });
    AnalysisHandle { rx }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses(sample_rate: u32, period: usize, count: usize) -> SampleBuffer {
        let width = sample_rate as usize / 50;
        let mut samples = vec![0.0f32; period * count];
        for k in 0..count {
            for v in &mut samples[k * period..k * period + width] {
                *v = 1.0;
            }
        }
        SampleBuffer::mono(sample_rate, samples).unwrap()
    }

    #[test]
    fn interval_estimator_ranks_candidates() {
        let cfg = AnalysisConfig::default();
        let buf = pulses(22050, 11025, 40);
        let filtered = lowpass(&buf, cfg.lowpass_hz).unwrap();
        let candidates = IntervalEstimator.candidates(&filtered, &cfg).unwrap();
        assert_eq!(candidates[0].tempo, 120.0);
        assert!(candidates.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn single_peak_has_no_candidate() {
        let cfg = AnalysisConfig::default();
        let buf = pulses(22050, 22050, 1);
        assert_eq!(
            analyze(&buf, &cfg),
            Err(AnalysisError::NoTempoCandidate { peaks: 1 })
        );
    }

    #[test]
    fn invalid_config_fails_before_analysis() {
        let cfg = AnalysisConfig {
            min_threshold: 0.95,
            ..Default::default()
        };
        let buf = pulses(22050, 11025, 40);
        assert!(matches!(analyze(&buf, &cfg), Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn cutoff_above_nyquist_is_invalid() {
        let cfg = AnalysisConfig {
            lowpass_hz: 12000.0,
            ..Default::default()
        };
        let buf = pulses(22050, 11025, 4);
        assert!(matches!(analyze(&buf, &cfg), Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn background_analysis_matches_foreground() {
        let cfg = AnalysisConfig::default();
        let buf = pulses(22050, 11025, 40);
        let expected = analyze(&buf, &cfg).unwrap();
        let handle = analyze_in_background(buf, cfg);
        assert_eq!(handle.wait().unwrap(), expected);
    }

    #[test]
    fn polling_yields_the_foreground_result() {
        let cfg = AnalysisConfig::default();
        let buf = pulses(22050, 11025, 40);
        let expected = analyze(&buf, &cfg).unwrap();
        let handle = analyze_in_background(buf, cfg);
        let result = loop {
            if let Some(result) = handle.try_result() {
                break result;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(result.unwrap(), expected);
    }

    #[test]
    fn abandoned_analysis_is_harmless() {
        let buf = pulses(22050, 11025, 40);
        drop(analyze_in_background(buf, AnalysisConfig::default()));
    }
}
